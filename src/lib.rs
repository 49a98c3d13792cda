pub mod cli;
pub mod config;
pub mod content;
pub mod format;
pub mod gemini;
pub mod logging;
pub mod moon;
pub mod prompt;
pub mod zodiac;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

pub use content::{ContentOrchestrator, ContentSink, LoadOutcome, RenderState, RenderTarget};
pub use gemini::{GeminiClient, GenerationError, TextGenerator};
pub use prompt::ContentCategory;

pub fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    let _log_guard = logging::setup_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "astrocast started");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    let result = runtime.block_on(cli::execute(cli));
    if let Err(err) = &result {
        error!(error = %err, "Command failed");
    }
    result
}
