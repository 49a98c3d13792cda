//! Command-line front end: maps user labels onto categories and prints
//! whatever the orchestrator renders.

use crate::config::{self, Config, Placement, SettingsStore};
use crate::content::{ContentOrchestrator, ContentSink, LoadOutcome, RenderState, RenderTarget};
use crate::gemini::{GeminiClient, GenerationError, TextGenerator};
use crate::prompt::ContentCategory;
use crate::zodiac::ZodiacSign;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Daily horoscope, astro events and moon readings generated with Gemini.
#[derive(Parser, Debug)]
#[command(name = "astrocast", author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (defaults to ~/.astrocast/config.json)
    #[arg(long, global = true, env = "ASTROCAST_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the content of a tab
    Show {
        /// One of: horoscope, astro-events, moon
        #[arg(value_parser = parse_tab)]
        tab: ContentCategory,
    },
    /// Generate a feature card by its title, e.g. "Love Forecast"
    Card { title: String },
    /// Show today's moon phase, moon sign and calendar without calling the API
    Moon {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the models that support content generation
    Models,
    /// Inspect or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print current settings
    Show,
    /// Store the Gemini API key
    SetKey { key: String },
    /// Select a sign; use "none" to clear it
    SetSign {
        #[arg(value_enum)]
        placement: PlacementArg,
        /// Sign name, or "none"
        sign: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlacementArg {
    Sun,
    Moon,
    Rising,
}

impl From<PlacementArg> for Placement {
    fn from(arg: PlacementArg) -> Self {
        match arg {
            PlacementArg::Sun => Placement::Sun,
            PlacementArg::Moon => Placement::Moon,
            PlacementArg::Rising => Placement::Rising,
        }
    }
}

fn parse_tab(value: &str) -> Result<ContentCategory, String> {
    let category: ContentCategory = value.parse().map_err(|e| format!("{e}"))?;
    if !ContentCategory::TABS.contains(&category) {
        return Err(format!("{value} is not a tab; use the card command for feature cards"));
    }
    Ok(category)
}

fn parse_sign(value: &str) -> Result<Option<ZodiacSign>, String> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|e| format!("{e}"))
}

/// Prints render states as they arrive. Loading goes to stderr.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl ContentSink for TerminalSink {
    fn render(&self, target: RenderTarget, state: RenderState) {
        debug!(?target, "Rendering to terminal");
        match state {
            RenderState::Loading => eprintln!("✨ Consulting the stars..."),
            RenderState::Notice(text) | RenderState::Rendered(text) | RenderState::Error(text) => {
                println!("{text}");
            }
            RenderState::Event { title, body } => {
                println!("Event of the day: {title}");
                println!("{body}");
            }
        }
    }
}

fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{tail}")
}

fn describe_sign(value: Option<ZodiacSign>) -> String {
    match value {
        Some(sign) => format!("{} {}", sign.symbol(), sign.name()),
        None => "(not selected)".to_string(),
    }
}

fn print_config(path: &Path, config: &Config) {
    println!("Settings file: {}", path.display());
    println!("API key:       {}", mask_key(&config.api_key));
    println!("Sun sign:      {}", describe_sign(config.sun_sign()));
    println!("Moon sign:     {}", describe_sign(config.moon_sign()));
    println!("Rising sign:   {}", describe_sign(config.rising_sign()));
    println!("Model:         {}/{}/{}", config.api_base, config.api_version, config.model);
}

pub async fn execute(cli: Cli) -> Result<()> {
    let path = match cli.config {
        Some(path) => path,
        None => config::config_path()?,
    };
    let store = SettingsStore::open(&path)
        .with_context(|| format!("load settings from {}", path.display()))?;
    let client = GeminiClient::from_config(store.config());
    let orchestrator = ContentOrchestrator::new(store, client, TerminalSink);

    match cli.command {
        Command::Show { tab } => {
            if orchestrator.switch_to(tab).await.is_none() {
                println!("{}", GenerationError::MissingApiKey);
                println!("Run `astrocast config set-key <KEY>` first.");
            }
        }
        Command::Card { title } => {
            let category = ContentCategory::from_card_title(&title).ok_or_else(|| {
                let titles: Vec<_> = ContentCategory::FEATURE_CARDS
                    .iter()
                    .filter_map(|c| c.card_title())
                    .collect();
                anyhow!("Unknown card \"{}\". Available: {}", title, titles.join(", "))
            })?;
            report(orchestrator.load(category).await);
        }
        Command::Moon { json } => {
            let overview = orchestrator.moon_overview();
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                println!("{}", overview.date_label);
                println!("{} {}", overview.phase.icon, overview.phase.phase);
                println!(
                    "{} — {}",
                    overview.window.0.format("%b %-d"),
                    overview.window.1.format("%b %-d")
                );
                println!("{} Moon in {}", overview.sign.symbol(), overview.sign.name());
                let strip: Vec<String> = overview
                    .calendar
                    .iter()
                    .map(|day| format!("{} {}", day.icon, day.date.format("%b %-d")))
                    .collect();
                println!("{}", strip.join("   "));
            }
        }
        Command::Models => {
            let config = orchestrator.config();
            if !config.has_api_key() {
                bail!("{}", GenerationError::MissingApiKey);
            }
            let models = GeminiClient::from_config(&config)
                .list_models(&config.api_key)
                .await?;
            for model in models {
                println!("{}\t{}", model.name, model.display_name);
            }
        }
        Command::Config(ConfigCommand::Show) => {
            print_config(&path, &orchestrator.config());
        }
        Command::Config(ConfigCommand::SetKey { key }) => {
            let models = orchestrator.save_api_key(&key).await?;
            println!("API key saved.");
            if !models.is_empty() {
                println!("{} models support content generation.", models.len());
            }
        }
        Command::Config(ConfigCommand::SetSign { placement, sign }) => {
            let sign = parse_sign(&sign).map_err(|e| anyhow!(e))?;
            let outcome = orchestrator.select_sign(placement.into(), sign).await?;
            println!("{:?} sign set to {}.", placement, describe_sign(sign));
            if let Some(outcome) = outcome {
                report(outcome);
            }
        }
    }
    Ok(())
}

fn report(outcome: LoadOutcome) {
    if outcome == LoadOutcome::Superseded {
        debug!("Load superseded by a newer request");
    }
}
