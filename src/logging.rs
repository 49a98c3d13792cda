use crate::config;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

const LOG_RETENTION_DAYS: u64 = 14;
const LOG_FILE_PREFIX: &str = "astrocast.log";
const DEFAULT_LOG_FILTER: &str = "info,reqwest=warn,hyper=warn";

fn build_log_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_env("ASTROCAST_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn cleanup_old_logs(log_dir: &Path, retention: Duration) {
    let cutoff = match SystemTime::now().checked_sub(retention) {
        Some(time) => time,
        None => return,
    };

    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let file_name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if !file_name.starts_with(LOG_FILE_PREFIX) {
            continue;
        }
        let modified = match entry.metadata().and_then(|meta| meta.modified()) {
            Ok(time) => time,
            Err(_) => continue,
        };
        if modified < cutoff {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Routes tracing output to a daily log file, or stderr if the log directory
/// is unavailable. Keep the returned guard alive until exit.
pub fn setup_logging() -> Option<WorkerGuard> {
    let log_dir = match config::logs_dir() {
        Ok(dir) if std::fs::create_dir_all(&dir).is_ok() => dir,
        _ => {
            let _ = tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_env_filter(build_log_filter())
                .try_init();
            return None;
        }
    };

    cleanup_old_logs(
        &log_dir,
        Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60),
    );

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let installed = tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(build_log_filter())
        .try_init();
    if installed.is_err() {
        return None;
    }

    info!(
        log_dir = %log_dir.display(),
        retention_days = LOG_RETENTION_DAYS,
        "Logging initialized"
    );
    Some(guard)
}
