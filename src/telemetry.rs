use std::path::Path;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling::daily};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "NEWSDESK_LOG";
const LOG_FILE: &str = "newsdesk.log";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Logs go to a daily rolling file because the terminal belongs to the UI.
/// Keep the guard alive until exit so buffered lines get flushed.
pub fn setup_file_tracing(log_dir: &Path) -> WorkerGuard {
    let (appender, guard) = non_blocking(daily(log_dir, LOG_FILE));
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().with_ansi(false).with_writer(appender))
        .init();
    guard
}

/// For the non-interactive subcommands: warnings and above on stderr.
pub fn setup_stderr_tracing() {
    tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
