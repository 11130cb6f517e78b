//! Tracing subscriber setup.

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "FEEDCACHE_LOG";

const LOG_FILE_PREFIX: &str = "feedcache.log";

/// Install the global subscriber.
///
/// Logs go to stderr, or to a daily-rolling file when `config.directory` is
/// set. Keep the returned guard alive until exit so buffered file output is
/// flushed.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
  let filter = build_filter(std::env::var(LOG_ENV).ok().as_deref(), &config.level)?;
  let registry = tracing_subscriber::registry().with(filter);

  match &config.directory {
    Some(dir) => {
      std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

      let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
      let (writer, guard) = tracing_appender::non_blocking(appender);

      registry
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

      Ok(Some(guard))
    }
    None => {
      registry
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

      Ok(None)
    }
  }
}

/// The environment directive wins over the configured level.
fn build_filter(env: Option<&str>, level: &str) -> Result<EnvFilter> {
  let directive = env.filter(|s| !s.trim().is_empty()).unwrap_or(level);
  EnvFilter::try_new(directive).map_err(|e| eyre!("Invalid log filter {:?}: {}", directive, e))
}
