use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log to a daily-rolling file under `log_dir`; the terminal belongs to the UI.
///
/// `RUST_LOG` wins over the verbosity flag. Keep the returned guard alive for the
/// lifetime of the program so buffered lines are flushed on exit.
pub fn init_logging(log_dir: &Path, verbose: u8) -> Result<WorkerGuard> {
  std::fs::create_dir_all(log_dir).with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

  let default_filter = match verbose {
    0 => "popcorn=info",
    1 => "popcorn=debug",
    _ => "popcorn=trace,reqwest=debug",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

  let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "popcorn.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_ansi(false).with_target(false).with_writer(writer))
    .try_init()
    .context("Failed to install tracing subscriber")?;

  Ok(guard)
}
