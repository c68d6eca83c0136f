//! Tracing setup for the binary.
//!
//! Stdout carries player events for the host, so logs go to stderr, or to a
//! daily rolling file when `logging.directory` is set.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

const LOG_FILE_PREFIX: &str = "duet";

/// Install the global subscriber. `RUST_LOG` overrides the configured filter.
///
/// Hold on to the returned guard for the lifetime of the program; dropping it
/// flushes and stops the file writer.
pub fn init_logging(
    settings: &LoggingSettings,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    match &settings.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
                .try_init()?;
            tracing::info!(directory = %dir.display(), "logging to file");
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .try_init()?;
            Ok(None)
        }
    }
}
