use std::env;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigPaths, GeneralConfig};
use crate::{AppError, Result};

/// Environment variable selecting `json` or `pretty` output
pub const LOG_FORMAT_ENV: &str = "XMMS2_MPRIS_LOG_FORMAT";

const DAYS_TO_KEEP: usize = 7;

/// Initialize tracing for the bridge
///
/// Uses `RUST_LOG` if set, otherwise the configured level. Output goes to
/// stderr, pretty or JSON depending on `XMMS2_MPRIS_LOG_FORMAT`. When
/// `log_to_file` is set, a daily rolling file under the state directory
/// receives the same events.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the life of the process.
///
/// # Errors
/// Returns error if the log directory cannot be created or a subscriber is
/// already installed
pub fn init(general: &GeneralConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(general.log_level.to_string()));
    let json = env::var(LOG_FORMAT_ENV).is_ok_and(|format| format == "json");

    let (file_writer, guard) = if general.log_to_file {
        let log_dir = ConfigPaths::log_dir()?;
        let file_appender = tracing_appender::rolling::Builder::new()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .max_log_files(DAYS_TO_KEEP)
            .filename_prefix("xmms2-mpris")
            .filename_suffix("log")
            .build(&log_dir)
            .map_err(|e| AppError::Logging(e.to_string()))?;
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .with(file_writer.map(|writer| {
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(writer)
                    .with_ansi(false)
            }))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_names(true)
                    .with_writer(std::io::stderr),
            )
            .with(file_writer.map(|writer| {
                fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(writer)
                    .with_ansi(false)
            }))
            .try_init()
    };

    result.map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(guard)
}
