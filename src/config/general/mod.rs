mod log_level;

pub use log_level::LogLevel;
use serde::{Deserialize, Serialize};

/// Process-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GeneralConfig {
    /// Logging level, overridden by `RUST_LOG`.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Also write logs to a daily rolling file.
    #[serde(default)]
    pub log_to_file: bool,
}
