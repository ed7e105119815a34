//! Configuration schema and loading.
//!
//! Every field has a default, so a missing file or a file with only some
//! sections is valid.

mod daemon;
mod general;
mod mpris;
mod paths;

#[cfg(test)]
mod tests;

pub use daemon::DaemonConfig;
pub use general::{GeneralConfig, LogLevel};
pub use mpris::MprisConfig;
pub use paths::ConfigPaths;

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Main configuration structure.
///
/// Loaded from `config.toml` in [`ConfigPaths::config_dir`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Logging settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// XMMS2 connection settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Session bus presentation.
    #[serde(default)]
    pub mpris: MprisConfig,
}

impl Config {
    /// Load the configuration from its default location
    ///
    /// # Errors
    /// Returns error if the location cannot be determined, or the file exists
    /// but cannot be read, parsed or validated
    pub fn load() -> Result<Self> {
        let path = ConfigPaths::main_config()?;
        Self::load_from(&path)
    }

    /// Load the configuration from `path`, using defaults if it does not exist
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content, Some(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AppError::io(&e, path)),
        }
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns `AppError::TomlParse` for malformed TOML and `AppError::Config`
    /// for values that parse but are not usable
    pub fn parse(content: &str, path: Option<&Path>) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| AppError::toml_parse(e, path))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.daemon.validate()?;
        self.mpris.validate()
    }
}
