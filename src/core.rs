use std::{
    fmt, io,
    path::{Path, PathBuf},
    result,
};

use thiserror::Error;

use crate::services::bridge::BridgeError;
use crate::services::xmms2::Xmms2Error;

/// Errors that stop the bridge from starting or keep it from running.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration value rejected
    #[error("invalid config field '{field}': {reason}")]
    Config {
        /// Offending field, as `section.key`
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// I/O failure on a known path
    #[error("I/O error on '{path}': {details}")]
    IoError {
        /// Path the operation touched
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// I/O failure without path context
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParse {
        /// File path, or "string" for in-memory input
        location: String,
        /// Parse error details
        details: String,
    },

    /// Could not talk to the XMMS2 daemon
    #[error(transparent)]
    Daemon(#[from] Xmms2Error),

    /// Could not export the player on the session bus
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    /// The bridge stopped with an error
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Logging could not be set up
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

/// A specialized `Result` type for bridge startup and shutdown.
pub type Result<T> = result::Result<T, AppError>;

impl AppError {
    /// TOML parsing error, located at `path` when parsing a file
    pub fn toml_parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => p
                .canonicalize()
                .unwrap_or_else(|_| p.to_path_buf())
                .display()
                .to_string(),
            None => "string".to_string(),
        };

        Self::TomlParse {
            location,
            details: error.to_string(),
        }
    }

    /// I/O error on `path`
    pub fn io(error: &io::Error, path: &Path) -> Self {
        Self::IoError {
            path: path.to_path_buf(),
            details: error.to_string(),
        }
    }
}
