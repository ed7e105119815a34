use std::{
    env,
    io::{Error, ErrorKind},
    path::PathBuf,
};

const APP_DIR: &str = "xmms2-mpris";

/// Utility struct for locating configuration and log files
///
/// Follows the XDG Base Directory specification
pub struct ConfigPaths;

impl ConfigPaths {
    /// Returns the configuration directory path for the bridge
    ///
    /// - First checks `XDG_CONFIG_HOME`
    /// - Falls back to `$HOME/.config`
    /// - Appends "xmms2-mpris" to the base config directory
    ///
    /// # Errors
    /// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` environment variables are set
    pub fn config_dir() -> Result<PathBuf, Error> {
        Ok(xdg_dir("XDG_CONFIG_HOME", ".config")?.join(APP_DIR))
    }

    /// Returns the path to the main configuration file
    ///
    /// # Errors
    /// Returns an error if the configuration directory cannot be determined
    pub fn main_config() -> Result<PathBuf, Error> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log directory under `XDG_STATE_HOME`
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    /// Returns error if the directory cannot be determined or created
    pub fn log_dir() -> Result<PathBuf, Error> {
        let log_dir = xdg_dir("XDG_STATE_HOME", ".local/state")?
            .join(APP_DIR)
            .join("logs");

        if !log_dir.exists() {
            std::fs::create_dir_all(&log_dir)?;
        }

        Ok(log_dir)
    }
}

fn xdg_dir(variable: &str, home_fallback: &str) -> Result<PathBuf, Error> {
    env::var(variable)
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(home_fallback))
        })
        .ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("Neither {variable} nor HOME environment variable found"),
            )
        })
}
