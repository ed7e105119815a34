use serde::{Deserialize, Serialize};

use crate::services::bridge::AppIdentity;
use crate::{AppError, Result};

/// How the player presents itself on the session bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MprisConfig {
    /// Appended to `org.mpris.MediaPlayer2.` to form the bus name.
    pub bus_suffix: String,

    /// Human-readable player name.
    pub identity: String,

    /// Advertise that `Quit` stops the daemon.
    pub can_quit: bool,

    /// URI schemes the daemon can play.
    pub supported_uri_schemes: Vec<String>,

    /// MIME types the daemon can play.
    pub supported_mime_types: Vec<String>,
}

impl Default for MprisConfig {
    fn default() -> Self {
        let identity = AppIdentity::default();

        Self {
            bus_suffix: "xmms2".to_string(),
            identity: identity.identity,
            can_quit: identity.can_quit,
            supported_uri_schemes: identity.supported_uri_schemes,
            supported_mime_types: identity.supported_mime_types,
        }
    }
}

impl MprisConfig {
    /// Static application properties built from this section
    pub fn app_identity(&self) -> AppIdentity {
        AppIdentity {
            identity: self.identity.clone(),
            can_quit: self.can_quit,
            supported_uri_schemes: self.supported_uri_schemes.clone(),
            supported_mime_types: self.supported_mime_types.clone(),
            ..AppIdentity::default()
        }
    }

    pub(super) fn validate(&self) -> Result<()> {
        let valid = self.bus_suffix.split('.').all(|element| {
            element
                .chars()
                .next()
                .is_some_and(|first| !first.is_ascii_digit())
                && element
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });

        if !valid {
            return Err(AppError::Config {
                field: "mpris.bus_suffix",
                reason: format!("{:?} is not a valid bus name suffix", self.bus_suffix),
            });
        }

        Ok(())
    }
}
