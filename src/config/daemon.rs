use std::env;

use serde::{Deserialize, Serialize};

use crate::services::xmms2::protocol::{DEFAULT_IPC_PATH, IPC_PATH_ENV};
use crate::{AppError, Result};

/// Where and how to reach the XMMS2 daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    /// IPC URL; `$XMMS_PATH` or the per-user socket when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipc_path: Option<String>,

    /// Name announced to the daemon.
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            ipc_path: None,
            client_name: default_client_name(),
        }
    }
}

fn default_client_name() -> String {
    "MPRIS2_bridge".to_string()
}

impl DaemonConfig {
    /// IPC URL to connect to, after environment fallbacks
    pub fn resolved_ipc_path(&self) -> String {
        let user = env::var("USER").or_else(|_| env::var("LOGNAME")).ok();
        resolve_ipc_path(self.ipc_path.as_deref(), env::var(IPC_PATH_ENV).ok(), user)
    }

    pub(super) fn validate(&self) -> Result<()> {
        let valid = !self.client_name.is_empty()
            && self
                .client_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid {
            return Err(AppError::Config {
                field: "daemon.client_name",
                reason: format!(
                    "{:?} must be non-empty and contain only letters, digits and underscores",
                    self.client_name
                ),
            });
        }

        Ok(())
    }
}

/// Configured path wins, then the environment, then the per-user socket
pub(super) fn resolve_ipc_path(
    configured: Option<&str>,
    from_env: Option<String>,
    user: Option<String>,
) -> String {
    if let Some(path) = configured.filter(|path| !path.is_empty()) {
        return path.to_string();
    }

    if let Some(path) = from_env.filter(|path| !path.is_empty()) {
        return path;
    }

    DEFAULT_IPC_PATH.replace("{user}", user.as_deref().unwrap_or("unknown"))
}
