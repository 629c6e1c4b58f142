//! Configuration management for strided.
//!
//! Loads settings from /etc/stride/config.toml or uses defaults. When the
//! daemon runs unprivileged (development), state falls back to the user's
//! data directory.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use stride_core::{SOCKET_PATH, STATE_DIR};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/stride/config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Unix socket the daemon listens on
    #[serde(default = "default_socket_path")]
    pub socket_path: String,

    /// Directory holding the progression database
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// Store backend: "sqlite" or "memory" (memory is for development)
    #[serde(default = "default_store_backend")]
    pub store_backend: String,

    /// Bound on optimistic-update retries per completion event
    #[serde(default = "default_max_update_retries")]
    pub max_update_retries: u32,

    /// Deadline for one apply_completion call, in milliseconds
    #[serde(default = "default_apply_timeout_ms")]
    pub apply_timeout_ms: u64,

    /// How stale a served ranking snapshot may be, in seconds
    /// (0 = always read fresh)
    #[serde(default)]
    pub ranking_max_age_secs: u64,
}

fn default_socket_path() -> String {
    SOCKET_PATH.to_string()
}

fn default_state_dir() -> String {
    STATE_DIR.to_string()
}

fn default_store_backend() -> String {
    "sqlite".to_string()
}

fn default_max_update_retries() -> u32 {
    stride_core::ledger::DEFAULT_MAX_UPDATE_RETRIES
}

fn default_apply_timeout_ms() -> u64 {
    stride_core::ledger::DEFAULT_APPLY_TIMEOUT_MS
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            state_dir: default_state_dir(),
            store_backend: default_store_backend(),
            max_update_retries: default_max_update_retries(),
            apply_timeout_ms: default_apply_timeout_ms(),
            ranking_max_age_secs: 0,
        }
    }
}

impl DaemonConfig {
    /// Load from the standard path, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config at {}: {}; using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Path of the progression database, with a per-user fallback when
    /// the system state directory is not writable.
    pub fn database_path(&self) -> Result<PathBuf> {
        let state_dir = PathBuf::from(&self.state_dir);
        if state_dir == PathBuf::from(STATE_DIR) && !is_writable_dir(&state_dir) {
            let base = dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("could not determine user data directory"))?;
            return Ok(base.join("stride").join("progress.db"));
        }
        Ok(state_dir.join("progress.db"))
    }

    pub fn ledger_config(&self) -> stride_core::LedgerConfig {
        stride_core::LedgerConfig {
            max_update_retries: self.max_update_retries,
            apply_timeout_ms: self.apply_timeout_ms,
        }
    }
}

fn is_writable_dir(path: &Path) -> bool {
    if !path.exists() {
        return fs::create_dir_all(path).is_ok();
    }
    let probe = path.join(".stride-write-probe");
    match fs::write(&probe, b"") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::default();
        assert_eq!(config.socket_path, SOCKET_PATH);
        assert_eq!(config.store_backend, "sqlite");
        assert_eq!(config.ranking_max_age_secs, 0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: DaemonConfig = toml::from_str("store_backend = \"memory\"").unwrap();
        assert_eq!(config.store_backend, "memory");
        assert_eq!(config.socket_path, SOCKET_PATH);
        assert_eq!(
            config.max_update_retries,
            stride_core::ledger::DEFAULT_MAX_UPDATE_RETRIES
        );
    }

    #[test]
    fn test_load_from_missing_path_uses_defaults() {
        let config = DaemonConfig::load_from(Path::new("/nonexistent/stride.toml"));
        assert_eq!(config.store_backend, "sqlite");
    }

    #[test]
    fn test_custom_state_dir_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig {
            state_dir: dir.path().to_string_lossy().to_string(),
            ..Default::default()
        };
        let path = config.database_path().unwrap();
        assert_eq!(path, dir.path().join("progress.db"));
    }
}
