use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::infra::http::client::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_API_BASE_URL: &str = "https://revisor.dbeliakov.ru/api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Overrides where the token store lives.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: None,
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(app_data_dir)
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir().join("storage.json")
    }

    fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("REVISOR_API_URL") {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
        self
    }
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_path()).map(AppConfig::apply_env_overrides)
}

/// Reads a config file; a missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("REVISOR_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("config.toml")
}

/// `REVISOR_DATA_HOME` when set, otherwise `~/.revisor`.
fn app_data_dir() -> PathBuf {
    std::env::var_os("REVISOR_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|home| home.join(".revisor")))
        .unwrap_or_else(|| PathBuf::from(".revisor"))
}
