//! Application configuration.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use duet_core::{Error, Result};
use duet_playback::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DUET_CONFIG";

const CONFIG_FILE: &str = "config.json";

/// Top-level configuration for the `duet` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transport: TransportConfig,
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// How long the driver runs before exiting.
    pub demo_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            log_filter: "duet=info,duet_playback=info,duet_lyrics=info".to_string(),
            demo_seconds: 30,
        }
    }
}

impl AppConfig {
    /// Load from `$DUET_CONFIG`, else from the platform config directory,
    /// else defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(default_path);

        match path {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Reading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.transport.validate()?;
        if config.demo_seconds == 0 {
            return Err(Error::Config("demo_seconds must be at least 1".to_string()));
        }
        Ok(config)
    }
}

fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "duet", "Duet").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
