use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://memegen.link/api/templates/";

/// How the `meme` command treats template keys missing from the catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Reject unknown keys with a listing of valid ones.
    #[default]
    Strict,
    /// Skip the catalog and let the render endpoint decide.
    Permissive,
}

/// Runtime settings, read from `config.json` in the platform config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Templates endpoint; also the prefix stripped from template URLs.
    pub catalog_url: String,
    /// Base URL that render path segments are appended to.
    pub render_url: String,
    pub validation: ValidationMode,
    /// Load the catalog at start-up and fail fast if that is impossible.
    pub preload_catalog: bool,
    /// Periodic catalog refresh. `None` keeps the first catalog forever.
    pub refresh_interval_secs: Option<u64>,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    /// Display name of the local user in the terminal room.
    pub username: String,
    /// Name of the terminal room.
    pub room: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_API_URL.to_string(),
            render_url: DEFAULT_API_URL.to_string(),
            validation: ValidationMode::Strict,
            preload_catalog: true,
            refresh_interval_secs: None,
            http_timeout_secs: 30,
            user_agent: "memegen-chat".to_string(),
            username: std::env::var("USER").unwrap_or_else(|_| "me".to_string()),
            room: "general".to_string(),
        }
    }
}

impl Config {
    /// Default location: `<config dir>/config.json`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = ProjectDirs::from("com", "memegen-chat", "memegen-chat")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Loads and validates the config at `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("catalog_url", &self.catalog_url),
            ("render_url", &self.render_url),
        ] {
            if reqwest::Url::parse(value)
                .map(|url| !matches!(url.scheme(), "http" | "https"))
                .unwrap_or(true)
            {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("'{value}' is not an http(s) URL"),
                });
            }
        }
        if self.refresh_interval_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "refresh_interval_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs.map(Duration::from_secs)
    }
}
