use crate::api::RetryConfig;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the configured backend URL
pub const API_URL_ENV: &str = "SURVEY_MODULES_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub builder: BuilderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    /// Base URL of the backend serving `/modules`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after the first one for idempotent calls
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuilderSettings {
    /// Quiet period after the last edit before an autosave fires
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// How long a "Saved" status stays visible
    #[serde(default = "default_saved_status_ms")]
    pub saved_status_ms: u64,
    /// How long a "Failed" status stays visible
    #[serde(default = "default_failed_status_ms")]
    pub failed_status_ms: u64,
    /// Keep a local copy of the last edited document
    #[serde(default = "default_backup")]
    pub backup: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_debounce_ms() -> u64 {
    1500
}

fn default_saved_status_ms() -> u64 {
    2000
}

fn default_failed_status_ms() -> u64 {
    5000
}

fn default_backup() -> bool {
    true
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry budget for the HTTP client: the first attempt plus
    /// `max_retries` retries
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_max_attempts(self.max_retries.saturating_add(1))
    }
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            saved_status_ms: default_saved_status_ms(),
            failed_status_ms: default_failed_status_ms(),
            backup: default_backup(),
        }
    }
}

impl BuilderSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn saved_status_window(&self) -> Duration {
        Duration::from_millis(self.saved_status_ms)
    }

    pub fn failed_status_window(&self) -> Duration {
        Duration::from_millis(self.failed_status_ms)
    }
}

impl Config {
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("survey-modules")
        } else {
            // Use home directory with dot prefix on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".survey-modules")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    /// Load the user config, then apply the environment override
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_url_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", path);

        if !path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        debug!("Loaded config (backend: {:?})", config.api.base_url);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", path);

        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Replace the backend URL when an override value is present
    pub fn apply_url_override(&mut self, url: Option<String>) {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            debug!("Backend URL overridden from environment: {}", url);
            self.api.base_url = Some(url);
        }
    }

    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("Backend URL must start with http:// or https://, got '{}'", url);
        }

        info!("Setting backend URL to: {}", url);
        self.api.base_url = Some(url.to_string());
        Ok(())
    }

    /// Configured backend URL, if any
    pub fn base_url(&self) -> Option<&str> {
        self.api.base_url.as_deref().filter(|url| !url.is_empty())
    }
}
