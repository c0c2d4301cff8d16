pub mod builder;
pub mod config;
pub mod modules;

pub use config::{ConfigCommands, handle_config_command};

use anyhow::{Context, Result};
use std::sync::Arc;
use survey_modules::api::{ApiError, ModuleStore, ModulesClient};
use survey_modules::config::Config;

/// Build the HTTP store from configuration
pub fn open_store(config: &Config) -> Result<Arc<dyn ModuleStore>> {
    let base_url = config.base_url().ok_or(ApiError::NoBackendConfigured).context(
        "Set one with 'survey-modules config set-url <url>' or the SURVEY_MODULES_API_URL variable",
    )?;

    let client = ModulesClient::with_settings(
        base_url,
        config.api.timeout(),
        config.api.retry_config(),
    )
    .context("Failed to build HTTP client")?;

    Ok(Arc::new(client))
}
