use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use survey_modules::config::{API_URL_ENV, Config};

#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show the effective configuration
    Show,
    /// Set the backend base URL
    SetUrl {
        /// Base URL, e.g. http://localhost:3001
        url: String,
    },
    /// Restore the default configuration
    Reset,
}

pub fn handle_config_command(cmd: ConfigCommands, config: &Config) -> Result<()> {
    match cmd.command {
        ConfigSubcommands::Show => {
            println!("  {} {}", "Config file:".bright_white().bold(), Config::get_config_path()?.display());
            match config.base_url() {
                Some(url) => println!("  {} {}", "Backend:".bright_white().bold(), url.cyan()),
                None => println!(
                    "  {} {} (set one with 'config set-url' or {})",
                    "Backend:".bright_white().bold(),
                    "not configured".bright_yellow(),
                    API_URL_ENV
                ),
            }
            println!();
            println!("{}", toml::to_string_pretty(config)?.dimmed());
            Ok(())
        }
        ConfigSubcommands::SetUrl { url } => {
            // Start from the file, not the environment-overridden view
            let mut stored = Config::load_from(&Config::get_config_path()?)?;
            stored.set_base_url(&url)?;
            stored.save()?;
            println!("{} Backend set to {}", "✓".bright_green().bold(), url.cyan());
            Ok(())
        }
        ConfigSubcommands::Reset => {
            Config::default().save()?;
            println!("{} Configuration reset to defaults", "✓".bright_green().bold());
            Ok(())
        }
    }
}
