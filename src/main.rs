use anyhow::Result;
use clap::Parser;
use log::info;

mod cli;
mod ui;

use cli::Cli;
use cli::app::Commands;
use cli::commands::builder::{create_command, edit_command};
use cli::commands::modules::{cleanup_command, delete_command, list_command, show_command};
use cli::commands::{handle_config_command, open_store};
use survey_modules::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Before the logger so RUST_LOG may come from .env; a missing file is fine
    let _ = dotenvy::dotenv();

    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("survey-modules.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting survey-modules");

    let config = Config::load()?;

    match cli.command {
        Commands::Config(cmd) => handle_config_command(cmd, &config),
        Commands::List => list_command(open_store(&config)?).await,
        Commands::Show { id } => show_command(open_store(&config)?, &id).await,
        Commands::Delete { id, force } => delete_command(open_store(&config)?, &id, force).await,
        Commands::Cleanup { force } => cleanup_command(open_store(&config)?, force).await,
        Commands::Create { file, restore } => create_command(&config, open_store(&config)?, file, restore).await,
        Commands::Edit { id, file } => edit_command(&config, open_store(&config)?, &id, file).await,
    }
}
