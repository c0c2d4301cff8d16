use super::commands::ConfigCommands;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "survey-modules")]
#[command(about = "Manage survey modules stored behind a REST backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all survey modules
    List,
    /// Show one module and its survey document
    Show {
        /// Module id
        id: String,
    },
    /// Delete a module
    Delete {
        /// Module id
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Remove modules sharing a name, keeping the most recently updated one
    Cleanup {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Build a new module from a JSON document file, autosaving on change
    Create {
        /// Survey document to watch
        #[arg(short, long)]
        file: PathBuf,
        /// Seed the document from the local backup of the last edit
        #[arg(long)]
        restore: bool,
    },
    /// Edit an existing module through a JSON document file
    Edit {
        /// Module id
        id: String,
        /// File the document is written to and watched at
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Configuration management
    Config(ConfigCommands),
}
