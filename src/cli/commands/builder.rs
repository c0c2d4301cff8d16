//! Builder commands: a JSON file stands in for the form designer
//!
//! The file is polled for changes; every parsed change goes to the
//! designer, which debounces it into an autosave. `s` + Enter saves and
//! returns to the list, `q` + Enter leaves without a final save.

use anyhow::{Context, Result};
use colored::*;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use survey_modules::api::{Module, ModuleStore};
use survey_modules::builder::{
    BuilderAdapter, BuilderEvent, BuilderExit, Designer, DocumentBackup, DocumentFile, DocumentFileError,
    ShortcutListener, StatusWindows,
};
use survey_modules::config::Config;
use survey_modules::modules::{BuilderMode, ModuleList};
use tokio::sync::mpsc;

use crate::ui::render::{render_module_list, render_save_status};

const POLL_INTERVAL: Duration = Duration::from_millis(400);

pub async fn create_command(config: &Config, store: Arc<dyn ModuleStore>, file: PathBuf, restore: bool) -> Result<()> {
    let mut initial = read_document(&file).await?;
    if restore {
        match DocumentBackup::default_location().and_then(|b| b.restore()) {
            Some(document) => initial = Some(document),
            None => println!("  {} No local backup found", "⚠️".bright_yellow().bold()),
        }
    }
    let initial = initial.unwrap_or_else(|| json!({}));
    write_document(&file, &initial).await?;

    let mut list = ModuleList::new(store.clone());
    list.open_builder(BuilderMode::Create);
    let exit = run_builder(config, store, None, initial, &file).await;
    finish(&mut list, exit).await
}

pub async fn edit_command(config: &Config, store: Arc<dyn ModuleStore>, id: &str, file: PathBuf) -> Result<()> {
    let module = store.get(id).await?;
    write_document(&file, &module.survey_json).await?;

    let mut list = ModuleList::new(store.clone());
    list.open_builder(BuilderMode::Edit(id.to_string()));
    let initial = module.survey_json.clone();
    let exit = run_builder(config, store, Some(&module), initial, &file).await;
    finish(&mut list, exit).await
}

async fn finish(list: &mut ModuleList, exit: BuilderExit) -> Result<()> {
    let saved = match &exit {
        BuilderExit::Saved(module) => Some(module),
        BuilderExit::Cancelled => None,
    };
    list.return_to_list(saved).await;
    render_module_list(list);
    Ok(())
}

async fn run_builder(
    config: &Config,
    store: Arc<dyn ModuleStore>,
    existing: Option<&Module>,
    initial: Value,
    file: &Path,
) -> BuilderExit {
    let (designer, requests) = Designer::spawn(initial, config.builder.debounce());
    let windows = StatusWindows {
        saved: config.builder.saved_status_window(),
        failed: config.builder.failed_status_window(),
    };

    let (mut adapter, mut events) = match existing {
        Some(module) => BuilderAdapter::for_module(Some(store), designer.clone(), module, false, windows),
        None => BuilderAdapter::new(Some(store), designer.clone(), windows),
    };
    if config.builder.backup {
        if let Some(backup) = DocumentBackup::default_location() {
            adapter = adapter.with_backup(backup);
        }
    }

    // Keystrokes pass through the file relay, which reloads the file before a save
    let (keys_tx, keys_rx) = mpsc::unbounded_channel();
    let (shortcut_tx, shortcut_rx) = mpsc::unbounded_channel();
    adapter.register_shortcuts(ShortcutListener::stdin(keys_tx));

    let watcher = tokio::spawn(DocumentFile::new(file).drive(
        designer,
        keys_rx,
        shortcut_tx,
        POLL_INTERVAL,
        |e: &DocumentFileError| println!("  {} {}", "⚠️".bright_yellow().bold(), e),
    ));
    let reporter = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                BuilderEvent::Saved(module) => println!(
                    "  {} Saved module {}",
                    "✓".bright_green().bold(),
                    module.id.as_deref().unwrap_or("-").cyan()
                ),
                BuilderEvent::NavigateBack(_) => {}
                BuilderEvent::SaveFailed(message) => println!("  {} {}", "✗".bright_red().bold(), message.bright_red()),
            }
        }
    });

    println!();
    println!("  {} {}", "Editing".bright_white().bold(), file.display().to_string().cyan());
    println!("  {}", "Changes are saved automatically. Type 's' + Enter to save and return, 'q' + Enter to leave.".dimmed());
    println!();

    let exit = adapter.run(requests, shortcut_rx).await;
    render_save_status(&adapter.status());

    watcher.abort();
    reporter.abort();
    exit
}

async fn read_document(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read document file: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    let document = serde_json::from_str(&content)
        .with_context(|| format!("Document file is not valid JSON: {}", path.display()))?;
    Ok(Some(document))
}

async fn write_document(path: &Path, document: &Value) -> Result<()> {
    let content = serde_json::to_string_pretty(document)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write document file: {}", path.display()))
}
