//! List view commands: list, show, delete and duplicate cleanup

use anyhow::Result;
use colored::*;
use is_terminal::IsTerminal;
use std::sync::Arc;
use survey_modules::api::ModuleStore;
use survey_modules::modules::ModuleList;

use crate::ui::prompts::{prompt_cleanup_confirmation, prompt_delete_confirmation};
use crate::ui::render::{render_cleanup_plan, render_module, render_module_list, render_notification};

/// Load and print the collection
pub async fn list_command(store: Arc<dyn ModuleStore>) -> Result<()> {
    let mut list = ModuleList::new(store);
    if !list.load().await {
        if let Some(notification) = list.notification() {
            render_notification(notification);
        }
        anyhow::bail!("Could not load modules");
    }

    render_module_list(&list);
    Ok(())
}

/// Print one module read-only
pub async fn show_command(store: Arc<dyn ModuleStore>, id: &str) -> Result<()> {
    let module = store.get(id).await?;
    render_module(&module);
    Ok(())
}

/// Destructive commands need a prompt or an explicit --force
fn ensure_confirmable(force: bool) -> Result<()> {
    if !force && !std::io::stdin().is_terminal() {
        anyhow::bail!("Not running in a terminal, pass --force to skip the confirmation prompt");
    }
    Ok(())
}

pub async fn delete_command(store: Arc<dyn ModuleStore>, id: &str, force: bool) -> Result<()> {
    ensure_confirmable(force)?;
    let mut list = ModuleList::new(store.clone());
    let module = store.get(id).await?;

    if !force && !prompt_delete_confirmation(module.display_name(), id)? {
        println!("{} Cancelled.", "❌".bright_red().bold());
        return Ok(());
    }

    if !list.delete(id).await {
        if let Some(notification) = list.notification() {
            render_notification(notification);
        }
        anyhow::bail!("Could not delete module {}", id);
    }

    render_module_list(&list);
    Ok(())
}

/// Preview, confirm and run the duplicate cleanup sweep
pub async fn cleanup_command(store: Arc<dyn ModuleStore>, force: bool) -> Result<()> {
    ensure_confirmable(force)?;
    let mut list = ModuleList::new(store);
    if !list.load().await {
        anyhow::bail!("Could not load modules");
    }

    if !list.has_duplicates() {
        println!("{} No duplicate modules found", "✓".bright_green().bold());
        return Ok(());
    }

    let plan = list.plan_cleanup();
    render_cleanup_plan(&plan);

    if !force && !prompt_cleanup_confirmation(plan.removal_count())? {
        println!("{} Cancelled.", "❌".bright_red().bold());
        return Ok(());
    }

    let expected = plan.removal_count();
    let removed = list.cleanup_duplicates(plan.confirm()).await;
    if removed < expected {
        println!(
            "  {} {} of {} duplicates could not be removed, see the log for details",
            "⚠️".bright_yellow().bold(),
            expected - removed,
            expected
        );
    }

    render_module_list(&list);
    Ok(())
}
