//! Terminal rendering of modules, notifications and builder status

use colored::*;
use survey_modules::api::{Module, ModuleStatus};
use survey_modules::builder::SaveStatus;
use survey_modules::modules::{CleanupPlan, ModuleList, Notification, NotificationLevel};

fn status_label(status: &ModuleStatus) -> ColoredString {
    match status {
        ModuleStatus::Active => status.as_str().bright_green(),
        ModuleStatus::Draft => status.as_str().bright_yellow(),
        ModuleStatus::Inactive | ModuleStatus::Archived => status.as_str().dimmed(),
        ModuleStatus::Other(_) => status.as_str().white(),
    }
}

fn timestamp(module: &Module) -> String {
    module
        .last_touched()
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_notification(notification: &Notification) {
    let line = match notification.level {
        NotificationLevel::Error => format!("{} {}", "✗".bright_red().bold(), notification.message.bright_red()),
        NotificationLevel::Success => format!("{} {}", "✓".bright_green().bold(), notification.message),
        NotificationLevel::Info => format!("{} {}", "ℹ".cyan(), notification.message),
    };
    println!("  {}", line);
}

/// Print the module table with the duplicate indicator
pub fn render_module_list(list: &ModuleList) {
    if let Some(notification) = list.notification() {
        render_notification(notification);
    }

    let modules = list.modules();
    if modules.is_empty() {
        println!("  {}", "No survey modules yet.".bright_yellow().bold());
        println!("  {}", "Create one with 'survey-modules create --file survey.json'.".dimmed());
        return;
    }

    let id_width = modules
        .iter()
        .map(|m| m.id.as_deref().unwrap_or("-").len())
        .max()
        .unwrap_or(2)
        .max(2);
    let name_width = modules.iter().map(|m| m.display_name().len()).max().unwrap_or(4).clamp(4, 40);

    println!();
    println!(
        "  {:<id_width$}  {:<name_width$}  {:<10}  {}",
        "ID".bright_white().bold(),
        "NAME".bright_white().bold(),
        "STATUS".bright_white().bold(),
        "UPDATED".bright_white().bold(),
    );
    for module in modules {
        let name: String = module.display_name().chars().take(name_width).collect();
        println!(
            "  {:<id_width$}  {:<name_width$}  {:<10}  {}",
            module.id.as_deref().unwrap_or("-").cyan(),
            name,
            status_label(&module.status),
            timestamp(module).dimmed(),
        );
    }
    println!();
    println!("  {} modules", modules.len());

    if list.has_duplicates() {
        println!(
            "  {} Duplicate names found, run 'survey-modules cleanup' to remove older copies",
            "⚠️".bright_yellow().bold()
        );
    }
}

pub fn render_cleanup_plan(plan: &CleanupPlan) {
    println!();
    for group in plan.groups() {
        println!(
            "  {} keep {} ({})",
            group.name.bright_white().bold(),
            group.keep.id.as_deref().unwrap_or("-").bright_green(),
            timestamp(&group.keep).dimmed()
        );
        for module in &group.remove {
            println!(
                "    {} {} ({})",
                "✗".bright_red(),
                module.id.as_deref().unwrap_or("-").red(),
                timestamp(module).dimmed()
            );
        }
    }
    println!();
}

pub fn render_module(module: &Module) {
    println!();
    println!("  {} {}", "Name:".bright_white().bold(), module.display_name());
    println!("  {} {}", "ID:".bright_white().bold(), module.id.as_deref().unwrap_or("-").cyan());
    println!("  {} {}", "Status:".bright_white().bold(), status_label(&module.status));
    if !module.description.is_empty() {
        println!("  {} {}", "Description:".bright_white().bold(), module.description);
    }
    println!("  {} {}", "Updated:".bright_white().bold(), timestamp(module));
    println!();
    println!("{}", serde_json::to_string_pretty(&module.survey_json).unwrap_or_default());
}

pub fn render_save_status(status: &SaveStatus) {
    match status {
        SaveStatus::Idle => {}
        SaveStatus::Saving => println!("  {}", "Saving...".dimmed()),
        SaveStatus::Saved => println!("  {} {}", "✓".bright_green().bold(), "Saved".bright_green()),
        SaveStatus::Failed(message) => println!("  {} {}", "✗".bright_red().bold(), message.bright_red()),
    }
}
