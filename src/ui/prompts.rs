//! Confirmation prompts for destructive list actions

use anyhow::Result;
use dialoguer::Select;

const CHOICES: [&str; 2] = ["Yes", "No"];

/// Arrow-key Yes/No selection, answering `true` for "Yes"
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let selection = Select::new()
        .with_prompt(prompt)
        .items(&CHOICES)
        .default(if default_yes { 0 } else { 1 })
        .interact()?;

    Ok(CHOICES[selection] == "Yes")
}

/// Deleting one module; defaults to "No"
pub fn prompt_delete_confirmation(name: &str, id: &str) -> Result<bool> {
    prompt_confirmation(&format!("Delete module '{}' ({})? This cannot be undone", name, id), false)
}

/// Deleting every older copy from a cleanup plan; defaults to "No"
pub fn prompt_cleanup_confirmation(count: usize) -> Result<bool> {
    let noun = if count == 1 { "module" } else { "modules" };
    prompt_confirmation(&format!("Permanently delete {} duplicate {}?", count, noun), false)
}
