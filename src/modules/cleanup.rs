//! Duplicate detection and cleanup planning
//!
//! Modules are grouped by name (case-sensitive, missing names count as
//! "Unnamed"). Within a group the most recently touched module survives.

use crate::api::Module;
use std::collections::{HashMap, HashSet};

/// Whether any two modules share a name
pub fn has_duplicates(modules: &[Module]) -> bool {
    let distinct: HashSet<&str> = modules.iter().map(Module::display_name).collect();
    distinct.len() < modules.len()
}

/// Modules sharing one name
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub name: String,
    /// Most recently updated member
    pub keep: Module,
    /// Members scheduled for deletion, newest first
    pub remove: Vec<Module>,
}

/// Deletions a cleanup sweep would perform
#[derive(Debug, Clone, Default)]
pub struct CleanupPlan {
    groups: Vec<DuplicateGroup>,
}

impl CleanupPlan {
    pub fn from_modules(modules: &[Module]) -> Self {
        let mut order: Vec<&str> = Vec::new();
        let mut by_name: HashMap<&str, Vec<&Module>> = HashMap::new();

        for module in modules {
            let name = module.display_name();
            by_name
                .entry(name)
                .or_insert_with(|| {
                    order.push(name);
                    Vec::new()
                })
                .push(module);
        }

        let groups = order
            .into_iter()
            .filter_map(|name| {
                let mut members = by_name.remove(name)?;
                if members.len() < 2 {
                    return None;
                }

                // Undated members sort last; stable sort keeps load order on ties
                members.sort_by(|a, b| b.last_touched().cmp(&a.last_touched()));
                let mut members = members.into_iter().cloned();
                let keep = members.next()?;

                Some(DuplicateGroup {
                    name: name.to_string(),
                    keep,
                    remove: members.collect(),
                })
            })
            .collect();

        Self { groups }
    }

    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of modules the sweep will try to delete
    pub fn removal_count(&self) -> usize {
        self.ids_to_remove().len()
    }

    /// Ids scheduled for deletion; unsaved members have nothing to delete
    pub fn ids_to_remove(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|group| group.remove.iter())
            .filter_map(|module| module.id.clone())
            .collect()
    }

    /// Record the user's consent; only a confirmed plan can be executed
    pub fn confirm(self) -> ConfirmedCleanup {
        ConfirmedCleanup { plan: self }
    }
}

/// A cleanup plan the user agreed to run
#[derive(Debug, Clone)]
pub struct ConfirmedCleanup {
    plan: CleanupPlan,
}

impl ConfirmedCleanup {
    pub fn plan(&self) -> &CleanupPlan {
        &self.plan
    }
}
