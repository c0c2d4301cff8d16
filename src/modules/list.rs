//! The module list view
//!
//! Holds the collection as last fetched from the backend. Every mutation is
//! followed by a full reload, so what is displayed always reflects the
//! backend rather than local bookkeeping.

use super::cleanup::{self, CleanupPlan, ConfirmedCleanup};
use super::notification::Notification;
use super::route::{BuilderMode, Route};
use crate::api::{Module, ModuleStore};
use log::{debug, info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    Idle,
    Loading,
}

pub struct ModuleList {
    store: Arc<dyn ModuleStore>,
    modules: Vec<Module>,
    state: ListState,
    notification: Option<Notification>,
    route: Route,
}

impl ModuleList {
    pub fn new(store: Arc<dyn ModuleStore>) -> Self {
        Self {
            store,
            modules: Vec::new(),
            state: ListState::Idle,
            notification: None,
            route: Route::List,
        }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Current notification, unless it has expired
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref().filter(|n| !n.is_expired())
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    /// Fetch the collection. On failure the displayed modules stay as they
    /// were and an error notification is raised. Returns whether the fetch
    /// succeeded.
    pub async fn load(&mut self) -> bool {
        self.state = ListState::Loading;
        let result = self.store.list().await;
        self.state = ListState::Idle;

        match result {
            Ok(modules) => {
                debug!("Loaded {} modules", modules.len());
                self.modules = modules;
                true
            }
            Err(e) => {
                warn!("Failed to load modules: {}", e);
                self.notify(Notification::error(format!("Failed to load modules: {}", e)));
                false
            }
        }
    }

    /// Delete a module and reload the collection
    pub async fn delete(&mut self, id: &str) -> bool {
        match self.store.remove(id).await {
            Ok(()) => {
                info!("Deleted module {}", id);
                self.notify(Notification::success(format!("Module {} deleted", id)));
                self.load().await;
                true
            }
            Err(e) => {
                warn!("Failed to delete module {}: {}", id, e);
                self.notify(Notification::error(format!("Failed to delete module: {}", e)));
                false
            }
        }
    }

    /// Whether the "clean up duplicates" action is worth offering
    pub fn has_duplicates(&self) -> bool {
        cleanup::has_duplicates(&self.modules)
    }

    /// Plan a duplicate cleanup over the loaded collection
    pub fn plan_cleanup(&self) -> CleanupPlan {
        CleanupPlan::from_modules(&self.modules)
    }

    /// Delete every duplicate in a confirmed plan
    ///
    /// Individual failures are logged and skipped. Returns the number of
    /// modules actually deleted. The collection is reloaded afterwards no
    /// matter how many deletions failed.
    pub async fn cleanup_duplicates(&mut self, cleanup: ConfirmedCleanup) -> usize {
        let ids = cleanup.plan().ids_to_remove();
        info!("Cleaning up {} duplicate modules", ids.len());

        let mut removed = 0;
        for id in &ids {
            match self.store.remove(id).await {
                Ok(()) => {
                    debug!("Removed duplicate module {}", id);
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove duplicate module {}: {}", id, e),
            }
        }

        let failed = ids.len() - removed;
        if failed == 0 {
            self.notify(Notification::success(format!("Removed {} duplicate modules", removed)));
        } else {
            self.notify(Notification::error(format!(
                "Removed {} of {} duplicate modules, {} could not be deleted",
                removed,
                ids.len(),
                failed
            )));
        }
        self.load().await;
        removed
    }

    /// Switch to the builder
    pub fn open_builder(&mut self, mode: BuilderMode) {
        debug!("Opening builder: {:?}", mode);
        self.route = Route::Builder(mode);
    }

    /// Come back from the builder and refresh, reporting what was saved
    pub async fn return_to_list(&mut self, saved: Option<&Module>) -> bool {
        self.route = Route::List;
        if let Some(module) = saved {
            self.notify(Notification::success(format!("Saved \"{}\"", module.display_name())));
        }
        self.load().await
    }
}
