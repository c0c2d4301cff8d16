//! Save reconciliation state for one open builder
//!
//! A session starts `Unsaved` (no module id) and becomes `Persisted` once a
//! create returns a server-assigned id. From then on every save is an
//! update. At most one save is in flight; triggers arriving meanwhile are
//! answered without doing any work.

use crate::api::{ApiError, ApiResult, Module, is_empty_document};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::Value;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Failed(String),
}

/// What asked for a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// Debounced signal after the document changed
    Autosave,
    /// Explicit save gesture; returns to the list once persisted
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unsaved,
    Persisted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavePlan {
    Create,
    Update(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDecision {
    /// Another save is outstanding; report success without work
    AlreadyInFlight,
    /// Document equals the last persisted one
    Unchanged,
    Proceed(SavePlan),
}

/// How long terminal statuses stay visible
#[derive(Debug, Clone, Copy)]
pub struct StatusWindows {
    pub saved: Duration,
    pub failed: Duration,
}

impl Default for StatusWindows {
    fn default() -> Self {
        Self {
            saved: Duration::from_secs(2),
            failed: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
pub struct SaveSession {
    module_id: Option<String>,
    /// Creation time reported for the tracked module
    created_at: Option<DateTime<Utc>>,
    last_persisted: Option<Value>,
    save_in_flight: bool,
    manual_save_requested: bool,
    status: SaveStatus,
    status_until: Option<Instant>,
    windows: StatusWindows,
}

impl SaveSession {
    pub fn new(windows: StatusWindows) -> Self {
        Self {
            module_id: None,
            created_at: None,
            last_persisted: None,
            save_in_flight: false,
            manual_save_requested: false,
            status: SaveStatus::Idle,
            status_until: None,
            windows,
        }
    }

    /// Session for a module that already exists on the backend
    pub fn for_module(module: &Module, windows: StatusWindows) -> Self {
        let mut session = Self::new(windows);
        session.module_id = module.id.clone();
        session.created_at = module.created_at;
        session.last_persisted = Some(module.survey_json.clone());
        session
    }

    pub fn module_id(&self) -> Option<&str> {
        self.module_id.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn phase(&self) -> SessionPhase {
        if self.module_id.is_some() {
            SessionPhase::Persisted
        } else {
            SessionPhase::Unsaved
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.save_in_flight
    }

    pub fn manual_save_requested(&self) -> bool {
        self.manual_save_requested
    }

    /// Current status; `Saved` and `Failed` fall back to `Idle` once their
    /// display window has passed
    pub fn status(&self) -> SaveStatus {
        match (&self.status, self.status_until) {
            (SaveStatus::Saved | SaveStatus::Failed(_), Some(until)) if Instant::now() >= until => {
                SaveStatus::Idle
            }
            (status, _) => status.clone(),
        }
    }

    fn set_status(&mut self, status: SaveStatus, window: Option<Duration>) {
        self.status = status;
        self.status_until = window.map(|w| Instant::now() + w);
    }

    /// Decide what a trigger should do and, when it proceeds, take the
    /// in-flight guard
    pub fn begin(&mut self, trigger: SaveTrigger, document: &Value) -> ApiResult<SaveDecision> {
        if trigger == SaveTrigger::Manual {
            self.manual_save_requested = true;
        }

        if self.save_in_flight {
            debug!("Save already in flight, skipping {:?} trigger", trigger);
            return Ok(SaveDecision::AlreadyInFlight);
        }

        if is_empty_document(document) {
            self.fail(ApiError::EmptyDocument.to_string());
            return Err(ApiError::EmptyDocument);
        }

        if trigger == SaveTrigger::Autosave && self.last_persisted.as_ref() == Some(document) {
            debug!("Document unchanged since last save, skipping autosave");
            return Ok(SaveDecision::Unchanged);
        }

        self.save_in_flight = true;
        self.set_status(SaveStatus::Saving, None);

        let plan = match &self.module_id {
            Some(id) => SavePlan::Update(id.clone()),
            None => SavePlan::Create,
        };
        Ok(SaveDecision::Proceed(plan))
    }

    /// Record a successful save and release the guard. Returns the module
    /// to navigate back with when a manual save was pending.
    pub fn succeed(&mut self, module: &Module, document: Value) -> Option<Module> {
        match &module.id {
            Some(id) => {
                if self.module_id.as_deref() != Some(id.as_str()) {
                    debug!("Session now tracks module {}", id);
                }
                self.module_id = Some(id.clone());
            }
            None => warn!("Backend returned a module without id, session stays unsaved"),
        }
        if module.created_at.is_some() {
            self.created_at = module.created_at;
        }

        self.last_persisted = Some(document);
        self.save_in_flight = false;
        self.set_status(SaveStatus::Saved, Some(self.windows.saved));

        if std::mem::take(&mut self.manual_save_requested) {
            Some(module.clone())
        } else {
            None
        }
    }

    /// Record a failed save and release the guard. A pending manual save is
    /// dropped so a later autosave does not navigate away unexpectedly.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.save_in_flight = false;
        self.manual_save_requested = false;
        self.set_status(SaveStatus::Failed(message.into()), Some(self.windows.failed));
    }

    /// Release the guard after an interrupted save
    pub fn release(&mut self) {
        if self.save_in_flight {
            self.save_in_flight = false;
            self.set_status(SaveStatus::Idle, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ModuleDraft;
    use serde_json::json;

    fn saved(id: &str, document: &Value) -> Module {
        ModuleDraft::new("S", document.clone()).into_module(Some(id.to_string()), None, None)
    }

    #[test]
    fn test_first_save_creates_then_updates() {
        let mut session = SaveSession::new(StatusWindows::default());
        let doc = json!({ "title": "S" });
        assert_eq!(session.phase(), SessionPhase::Unsaved);

        let decision = session.begin(SaveTrigger::Autosave, &doc).unwrap();
        assert_eq!(decision, SaveDecision::Proceed(SavePlan::Create));
        assert!(session.is_in_flight());
        assert_eq!(session.status(), SaveStatus::Saving);

        assert!(session.succeed(&saved("9", &doc), doc.clone()).is_none());
        assert_eq!(session.phase(), SessionPhase::Persisted);
        assert_eq!(session.status(), SaveStatus::Saved);

        let changed = json!({ "title": "S2" });
        let decision = session.begin(SaveTrigger::Autosave, &changed).unwrap();
        assert_eq!(decision, SaveDecision::Proceed(SavePlan::Update("9".to_string())));
    }

    #[test]
    fn test_creation_time_follows_the_tracked_module() {
        let mut session = SaveSession::new(StatusWindows::default());
        let doc = json!({ "title": "S" });
        let created = Utc::now();

        session.begin(SaveTrigger::Autosave, &doc).unwrap();
        let module = ModuleDraft::new("S", doc.clone()).into_module(Some("4".into()), Some(created), None);
        session.succeed(&module, doc.clone());
        assert_eq!(session.created_at(), Some(created));

        // A response without the field does not erase what is known
        let changed = json!({ "title": "S2" });
        session.begin(SaveTrigger::Autosave, &changed).unwrap();
        session.succeed(&saved("4", &changed), changed);
        assert_eq!(session.created_at(), Some(created));
    }

    #[test]
    fn test_in_flight_short_circuits() {
        let mut session = SaveSession::new(StatusWindows::default());
        let doc = json!({ "title": "S" });
        session.begin(SaveTrigger::Autosave, &doc).unwrap();

        let second = session.begin(SaveTrigger::Autosave, &json!({ "title": "other" })).unwrap();
        assert_eq!(second, SaveDecision::AlreadyInFlight);
        assert!(session.is_in_flight());
    }

    #[test]
    fn test_unchanged_autosave_is_skipped_but_manual_is_not() {
        let mut session = SaveSession::new(StatusWindows::default());
        let doc = json!({ "title": "S", "pages": [] });
        session.begin(SaveTrigger::Autosave, &doc).unwrap();
        session.succeed(&saved("1", &doc), doc.clone());

        // Same canonical content, different key order
        let reordered: Value = serde_json::from_str(r#"{ "pages": [], "title": "S" }"#).unwrap();
        assert_eq!(session.begin(SaveTrigger::Autosave, &reordered).unwrap(), SaveDecision::Unchanged);
        assert!(!session.is_in_flight());

        let manual = session.begin(SaveTrigger::Manual, &reordered).unwrap();
        assert_eq!(manual, SaveDecision::Proceed(SavePlan::Update("1".to_string())));
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let mut session = SaveSession::new(StatusWindows::default());
        let err = session.begin(SaveTrigger::Manual, &json!({})).unwrap_err();

        assert!(matches!(err, ApiError::EmptyDocument));
        assert!(!session.is_in_flight());
        assert!(!session.manual_save_requested());
        assert!(matches!(session.status(), SaveStatus::Failed(_)));
    }

    #[test]
    fn test_manual_save_navigates_once() {
        let mut session = SaveSession::new(StatusWindows::default());
        let doc = json!({ "title": "S" });
        session.begin(SaveTrigger::Manual, &doc).unwrap();

        let back = session.succeed(&saved("4", &doc), doc.clone());
        assert_eq!(back.and_then(|m| m.id), Some("4".to_string()));
        assert!(!session.manual_save_requested());
    }

    #[test]
    fn test_manual_trigger_during_autosave_navigates_after_it() {
        let mut session = SaveSession::new(StatusWindows::default());
        let doc = json!({ "title": "S" });
        session.begin(SaveTrigger::Autosave, &doc).unwrap();
        assert_eq!(session.begin(SaveTrigger::Manual, &doc).unwrap(), SaveDecision::AlreadyInFlight);

        assert!(session.succeed(&saved("2", &doc), doc.clone()).is_some());
    }

    #[test]
    fn test_failure_keeps_identity_and_releases_guard() {
        let mut session = SaveSession::new(StatusWindows::default());
        let doc = json!({ "title": "S" });
        session.begin(SaveTrigger::Autosave, &doc).unwrap();
        session.fail("backend down");

        assert!(!session.is_in_flight());
        assert_eq!(session.phase(), SessionPhase::Unsaved);
        assert_eq!(session.status(), SaveStatus::Failed("backend down".to_string()));
    }

    #[test]
    fn test_status_windows_expire() {
        let windows = StatusWindows {
            saved: Duration::ZERO,
            failed: Duration::ZERO,
        };
        let mut session = SaveSession::new(windows);
        session.fail("x");
        assert_eq!(session.status(), SaveStatus::Idle);
    }

    #[test]
    fn test_existing_module_starts_persisted() {
        let doc = json!({ "title": "S" });
        let mut session = SaveSession::for_module(&saved("7", &doc), StatusWindows::default());

        assert_eq!(session.phase(), SessionPhase::Persisted);
        assert_eq!(session.begin(SaveTrigger::Autosave, &doc).unwrap(), SaveDecision::Unchanged);
    }
}
