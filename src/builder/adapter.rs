//! The builder adapter
//!
//! Sits between the [`Designer`] and a [`ModuleStore`]. Save requests coming
//! from the designer go through the [`SaveSession`] state machine, which
//! decides between skipping, creating and updating; the outcome is always
//! acknowledged back to the request exactly once.

use super::ack::SaveRequest;
use super::backup::DocumentBackup;
use super::designer::Designer;
use super::session::{SaveDecision, SavePlan, SaveSession, SaveStatus, SaveTrigger, SessionPhase, StatusWindows};
use super::shortcuts::{ShortcutCommand, ShortcutListener};
use crate::api::{ApiError, ApiResult, Module, ModuleDraft, ModuleStore};
use crate::modules::BuilderMode;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Notifications emitted to the view hosting the builder
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderEvent {
    /// A save reached the backend
    Saved(Module),
    /// A manual save completed; the host should return to the list
    NavigateBack(Module),
    /// A save attempt failed with this message
    SaveFailed(String),
}

/// What a single save call did
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Another save was outstanding, nothing was sent
    Skipped,
    /// Document had not changed, nothing was sent
    Unchanged,
    Persisted(Module),
}

/// Why the builder loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderExit {
    /// Manual save succeeded with this module
    Saved(Module),
    /// User left without a final manual save
    Cancelled,
}

pub struct BuilderAdapter {
    store: Option<Arc<dyn ModuleStore>>,
    designer: Designer,
    mode: BuilderMode,
    /// Metadata of the module being edited, reused where the document is silent
    template: Option<ModuleDraft>,
    session: Mutex<SaveSession>,
    events: mpsc::UnboundedSender<BuilderEvent>,
    closed: AtomicBool,
    shortcuts: Mutex<Option<ShortcutListener>>,
    backup: Option<DocumentBackup>,
}

impl BuilderAdapter {
    /// Adapter for a new module
    pub fn new(
        store: Option<Arc<dyn ModuleStore>>,
        designer: Designer,
        windows: StatusWindows,
    ) -> (Self, mpsc::UnboundedReceiver<BuilderEvent>) {
        Self::build(store, designer, BuilderMode::Create, None, SaveSession::new(windows))
    }

    /// Adapter for an existing module, in edit or view mode
    pub fn for_module(
        store: Option<Arc<dyn ModuleStore>>,
        designer: Designer,
        module: &Module,
        read_only: bool,
        windows: StatusWindows,
    ) -> (Self, mpsc::UnboundedReceiver<BuilderEvent>) {
        let id = module.id.clone().unwrap_or_default();
        let mode = if read_only {
            BuilderMode::View(id)
        } else {
            BuilderMode::Edit(id)
        };

        Self::build(
            store,
            designer,
            mode,
            Some(ModuleDraft::from(module)),
            SaveSession::for_module(module, windows),
        )
    }

    fn build(
        store: Option<Arc<dyn ModuleStore>>,
        designer: Designer,
        mode: BuilderMode,
        template: Option<ModuleDraft>,
        session: SaveSession,
    ) -> (Self, mpsc::UnboundedReceiver<BuilderEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let adapter = Self {
            store,
            designer,
            mode,
            template,
            session: Mutex::new(session),
            events,
            closed: AtomicBool::new(false),
            shortcuts: Mutex::new(None),
            backup: None,
        };
        (adapter, events_rx)
    }

    /// Keep a local copy of every document that is about to be saved
    pub fn with_backup(mut self, backup: DocumentBackup) -> Self {
        self.backup = Some(backup);
        self
    }

    pub fn mode(&self) -> &BuilderMode {
        &self.mode
    }

    pub fn designer(&self) -> &Designer {
        &self.designer
    }

    pub fn status(&self) -> SaveStatus {
        self.session().status()
    }

    pub fn module_id(&self) -> Option<String> {
        self.session().module_id().map(str::to_string)
    }

    pub fn phase(&self) -> SessionPhase {
        self.session().phase()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn session(&self) -> MutexGuard<'_, SaveSession> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handle one request from the designer and acknowledge it
    ///
    /// Returns the module to navigate back with when this request completed
    /// a manual save.
    pub async fn handle(&self, request: SaveRequest) -> Option<Module> {
        let SaveRequest { sequence, trigger, ack } = request;
        debug!("Handling save request #{} ({:?})", sequence, trigger);

        match self.save(trigger).await {
            Ok((outcome, navigate_back)) => {
                if let SaveOutcome::Persisted(module) = &outcome {
                    debug!("Save request #{} persisted module {:?}", sequence, module.id);
                }
                ack.success();
                navigate_back
            }
            Err(e) => {
                warn!("Save request #{} failed: {}", sequence, e);
                if !matches!(e, ApiError::Closed) {
                    let _ = self.events.send(BuilderEvent::SaveFailed(e.to_string()));
                }
                ack.failure(e.to_string());
                None
            }
        }
    }

    /// Run the save procedure for the designer's current document
    pub async fn save(&self, trigger: SaveTrigger) -> ApiResult<(SaveOutcome, Option<Module>)> {
        if self.is_closed() {
            return Err(ApiError::Closed);
        }
        if self.mode.is_read_only() {
            return Err(ApiError::ReadOnly);
        }

        let document = self.designer.document();
        let decision = self.session().begin(trigger, &document)?;

        let plan = match decision {
            SaveDecision::AlreadyInFlight => return Ok((SaveOutcome::Skipped, None)),
            SaveDecision::Unchanged => return Ok((SaveOutcome::Unchanged, None)),
            SaveDecision::Proceed(plan) => plan,
        };

        let mut guard = InFlightGuard::new(&self.session);

        let Some(store) = self.store.as_ref() else {
            guard.disarm();
            self.session().fail(ApiError::NoBackendConfigured.to_string());
            return Err(ApiError::NoBackendConfigured);
        };

        if let Some(backup) = &self.backup {
            backup.store(&document);
        }

        let draft = self.draft_for(&document);
        let result = match &plan {
            SavePlan::Create => store.create(&draft).await,
            SavePlan::Update(id) => store.update(id, &draft).await,
        };
        guard.disarm();

        match result {
            Ok(module) => {
                if plan == SavePlan::Create {
                    info!("Created module {:?}", module.id);
                }
                let navigate_back = self.session().succeed(&module, document);
                let _ = self.events.send(BuilderEvent::Saved(module.clone()));
                if let Some(saved) = &navigate_back {
                    let _ = self.events.send(BuilderEvent::NavigateBack(saved.clone()));
                }
                Ok((SaveOutcome::Persisted(module), navigate_back))
            }
            Err(e) => {
                self.session().fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Module payload for a document, keeping the edited module's metadata
    /// where the document does not provide its own
    fn draft_for(&self, document: &Value) -> ModuleDraft {
        let mut draft = ModuleDraft::from_document(document);

        if let Some(template) = &self.template {
            if document.get("title").and_then(Value::as_str).is_none() {
                draft.name = template.name.clone();
            }
            if document.get("description").and_then(Value::as_str).is_none() {
                draft.description = template.description.clone();
            }
            draft.status = template.status.clone();
        }

        draft.with_created_at(self.session().created_at())
    }

    /// Register the keyboard shortcut listener, replacing any previous one
    pub fn register_shortcuts(&self, listener: ShortcutListener) {
        let previous = self
            .shortcuts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(listener);
        if let Some(previous) = previous {
            previous.deregister();
        }
    }

    pub fn has_shortcuts(&self) -> bool {
        self.shortcuts
            .lock()
            .map(|s| s.as_ref().is_some_and(ShortcutListener::is_active))
            .unwrap_or(false)
    }

    /// Stop listening for shortcuts and refuse every later save
    pub fn teardown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let listener = self
            .shortcuts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(listener) = listener {
            listener.deregister();
        }
        self.designer.close();
        debug!("Builder torn down");
    }

    /// Serve save requests and shortcut commands until a manual save
    /// completes or the user quits. Saves still in flight when the user
    /// quits are awaited, never cancelled. The adapter is torn down on exit.
    pub async fn run(
        &self,
        mut requests: mpsc::UnboundedReceiver<SaveRequest>,
        mut shortcuts: mpsc::UnboundedReceiver<ShortcutCommand>,
    ) -> BuilderExit {
        let mut pending = FuturesUnordered::new();
        let mut shortcuts_open = true;

        let exit = loop {
            tokio::select! {
                Some(request) = requests.recv() => pending.push(self.handle(request)),
                Some(navigate_back) = pending.next(), if !pending.is_empty() => {
                    if let Some(module) = navigate_back {
                        break BuilderExit::Saved(module);
                    }
                }
                command = shortcuts.recv(), if shortcuts_open => match command {
                    Some(ShortcutCommand::Save) => {
                        // Outcome reaches the host through the session status
                        let _ = self.designer.trigger_save();
                    }
                    Some(ShortcutCommand::Quit) => break BuilderExit::Cancelled,
                    None => shortcuts_open = false,
                },
                else => break BuilderExit::Cancelled,
            }
        };

        while pending.next().await.is_some() {}
        self.teardown();
        exit
    }
}

/// Releases the session's in-flight guard if a save is abandoned midway
struct InFlightGuard<'a> {
    session: &'a Mutex<SaveSession>,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(session: &'a Mutex<SaveSession>) -> Self {
        Self { session, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Save interrupted before completion, releasing in-flight guard");
            self.session
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .release();
        }
    }
}
