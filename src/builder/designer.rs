//! Host-side model of the form designer
//!
//! The designer owns the survey document being edited. Changing the
//! document starts the debounce window; once it passes quietly an autosave
//! request is emitted. Manual saves are emitted immediately. Every request
//! carries a sequence number and a [`SaveAck`](super::ack::SaveAck).

use super::ack::{SaveReceipt, SaveRequest};
use super::debounce::Debouncer;
use super::session::SaveTrigger;
use log::{debug, warn};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct Designer {
    inner: Arc<DesignerInner>,
}

struct DesignerInner {
    document: Mutex<Value>,
    sequence: AtomicU64,
    changes: mpsc::UnboundedSender<()>,
    requests: mpsc::UnboundedSender<SaveRequest>,
    autosave_task: Mutex<Option<JoinHandle<()>>>,
}

impl Designer {
    /// Start a designer seeded with `initial` and its autosave task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(initial: Value, debounce: Duration) -> (Designer, mpsc::UnboundedReceiver<SaveRequest>) {
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();

        let designer = Designer {
            inner: Arc::new(DesignerInner {
                document: Mutex::new(initial),
                sequence: AtomicU64::new(0),
                changes: changes_tx,
                requests: requests_tx,
                autosave_task: Mutex::new(None),
            }),
        };

        let task = tokio::spawn(autosave_loop(
            Arc::downgrade(&designer.inner),
            Debouncer::new(debounce),
            changes_rx,
        ));
        *lock(&designer.inner.autosave_task) = Some(task);

        (designer, requests_rx)
    }

    /// Current document
    pub fn document(&self) -> Value {
        lock(&self.inner.document).clone()
    }

    /// Current document as pretty-printed JSON text
    pub fn text(&self) -> String {
        serde_json::to_string_pretty(&self.document()).unwrap_or_default()
    }

    /// Replace the document. Returns whether it actually changed; only a
    /// change restarts the autosave window.
    pub fn set_document(&self, document: Value) -> bool {
        {
            let mut current = lock(&self.inner.document);
            if *current == document {
                return false;
            }
            *current = document;
        }

        // Autosave task gone means the designer was closed
        let _ = self.inner.changes.send(());
        true
    }

    /// Replace the document from JSON text
    pub fn set_text(&self, text: &str) -> Result<bool, serde_json::Error> {
        let document = serde_json::from_str(text)?;
        Ok(self.set_document(document))
    }

    /// Emit a save request right away
    pub fn request_save(&self, trigger: SaveTrigger) -> SaveReceipt {
        let sequence = self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let (request, receipt) = SaveRequest::new(sequence, trigger);
        debug!("Designer raised save request #{} ({:?})", sequence, trigger);

        if let Err(mpsc::error::SendError(request)) = self.inner.requests.send(request) {
            request.ack.failure("builder is closed");
        }
        receipt
    }

    /// The manual "save now" operation
    pub fn trigger_save(&self) -> SaveReceipt {
        self.request_save(SaveTrigger::Manual)
    }

    /// Stop emitting autosave requests
    pub fn close(&self) {
        if let Some(task) = lock(&self.inner.autosave_task).take() {
            task.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn autosave_loop(
    designer: Weak<DesignerInner>,
    debouncer: Debouncer,
    mut changes: mpsc::UnboundedReceiver<()>,
) {
    while debouncer.settle(&mut changes).await {
        let Some(inner) = designer.upgrade() else {
            break;
        };

        let receipt = Designer { inner }.request_save(SaveTrigger::Autosave);
        tokio::spawn(async move {
            if let Err(e) = receipt.outcome().await {
                warn!("Autosave failed: {}", e);
            }
        });
    }
    debug!("Autosave loop stopped");
}
