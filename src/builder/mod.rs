//! The survey builder: designer surface, save reconciliation and autosave
//!
//! A [`Designer`] holds the document and raises save requests (debounced
//! autosaves and manual saves). A [`BuilderAdapter`] answers them through a
//! [`SaveSession`], creating the module on its first save and updating it on
//! every save after that.

pub mod ack;
pub mod adapter;
pub mod backup;
pub mod debounce;
pub mod designer;
pub mod document_file;
pub mod session;
pub mod shortcuts;

pub use ack::{AckResult, SaveAck, SaveReceipt, SaveRequest};
pub use adapter::{BuilderAdapter, BuilderEvent, BuilderExit, SaveOutcome};
pub use backup::DocumentBackup;
pub use debounce::Debouncer;
pub use designer::Designer;
pub use document_file::{DocumentFile, DocumentFileError};
pub use session::{SaveDecision, SavePlan, SaveSession, SaveStatus, SaveTrigger, SessionPhase, StatusWindows};
pub use shortcuts::{ShortcutCommand, ShortcutListener, parse_shortcut};
