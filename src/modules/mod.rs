//! Listing, deleting and de-duplicating survey modules

pub mod cleanup;
pub mod list;
pub mod notification;
pub mod route;

pub use cleanup::{CleanupPlan, ConfirmedCleanup, DuplicateGroup, has_duplicates};
pub use list::{ListState, ModuleList};
pub use notification::{Notification, NotificationLevel};
pub use route::{BuilderMode, Route};
