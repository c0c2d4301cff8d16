//! Client side of the survey modules REST backend
//!
//! [`ModuleStore`] is the persistence seam used by the list view and the
//! builder. [`ModulesClient`] implements it over HTTP with retries and
//! structured request logging; [`MemoryStore`] implements it in process.

pub mod client;
pub mod constants;
pub mod error;
pub mod memory;
pub mod models;
pub mod resilience;
pub mod store;

pub use client::ModulesClient;
pub use error::{ApiError, ApiResult};
pub use memory::{MemoryStore, StoreStats};
pub use models::{Module, ModuleDraft, ModuleStatus, is_empty_document};
pub use resilience::{RetryConfig, RetryPolicy};
pub use store::ModuleStore;
