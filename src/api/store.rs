//! Persistence seam for survey modules

use super::error::{ApiError, ApiResult};
use super::models::{Module, ModuleDraft};
use async_trait::async_trait;
use log::warn;

/// CRUD access to the `modules` collection
///
/// Implemented over HTTP by [`ModulesClient`](super::ModulesClient) and in
/// process by [`MemoryStore`](super::MemoryStore).
#[async_trait]
pub trait ModuleStore: Send + Sync {
    /// Fetch the whole collection
    async fn list(&self) -> ApiResult<Vec<Module>>;

    /// Fetch one module, failing with `NotFound` if it is absent
    async fn get(&self, id: &str) -> ApiResult<Module>;

    /// Persist a new module; the backend assigns the id
    async fn create(&self, draft: &ModuleDraft) -> ApiResult<Module>;

    /// Replace an existing module, failing with `NotFound` if it is absent
    async fn update_existing(&self, id: &str, draft: &ModuleDraft) -> ApiResult<Module>;

    async fn remove(&self, id: &str) -> ApiResult<()>;

    /// Update a module, creating it again when the backend no longer knows
    /// the id. The returned module carries whichever id the backend holds
    /// afterwards, so callers must adopt it.
    async fn update(&self, id: &str, draft: &ModuleDraft) -> ApiResult<Module> {
        match self.update_existing(id, draft).await {
            Err(ApiError::NotFound { .. }) => {
                warn!("Module {} no longer exists on the backend, re-creating it", id);
                self.create(draft).await
            }
            other => other,
        }
    }

    /// Alias of [`create`](Self::create) kept for older callers
    async fn create_survey(&self, draft: &ModuleDraft) -> ApiResult<Module> {
        self.create(draft).await
    }

    /// Alias of [`update`](Self::update) kept for older callers
    async fn update_survey(&self, id: &str, draft: &ModuleDraft) -> ApiResult<Module> {
        self.update(id, draft).await
    }
}
