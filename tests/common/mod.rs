//! Shared fixtures for the integration tests
#![allow(dead_code)]

pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use survey_modules::api::{ApiError, ApiResult, MemoryStore, Module, ModuleDraft, ModuleStore};

/// A fixed point in time, `hour` hours into 2024-05-01
pub fn at(hour: u32) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap())
}

/// A persisted module record
pub fn module(id: &str, name: &str, updated_at: Option<DateTime<Utc>>) -> Module {
    ModuleDraft::new(name, json!({ "title": name }))
        .into_module(Some(id.to_string()), at(0), updated_at)
}

/// Erase the concrete store type the way the views expect it
pub fn shared<S: ModuleStore + 'static>(store: &Arc<S>) -> Arc<dyn ModuleStore> {
    store.clone()
}

/// Memory store whose `list` can be switched to fail
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModuleStore for FlakyStore {
    async fn list(&self) -> ApiResult<Vec<Module>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::RequestFailed {
                status: 503,
                body: "maintenance".to_string(),
            });
        }
        self.inner.list().await
    }

    async fn get(&self, id: &str) -> ApiResult<Module> {
        self.inner.get(id).await
    }

    async fn create(&self, draft: &ModuleDraft) -> ApiResult<Module> {
        self.inner.create(draft).await
    }

    async fn update_existing(&self, id: &str, draft: &ModuleDraft) -> ApiResult<Module> {
        self.inner.update_existing(id, draft).await
    }

    async fn remove(&self, id: &str) -> ApiResult<()> {
        self.inner.remove(id).await
    }
}
