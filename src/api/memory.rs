//! In-process module store
//!
//! Mirrors the backend contract (server-assigned ids, timestamps, `NotFound`)
//! and records call statistics, which makes it the backend double for tests.

use super::error::{ApiError, ApiResult};
use super::models::{Module, ModuleDraft};
use super::store::ModuleStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Snapshot of the calls a [`MemoryStore`] has served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub lists: usize,
    pub gets: usize,
    pub creates: usize,
    pub updates: usize,
    pub removes: usize,
    /// Highest number of calls that were in progress at the same time
    pub max_in_flight: usize,
}

impl StoreStats {
    /// Create and update calls combined
    pub fn writes(&self) -> usize {
        self.creates + self.updates
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Module>>,
    next_id: AtomicU64,
    latency: Option<Duration>,
    failing_removals: Mutex<HashSet<String>>,
    lists: AtomicUsize,
    gets: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    removes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Delay every call by `latency`, keeping it outstanding meanwhile
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Insert records as they are, ids included
    pub fn with_modules(self, modules: Vec<Module>) -> Self {
        if let Ok(mut records) = self.records.lock() {
            records.extend(modules);
        }
        self
    }

    /// Make removal of `id` fail with a server error
    pub fn fail_removal_of(&self, id: impl Into<String>) {
        if let Ok(mut failing) = self.failing_removals.lock() {
            failing.insert(id.into());
        }
    }

    /// Drop a record without counting it as a call, as another client would
    pub fn forget(&self, id: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.retain(|m| m.id.as_deref() != Some(id));
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.snapshot().iter().any(|m| m.id.as_deref() == Some(id))
    }

    pub fn snapshot(&self) -> Vec<Module> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            lists: self.lists.load(Ordering::SeqCst),
            gets: self.gets.load(Ordering::SeqCst),
            creates: self.creates.load(Ordering::SeqCst),
            updates: self.updates.load(Ordering::SeqCst),
            removes: self.removes.load(Ordering::SeqCst),
            max_in_flight: self.max_in_flight.load(Ordering::SeqCst),
        }
    }

    async fn enter(&self, counter: &AtomicUsize) -> InFlight<'_> {
        counter.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let guard = InFlight { counter: &self.in_flight };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        guard
    }

    fn records(&self) -> std::sync::MutexGuard<'_, Vec<Module>> {
        // A poisoned lock only means a test panicked mid-call
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModuleStore for MemoryStore {
    async fn list(&self) -> ApiResult<Vec<Module>> {
        let _call = self.enter(&self.lists).await;
        Ok(self.records().clone())
    }

    async fn get(&self, id: &str) -> ApiResult<Module> {
        let _call = self.enter(&self.gets).await;
        self.records()
            .iter()
            .find(|m| m.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| ApiError::NotFound { id: id.to_string() })
    }

    async fn create(&self, draft: &ModuleDraft) -> ApiResult<Module> {
        let _call = self.enter(&self.creates).await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let now = Utc::now();
        let module = draft.clone().into_module(Some(id), Some(now), Some(now));
        self.records().push(module.clone());
        Ok(module)
    }

    async fn update_existing(&self, id: &str, draft: &ModuleDraft) -> ApiResult<Module> {
        let _call = self.enter(&self.updates).await;
        let mut records = self.records();
        let slot = records
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(id))
            .ok_or_else(|| ApiError::NotFound { id: id.to_string() })?;

        // Full replacement, like a PUT: whatever the draft omits is gone
        let updated = draft
            .clone()
            .into_module(Some(id.to_string()), draft.created_at, Some(Utc::now()));
        *slot = updated.clone();
        Ok(updated)
    }

    async fn remove(&self, id: &str) -> ApiResult<()> {
        let _call = self.enter(&self.removes).await;
        let failing = self
            .failing_removals
            .lock()
            .map(|f| f.contains(id))
            .unwrap_or(false);
        if failing {
            return Err(ApiError::RequestFailed {
                status: 500,
                body: format!("cannot delete {}", id),
            });
        }

        let mut records = self.records();
        let before = records.len();
        records.retain(|m| m.id.as_deref() != Some(id));
        if records.len() == before {
            return Err(ApiError::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let created = store.create(&ModuleDraft::new("A", json!({ "title": "A" }))).await.unwrap();

        assert_eq!(created.id.as_deref(), Some("1"));
        assert!(created.created_at.is_some());
        assert_eq!(created.created_at, created.updated_at);
        assert!(store.contains("1"));
    }

    #[tokio::test]
    async fn test_update_existing_replaces_the_record() {
        let store = MemoryStore::new();
        let created = store.create(&ModuleDraft::new("A", json!({ "v": 1 }))).await.unwrap();
        let id = created.id.clone().unwrap();

        let draft = ModuleDraft::from(&created).with_description("second pass");
        let updated = store
            .update_existing(&id, &ModuleDraft { survey_json: json!({ "v": 2 }), ..draft })
            .await
            .unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.survey_json, json!({ "v": 2 }));
        assert_eq!(store.stats().updates, 1);

        // A draft that does not carry the creation time drops it
        let bare = store.update_existing(&id, &ModuleDraft::new("A", json!({ "v": 3 }))).await.unwrap();
        assert!(bare.created_at.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_falls_back_to_create_when_missing() {
        let store = MemoryStore::new();
        let created = store.create(&ModuleDraft::new("A", json!({ "v": 1 }))).await.unwrap();
        let old_id = created.id.unwrap();
        store.forget(&old_id);

        let recreated = store.update(&old_id, &ModuleDraft::new("A", json!({ "v": 2 }))).await.unwrap();
        assert_ne!(recreated.id.as_deref(), Some(old_id.as_str()));
        assert_eq!(store.stats().creates, 2);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_aliases_delegate() {
        let store = MemoryStore::new();
        let created = store.create_survey(&ModuleDraft::new("A", json!({ "v": 1 }))).await.unwrap();
        let id = created.id.unwrap();
        let updated = store.update_survey(&id, &ModuleDraft::new("B", json!({ "v": 1 }))).await.unwrap();

        assert_eq!(updated.name.as_deref(), Some("B"));
        assert_eq!(store.stats().creates, 1);
        assert_eq!(store.stats().updates, 1);
    }
}
