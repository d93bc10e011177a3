//! In-memory batch store.
//!
//! Keeps one `BatchRow` per batch in the same column shape a relational
//! table would have, so the error/backtrace split is exercised exactly as it
//! would be against a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{Batch, BatchFailure, BatchId, BatchOptions, BatchState};
use crate::ports::{BatchStore, Clock, IdGenerator, StoreError, SystemClock, UlidGenerator};

/// Persisted shape of a batch (`batchy_batches` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub id: BatchId,
    pub name: String,
    pub guid: Option<String>,
    pub state: BatchState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub backtrace: Option<String>,
    pub pid: Option<u32>,
    pub hostname: Option<String>,
    pub parent_id: Option<BatchId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatchRow {
    fn from_batch(batch: &Batch) -> Result<Self, StoreError> {
        let (error, backtrace) = match batch.error() {
            Some(failure) => {
                let (error, backtrace) = failure.to_columns()?;
                (Some(error), backtrace)
            }
            None => (None, None),
        };
        Ok(Self {
            id: batch.id,
            name: batch.name.clone(),
            guid: batch.guid.clone(),
            state: batch.state,
            started_at: batch.started_at,
            finished_at: batch.finished_at,
            expire_at: batch.expire_at,
            error,
            backtrace,
            pid: batch.pid,
            hostname: batch.hostname.clone(),
            parent_id: batch.parent_id,
            created_at: batch.created_at,
            updated_at: batch.updated_at,
        })
    }

    fn to_batch(&self) -> Result<Batch, StoreError> {
        let mut batch = Batch::from_options(
            self.id,
            BatchOptions {
                name: self.name.clone(),
                guid: self.guid.clone(),
                expire_at: self.expire_at,
                ..BatchOptions::default()
            },
            self.created_at,
        );
        batch.state = self.state;
        batch.started_at = self.started_at;
        batch.finished_at = self.finished_at;
        batch.pid = self.pid;
        batch.hostname = self.hostname.clone();
        batch.parent_id = self.parent_id;
        batch.updated_at = self.updated_at;

        let failure = self
            .error
            .as_deref()
            .map(|error| BatchFailure::from_columns(error, self.backtrace.as_deref()))
            .transpose()?;
        batch.restore_error(failure);
        Ok(batch)
    }
}

struct InMemoryStoreState {
    rows: HashMap<BatchId, BatchRow>,

    /// Creation order, for deterministic query results.
    order: Vec<BatchId>,
}

impl InMemoryStoreState {
    fn rows_in_order(&self) -> impl Iterator<Item = &BatchRow> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }

    fn collect<'a>(
        rows: impl Iterator<Item = &'a BatchRow>,
    ) -> Result<Vec<Batch>, StoreError> {
        rows.map(BatchRow::to_batch).collect()
    }
}

/// In-memory `BatchStore`. Clones share the same rows.
#[derive(Clone)]
pub struct InMemoryBatchStore {
    state: Arc<Mutex<InMemoryStoreState>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let ids: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(Arc::clone(&clock)));
        Self {
            state: Arc::new(Mutex::new(InMemoryStoreState {
                rows: HashMap::new(),
                order: Vec::new(),
            })),
            clock,
            ids,
        }
    }

    /// Raw row access, for inspecting what was actually persisted.
    pub async fn row(&self, id: BatchId) -> Option<BatchRow> {
        self.state.lock().await.rows.get(&id).cloned()
    }

    /// Overwrite columns directly, bypassing the lifecycle (fixtures, repairs).
    pub async fn update_row<F>(&self, id: BatchId, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BatchRow),
    {
        let mut state = self.state.lock().await;
        let row = state.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        f(row);
        Ok(())
    }

    /// Every row, in creation order.
    pub async fn rows(&self) -> Vec<BatchRow> {
        self.state.lock().await.rows_in_order().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryBatchStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchStore for InMemoryBatchStore {
    async fn create(&self, options: BatchOptions) -> Result<Batch, StoreError> {
        let now = self.clock.now();
        let batch = Batch::from_options(self.ids.generate_batch_id(), options, now);
        let row = BatchRow::from_batch(&batch)?;

        let mut state = self.state.lock().await;
        state.order.push(batch.id);
        state.rows.insert(batch.id, row);
        Ok(batch)
    }

    async fn find(&self, id: BatchId) -> Result<Option<Batch>, StoreError> {
        let state = self.state.lock().await;
        state.rows.get(&id).map(BatchRow::to_batch).transpose()
    }

    async fn running_with_guid(
        &self,
        guid: &str,
        hostname: Option<&str>,
        exclude: Option<BatchId>,
    ) -> Result<Vec<Batch>, StoreError> {
        let state = self.state.lock().await;
        let rows = state.rows_in_order().filter(|row| {
            row.state == BatchState::Running
                && row.guid.as_deref() == Some(guid)
                && Some(row.id) != exclude
                && hostname.is_none_or(|h| row.hostname.as_deref() == Some(h))
        });
        InMemoryStoreState::collect(rows)
    }

    async fn expired(&self, now: DateTime<Utc>) -> Result<Vec<Batch>, StoreError> {
        let state = self.state.lock().await;
        let rows = state.rows_in_order().filter(|row| {
            row.state == BatchState::Running && row.expire_at.is_some_and(|at| at < now)
        });
        InMemoryStoreState::collect(rows)
    }

    async fn children(&self, id: BatchId) -> Result<Vec<Batch>, StoreError> {
        let state = self.state.lock().await;
        let rows = state
            .rows_in_order()
            .filter(|row| row.parent_id == Some(id));
        InMemoryStoreState::collect(rows)
    }

    async fn save(&self, batch: &Batch) -> Result<(), StoreError> {
        let mut row = BatchRow::from_batch(batch)?;
        row.updated_at = self.clock.now();

        let mut state = self.state.lock().await;
        if !state.rows.contains_key(&batch.id) {
            return Err(StoreError::NotFound(batch.id));
        }
        state.rows.insert(batch.id, row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Callback;
    use chrono::Duration;

    async fn running(store: &InMemoryBatchStore, options: BatchOptions, host: &str) -> Batch {
        let mut batch = store.create(options).await.unwrap();
        batch.state = BatchState::Running;
        batch.pid = Some(42);
        batch.hostname = Some(host.to_string());
        store.save(&batch).await.unwrap();
        batch
    }

    #[tokio::test]
    async fn create_assigns_id_and_keeps_callbacks() {
        let store = InMemoryBatchStore::new();
        let options = BatchOptions::new("nightly").on_success(Callback::new(|_| Ok(())));
        let batch = store.create(options).await.unwrap();

        assert_eq!(batch.state, BatchState::New);
        assert_eq!(batch.callbacks().len(crate::domain::CallbackKind::Success), 1);

        let found = store.find(batch.id).await.unwrap().unwrap();
        assert_eq!(found.name, "nightly");
        assert!(found.callbacks().is_empty());
    }

    #[tokio::test]
    async fn running_with_guid_filters_state_host_and_self() {
        let store = InMemoryBatchStore::new();
        let a = running(&store, BatchOptions::new("a").guid("same"), "here").await;
        let b = running(&store, BatchOptions::new("b").guid("same"), "there").await;
        let _other_guid = running(&store, BatchOptions::new("c").guid("other"), "here").await;
        let _not_running = store.create(BatchOptions::new("d").guid("same")).await.unwrap();

        let all = store.running_with_guid("same", None, None).await.unwrap();
        assert_eq!(all.iter().map(|x| x.id).collect::<Vec<_>>(), vec![a.id, b.id]);

        let local = store.running_with_guid("same", Some("here"), None).await.unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].id, a.id);

        let without_a = store.running_with_guid("same", None, Some(a.id)).await.unwrap();
        assert_eq!(without_a.len(), 1);
        assert_eq!(without_a[0].id, b.id);
    }

    #[tokio::test]
    async fn expired_only_returns_running_past_expiry() {
        let store = InMemoryBatchStore::new();
        let now = Utc::now();
        let _normal = running(
            &store,
            BatchOptions::new("normal").expire_at(now + Duration::days(1)),
            "here",
        )
        .await;
        let expired = running(
            &store,
            BatchOptions::new("expired").expire_at(now - Duration::days(1)),
            "here",
        )
        .await;
        let _not_started = store
            .create(BatchOptions::new("stopped").expire_at(now - Duration::days(1)))
            .await
            .unwrap();

        let found = store.expired(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, expired.id);
    }

    #[tokio::test]
    async fn error_and_backtrace_are_separate_columns() {
        let store = InMemoryBatchStore::new();
        let mut batch = store.create(BatchOptions::new("serialize")).await.unwrap();
        let trace = vec!["a.rs:1".to_string(), "b.rs:2".to_string()];
        batch.set_error(BatchFailure::message("stick up").with_trace(trace.clone()));
        store.save(&batch).await.unwrap();

        let row = store.row(batch.id).await.unwrap();
        assert!(row.error.as_deref().unwrap().contains("stick up"));
        assert!(!row.error.as_deref().unwrap().contains("a.rs:1"));
        assert!(row.backtrace.as_deref().unwrap().contains("a.rs:1"));

        let found = store.find(batch.id).await.unwrap().unwrap();
        assert_eq!(found.error().unwrap().trace(), Some(trace.as_slice()));
    }

    #[tokio::test]
    async fn reload_refreshes_columns_but_keeps_callbacks() {
        let store = InMemoryBatchStore::new();
        let mut batch = store
            .create(BatchOptions::new("job").on_ensure(Callback::new(|_| Ok(()))))
            .await
            .unwrap();
        store
            .update_row(batch.id, |row| row.state = BatchState::Errored)
            .await
            .unwrap();

        store.reload(&mut batch).await.unwrap();
        assert_eq!(batch.state, BatchState::Errored);
        assert_eq!(batch.callbacks().len(crate::domain::CallbackKind::Ensure), 1);
    }

    #[tokio::test]
    async fn children_come_back_in_creation_order() {
        let store = InMemoryBatchStore::new();
        let parent = store.create(BatchOptions::new("parent")).await.unwrap();
        for name in ["child-1", "child-2"] {
            let mut child = store.create(BatchOptions::new(name)).await.unwrap();
            child.parent_id = Some(parent.id);
            store.save(&child).await.unwrap();
        }

        let children = store.children(parent.id).await.unwrap();
        let names: Vec<_> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["child-1", "child-2"]);
    }

    #[tokio::test]
    async fn save_of_unknown_batch_fails() {
        let store = InMemoryBatchStore::new();
        let other = InMemoryBatchStore::new();
        let batch = other.create(BatchOptions::new("elsewhere")).await.unwrap();
        assert!(matches!(
            store.save(&batch).await,
            Err(StoreError::NotFound(id)) if id == batch.id
        ));
    }
}
