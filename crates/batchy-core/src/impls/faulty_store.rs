//! FaultyStore - 障害を注入できるテスト用ストア
//!
//! InMemoryBatchStore に委譲しつつ、N 回目の save や guid クエリを
//! 失敗させます。呼び出し回数も数えます。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Batch, BatchId, BatchOptions};
use crate::impls::InMemoryBatchStore;
use crate::ports::{BatchStore, StoreError};

#[derive(Default)]
pub(crate) struct FaultyStore {
    pub(crate) inner: InMemoryBatchStore,
    fail_save_at: Option<usize>,
    fail_queries: AtomicBool,
    saves: AtomicUsize,
    queries: AtomicUsize,
}

impl FaultyStore {
    /// Fail the `n`th save (1-based); every other save goes through.
    pub(crate) fn failing_save(n: usize) -> Self {
        Self {
            fail_save_at: Some(n),
            ..Self::default()
        }
    }

    pub(crate) fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchStore for FaultyStore {
    async fn create(&self, options: BatchOptions) -> Result<Batch, StoreError> {
        self.inner.create(options).await
    }

    async fn find(&self, id: BatchId) -> Result<Option<Batch>, StoreError> {
        self.inner.find(id).await
    }

    async fn running_with_guid(
        &self,
        guid: &str,
        hostname: Option<&str>,
        exclude: Option<BatchId>,
    ) -> Result<Vec<Batch>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.running_with_guid(guid, hostname, exclude).await
    }

    async fn expired(&self, now: DateTime<Utc>) -> Result<Vec<Batch>, StoreError> {
        self.inner.expired(now).await
    }

    async fn children(&self, id: BatchId) -> Result<Vec<Batch>, StoreError> {
        self.inner.children(id).await
    }

    async fn save(&self, batch: &Batch) -> Result<(), StoreError> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_save_at == Some(n) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.save(batch).await
    }
}
