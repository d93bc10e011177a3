//! BatchStore port - バッチレコードの正本（source of truth）
//!
//! リレーショナルストアを想定した抽象化です。1 バッチ = 1 行。
//! コールバックキューは永続化されません（メモリ上のオブジェクトだけが持つ）。
//!
//! # 並行性
//! 重複チェック（`running_with_guid`）と状態の書き込みの間に原子的な
//! ガードはありません。同じ guid のバッチが別プロセスから同時に start
//! すると、両方が「誰も走っていない」と観測して running になり得ます。
//! これは許容された advisory な競合です。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Batch, BatchId, BatchOptions};

pub use crate::domain::StoreError;

#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Persist a new batch in state `new` and return it with its id assigned.
    /// Inline callbacks from `options` are carried over to the returned value.
    async fn create(&self, options: BatchOptions) -> Result<Batch, StoreError>;

    async fn find(&self, id: BatchId) -> Result<Option<Batch>, StoreError>;

    /// Running batches sharing `guid`, optionally only those on `hostname`,
    /// never including `exclude`.
    async fn running_with_guid(
        &self,
        guid: &str,
        hostname: Option<&str>,
        exclude: Option<BatchId>,
    ) -> Result<Vec<Batch>, StoreError>;

    /// Running batches whose `expire_at` is before `now`.
    async fn expired(&self, now: DateTime<Utc>) -> Result<Vec<Batch>, StoreError>;

    /// Batches whose `parent_id` is `id`, in creation order.
    async fn children(&self, id: BatchId) -> Result<Vec<Batch>, StoreError>;

    /// Write every persisted column of `batch`.
    async fn save(&self, batch: &Batch) -> Result<(), StoreError>;

    /// Refresh the persisted columns of `batch`, keeping its callbacks.
    async fn reload(&self, batch: &mut Batch) -> Result<(), StoreError> {
        let fresh = self
            .find(batch.id)
            .await?
            .ok_or(StoreError::NotFound(batch.id))?;
        let callbacks = batch.callbacks().clone();
        *batch = fresh;
        batch.replace_callbacks(callbacks);
        Ok(())
    }
}
