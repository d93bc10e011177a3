//! Detector - 重複・ゾンビ・期限切れの検出
//!
//! ゾンビ = running のまま残っているが、持ち主のプロセスがもういない
//! バッチ。定期的に `clear_zombies` を呼ばないと、そのバッチが以後の
//! 重複チェックを永遠にブロックします。

use tracing::warn;

use crate::app::builder::Batchy;
use crate::domain::{Batch, BatchFailure, BatchId, BatchyError};

impl Batchy {
    /// Is another batch with the same guid running? Always false without a guid.
    pub async fn already_running(&self, batch: &Batch) -> Result<bool, BatchyError> {
        let Some(guid) = batch.guid.as_deref() else {
            return Ok(false);
        };
        let running = self
            .store
            .running_with_guid(guid, None, Some(batch.id))
            .await?;
        Ok(!running.is_empty())
    }

    /// Other running batches sharing `batch`'s guid.
    ///
    /// Errors with `MissingGuid` when the batch has no guid.
    pub async fn duplicate_batches(
        &self,
        batch: &Batch,
        limit_to_current_host: bool,
    ) -> Result<Vec<Batch>, BatchyError> {
        let guid = batch.guid.as_deref().ok_or(BatchyError::MissingGuid)?;
        let hostname = limit_to_current_host.then(|| self.identity.hostname());
        let duplicates = self
            .store
            .running_with_guid(guid, hostname.as_deref(), Some(batch.id))
            .await?;
        Ok(duplicates)
    }

    /// Finish every same-host duplicate whose process is gone as `errored`.
    ///
    /// Returns the ids of the reclaimed batches. Global failure and ensure
    /// callbacks fire for each of them.
    pub async fn clear_zombies(&self, batch: &Batch) -> Result<Vec<BatchId>, BatchyError> {
        let mut reclaimed = Vec::new();

        for mut zombie in self.duplicate_batches(batch, true).await? {
            if zombie.pid.is_some_and(|pid| self.probe.is_alive(pid)) {
                continue;
            }

            warn!(
                batch = %zombie.id,
                name = %zombie.name,
                pid = zombie.pid,
                "owning process has died, reclaiming batch"
            );
            zombie.set_error(BatchFailure::domain("process has died"));
            self.finish(&mut zombie).await?;
            reclaimed.push(zombie.id);
        }

        Ok(reclaimed)
    }

    /// Running batches past their `expire_at`.
    pub async fn expired(&self) -> Result<Vec<Batch>, BatchyError> {
        Ok(self.store.expired(self.clock.now()).await?)
    }
}
