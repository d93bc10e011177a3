//! Sweep - 期限切れバッチの一括停止
//!
//! 内部タイマーはありません。外部の定期実行から呼ばれる想定です。

use tracing::{info, warn};

use crate::app::builder::Batchy;
use crate::app::process_control::KillOutcome;
use crate::domain::{BatchId, BatchyError};

impl Batchy {
    /// SIGTERM every expired batch. Returns what happened to each.
    pub async fn clean_expired(&self) -> Result<Vec<(BatchId, KillOutcome)>, BatchyError> {
        let expired = self.expired().await?;
        info!(count = expired.len(), "terminating expired batches");
        Ok(expired
            .iter()
            .map(|batch| (batch.id, self.kill(batch)))
            .collect())
    }

    /// SIGKILL every expired batch.
    ///
    /// Disabled unless `allow_mass_sigkill` is set: a batch opened inside the
    /// host application shares its pid, so this can kill the application.
    /// When disabled, nothing is queried or sent and the result is empty.
    pub async fn clean_expired_force(
        &self,
    ) -> Result<Vec<(BatchId, KillOutcome)>, BatchyError> {
        if !self.config.settings.allow_mass_sigkill {
            warn!(
                "mass SIGKILL is not allowed; use clean_expired for SIGTERM \
                 or enable allow_mass_sigkill"
            );
            return Ok(Vec::new());
        }

        let expired = self.expired().await?;
        warn!(count = expired.len(), "killing expired batches");
        Ok(expired
            .iter()
            .map(|batch| (batch.id, self.kill_force(batch)))
            .collect())
    }
}
