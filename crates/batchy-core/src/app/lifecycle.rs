//! Lifecycle - start / finish の実行
//!
//! 遷移そのものは `domain::state::transition` が決め、ここでは返ってきた
//! Effect を順番に実行するだけです。1 回の遷移の中では時刻は 1 回だけ
//! 読むので、ignored の `started_at` と `finished_at` は必ず一致します。

use tracing::{debug, info, warn};

use crate::app::builder::Batchy;
use crate::domain::{
    Batch, BatchFailure, BatchState, BatchyError, Effect, Event, Transition, callbacks, transition,
};

impl Batchy {
    /// `new` → `running`, or `new` → `ignored` when a forbidden duplicate is
    /// running. Any other starting state is left alone.
    pub async fn start(&self, batch: &mut Batch) -> Result<(), BatchyError> {
        if batch.name.trim().is_empty() {
            return Err(BatchyError::Validation("name must not be empty".to_string()));
        }

        if batch.state != BatchState::New {
            debug!(batch = %batch.id, state = %batch.state, "start ignored: not a new batch");
            return Ok(());
        }

        let invalid_duplication =
            !self.config.settings.allow_duplicates && self.already_running(batch).await?;

        let event = Event::Start { invalid_duplication };
        let Some(next) = transition(batch.state, event) else {
            debug!(batch = %batch.id, state = %batch.state, "start ignored: not a new batch");
            return Ok(());
        };

        if next.to == BatchState::Ignored {
            warn!(
                batch = %batch.id,
                name = %batch.name,
                guid = batch.guid.as_deref().unwrap_or_default(),
                "duplicate batch is running, ignoring"
            );
        } else {
            info!(batch = %batch.id, name = %batch.name, "batch started");
        }

        self.apply(batch, next).await
    }

    /// `running` → `success` / `errored` / `stopped`, depending on the
    /// recorded failure. A no-op for any batch that is not running.
    pub async fn finish(&self, batch: &mut Batch) -> Result<(), BatchyError> {
        let event = Event::Finish {
            failure: batch
                .error()
                .filter(|failure| !failure.is_blank())
                .map(BatchFailure::kind),
        };
        let Some(next) = transition(batch.state, event) else {
            debug!(batch = %batch.id, state = %batch.state, "finish ignored: not running");
            return Ok(());
        };

        info!(
            batch = %batch.id,
            name = %batch.name,
            state = %next.to,
            error = batch.error().map(BatchFailure::text).unwrap_or_default(),
            "batch finished"
        );

        self.apply(batch, next).await
    }

    async fn apply(&self, batch: &mut Batch, next: Transition) -> Result<(), BatchyError> {
        debug!(batch = %batch.id, from = %next.from, to = %next.to, "transition");

        let now = self.clock.now();
        batch.state = next.to;

        for effect in next.effects {
            match effect {
                Effect::StampStart => {
                    batch.stamp_start(self.identity.pid(), self.identity.hostname(), now)
                }
                Effect::StampFinish => batch.stamp_finish(now),
                Effect::Persist => self.store.save(batch).await?,
                Effect::Dispatch(kind) => {
                    callbacks::dispatch(kind, self.config.global_callbacks(), batch)
                        .map_err(BatchyError::Callback)?
                }
            }
        }
        Ok(())
    }
}
