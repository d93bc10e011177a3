//! Runner - バッチ実行のエントリーポイント
//!
//! create → start →（ignored ならここで終わり）→ 親リンク → body →
//! finish の順に進みます。body の失敗はバッチに記録されて、
//! `raise_errors` のときだけ呼び出し元に返ります。

use tracing::debug;

use crate::app::builder::Batchy;
use crate::app::context::{self, CurrentBatch};
use crate::domain::{Batch, BatchFailure, BatchId, BatchOptions, BatchyError};
use crate::ports::ProcessIdentity;

/// Restores the process title on drop.
struct TitleGuard<'a> {
    identity: &'a dyn ProcessIdentity,
    previous: String,
}

impl<'a> TitleGuard<'a> {
    fn set(identity: &'a dyn ProcessIdentity, title: &str) -> Self {
        let previous = identity.title();
        identity.set_title(title);
        Self { identity, previous }
    }
}

impl Drop for TitleGuard<'_> {
    fn drop(&mut self) {
        self.identity.set_title(&self.previous);
    }
}

impl Batchy {
    /// Track one execution of `work` as a batch.
    ///
    /// Returns the batch in its final state. An ignored batch comes back
    /// without `work` ever being called.
    ///
    /// # Errors
    /// - `Validation` before anything is persisted
    /// - `Store` when the backend fails; a failed save before the body skips
    ///   the body but still finishes the batch as `errored`
    /// - `Callback` when a callback fails; the batch is already persisted
    ///   in its terminal state at that point
    /// - `Work` when `work` failed and `raise_errors` is set
    pub async fn run<F>(&self, options: BatchOptions, work: F) -> Result<Batch, BatchyError>
    where
        F: AsyncFnOnce(&mut Batch) -> Result<(), BatchFailure>,
    {
        options.validate().map_err(BatchyError::Validation)?;

        let mut batch = self.store.create(options).await?;
        self.start(&mut batch).await?;
        if batch.is_ignored() {
            return Ok(batch);
        }

        let frame = CurrentBatch::nested(&batch);
        batch.parent_id = frame.parent_id;

        let settings = &self.config.settings;
        let _title = settings.name_process.then(|| {
            TitleGuard::set(&*self.identity, &settings.process_title(&batch.name))
        });

        debug!(batch = %batch.id, depth = frame.depth, "entering batch body");

        // finish はまだこのバッチが current のうちに呼ぶ（コールバックから見える）
        let (store_error, failure, finished) = context::enter(frame, async {
            let saved = self.store.save(&batch).await;
            let (store_error, failure) = match saved {
                Ok(()) => (None, work(&mut batch).await.err()),
                Err(err) => {
                    let failure = BatchFailure::from(&err);
                    (Some(err), Some(failure))
                }
            };
            if let Some(failure) = &failure {
                batch.set_error(failure.clone());
            }
            let finished = self.finish(&mut batch).await;
            (store_error, failure, finished)
        })
        .await;

        finished?;
        if let Some(err) = store_error {
            return Err(err.into());
        }

        match failure {
            Some(failure) if settings.raise_errors && !failure.is_blank() => {
            Err(BatchyError::Work(failure))
        }
            _ => Ok(batch),
        }
    }

    pub async fn find(&self, id: BatchId) -> Result<Batch, BatchyError> {
        self.store.find(id).await?.ok_or(BatchyError::NotFound(id))
    }

    /// Refresh persisted columns, keeping the batch's callbacks.
    pub async fn reload(&self, batch: &mut Batch) -> Result<(), BatchyError> {
        Ok(self.store.reload(batch).await?)
    }

    pub async fn parent(&self, batch: &Batch) -> Result<Option<Batch>, BatchyError> {
        match batch.parent_id {
            Some(id) => Ok(self.store.find(id).await?),
            None => Ok(None),
        }
    }

    pub async fn children(&self, batch: &Batch) -> Result<Vec<Batch>, BatchyError> {
        Ok(self.store.children(batch.id).await?)
    }
}
