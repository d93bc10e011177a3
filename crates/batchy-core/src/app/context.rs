//! Context - 実行中バッチの追跡
//!
//! 「現在のバッチ」はタスクローカルなスロットに置かれます。`enter` は
//! future をスコープで包むので、body が成功しても失敗しても、panic や
//! キャンセルで drop されても、抜けた時点で一つ外側のフレームに戻ります。

use std::future::Future;

use crate::domain::{Batch, BatchId};

tokio::task_local! {
    static CURRENT: CurrentBatch;
}

/// Frame for the innermost running batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentBatch {
    pub id: BatchId,
    pub name: String,
    pub parent_id: Option<BatchId>,

    /// 0 for a root batch.
    pub depth: usize,
}

impl CurrentBatch {
    /// Frame for `batch`, nested under whatever is current right now.
    pub fn nested(batch: &Batch) -> Self {
        let outer = current();
        Self {
            id: batch.id,
            name: batch.name.clone(),
            parent_id: outer.as_ref().map(|frame| frame.id),
            depth: outer.map_or(0, |frame| frame.depth + 1),
        }
    }
}

/// The innermost batch executing on this task, if any.
pub fn current() -> Option<CurrentBatch> {
    CURRENT.try_with(Clone::clone).ok()
}

pub fn current_id() -> Option<BatchId> {
    CURRENT.try_with(|frame| frame.id).ok()
}

/// Run `fut` with `frame` as the current batch.
pub async fn enter<F>(frame: CurrentBatch, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(frame, fut).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BatchOptions;
    use ulid::Ulid;

    fn batch(name: &str) -> Batch {
        Batch::from_options(
            BatchId::from_ulid(Ulid::new()),
            BatchOptions::new(name),
            chrono::Utc::now(),
        )
    }

    #[tokio::test]
    async fn nothing_is_current_outside_a_batch() {
        assert!(current().is_none());
        assert!(current_id().is_none());
    }

    #[tokio::test]
    async fn nested_frames_link_to_their_parent_and_unwind() {
        let outer = batch("outer");
        let inner = batch("inner");

        enter(CurrentBatch::nested(&outer), async {
            assert_eq!(current_id(), Some(outer.id));

            let frame = CurrentBatch::nested(&inner);
            assert_eq!(frame.parent_id, Some(outer.id));
            assert_eq!(frame.depth, 1);

            enter(frame, async {
                assert_eq!(current_id(), Some(inner.id));
            })
            .await;

            assert_eq!(current_id(), Some(outer.id));
        })
        .await;

        assert!(current().is_none());
    }

    #[tokio::test]
    async fn previous_frame_is_restored_when_the_body_fails() {
        let outer = batch("outer");
        let inner = batch("inner");

        let result: Result<(), String> = enter(CurrentBatch::nested(&outer), async {
            let inner_result: Result<(), String> = enter(CurrentBatch::nested(&inner), async {
                Err("boom".to_string())
            })
            .await;
            assert!(inner_result.is_err());
            assert_eq!(current_id(), Some(outer.id));
            inner_result
        })
        .await;

        assert!(result.is_err());
        assert!(current().is_none());
    }

    #[tokio::test]
    async fn root_frame_has_no_parent() {
        let root = CurrentBatch::nested(&batch("root"));
        assert_eq!(root.parent_id, None);
        assert_eq!(root.depth, 0);
    }
}
