//! Errors - batchy のエラー型
//!
//! - Validation / MissingGuid / ForeignHost: 呼び出し側の誤用。即座に返す
//! - Work: body が失敗し、`raise_errors` が有効なときだけ返る
//! - Callback: コールバックが失敗した。バッチは既に終端状態で保存済み

use thiserror::Error;

use super::callbacks::CallbackError;
use super::failure::BatchFailure;
use super::ids::BatchId;

#[derive(Debug, Error)]
pub enum BatchyError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("duplicate checking is undefined for a batch without a guid")]
    MissingGuid,

    #[error("batch {id} belongs to host {batch_host:?}, this is {current_host}")]
    ForeignHost {
        id: BatchId,
        batch_host: Option<String>,
        current_host: String,
    },

    #[error("batch not found: {0}")]
    NotFound(BatchId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("batch body failed: {0}")]
    Work(BatchFailure),

    #[error("callback failed: {0}")]
    Callback(#[source] CallbackError),
}

/// Errors from a `BatchStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("row (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no row for {0}")]
    NotFound(BatchId),
}

impl BatchyError {
    /// The captured body failure, when this error carries one.
    pub fn failure(&self) -> Option<&BatchFailure> {
        match self {
            BatchyError::Work(failure) => Some(failure),
            _ => None,
        }
    }
}
