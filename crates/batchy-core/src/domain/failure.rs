//! Captured failure of a batch body.
//!
//! A failure is stored in two columns: `error` holds the message and kind,
//! `backtrace` holds the trace frames. Reading the batch back joins them
//! again, so the trace is always reachable through the failure itself.

use std::backtrace::Backtrace;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Anything raised by the body.
    Generic,

    /// Raised by batchy itself (e.g. a reclaimed zombie).
    Domain,

    /// Intentional halt, not a malfunction.
    Stopped,
}

/// Failure recorded on a batch.
///
/// Does not implement `std::error::Error` so that any error converts into it
/// with `?` inside a work body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    message: String,
    trace: Option<Vec<String>>,
    kind: FailureKind,
}

impl BatchFailure {
    /// Plain message, no trace.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: None,
            kind: FailureKind::Generic,
        }
    }

    /// Intentional halt. Drives the batch to `stopped`.
    pub fn stopped(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: Some(snapshot_trace()),
            kind: FailureKind::Stopped,
        }
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: None,
            kind: FailureKind::Domain,
        }
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn text(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> Option<&[String]> {
        self.trace.as_deref()
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn is_stopped(&self) -> bool {
        self.kind == FailureKind::Stopped
    }

    /// A non-stop failure with an empty message does not count as an error.
    pub fn is_blank(&self) -> bool {
        !self.is_stopped() && self.message.trim().is_empty()
    }

    /// Split into the `error` and `backtrace` column values.
    pub fn to_columns(&self) -> Result<(String, Option<String>), StoreError> {
        let error = serde_json::to_string(&ErrorColumn {
            message: &self.message,
            kind: self.kind,
        })?;
        let backtrace = self
            .trace
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        Ok((error, backtrace))
    }

    /// Rebuild from the `error` and `backtrace` columns.
    ///
    /// An `error` column that is not JSON is read as a plain message, which
    /// keeps rows written by hand (or by older writers) readable.
    pub fn from_columns(error: &str, backtrace: Option<&str>) -> Result<Self, StoreError> {
        let (message, kind) = match serde_json::from_str::<OwnedErrorColumn>(error) {
            Ok(column) => (column.message, column.kind),
            Err(_) => (error.to_string(), FailureKind::Generic),
        };
        let trace = backtrace.map(serde_json::from_str).transpose()?;
        Ok(Self {
            message,
            trace,
            kind,
        })
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Any error becomes a generic failure; the trace is taken right here.
impl<E> From<E> for BatchFailure
where
    E: std::error::Error,
{
    fn from(err: E) -> Self {
        Self {
            message: err.to_string(),
            trace: Some(snapshot_trace()),
            kind: FailureKind::Generic,
        }
    }
}

#[derive(Serialize)]
struct ErrorColumn<'a> {
    message: &'a str,
    kind: FailureKind,
}

#[derive(Deserialize)]
struct OwnedErrorColumn {
    message: String,
    kind: FailureKind,
}

fn snapshot_trace() -> Vec<String> {
    Backtrace::force_capture()
        .to_string()
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
