//! Batch record and the options it is created from.

use chrono::{DateTime, Utc};

use super::callbacks::{Callback, CallbackKind, CallbackQueues};
use super::failure::BatchFailure;
use super::ids::BatchId;
use super::state::BatchState;

/// What a caller asks for when creating a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub name: String,

    /// Identity used for duplicate detection. `None` is never a duplicate.
    pub guid: Option<String>,

    /// After this instant a still-running batch counts as stuck.
    pub expire_at: Option<DateTime<Utc>>,

    /// Inline callback bindings, copied onto the batch.
    pub callbacks: CallbackQueues,
}

impl BatchOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn expire_at(mut self, at: DateTime<Utc>) -> Self {
        self.expire_at = Some(at);
        self
    }

    pub fn on_success(mut self, callback: impl Into<Callback>) -> Self {
        self.callbacks.push(CallbackKind::Success, callback);
        self
    }

    pub fn on_failure(mut self, callback: impl Into<Callback>) -> Self {
        self.callbacks.push(CallbackKind::Failure, callback);
        self
    }

    pub fn on_ignore(mut self, callback: impl Into<Callback>) -> Self {
        self.callbacks.push(CallbackKind::Ignore, callback);
        self
    }

    pub fn on_ensure(mut self, callback: impl Into<Callback>) -> Self {
        self.callbacks.push(CallbackKind::Ensure, callback);
        self
    }

    /// Rejects what a store would refuse to persist.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.guid.as_deref().is_some_and(|g| g.is_empty()) {
            return Err("guid must be absent or non-empty".to_string());
        }
        Ok(())
    }
}

/// One execution attempt of a named job.
///
/// State changes go through `app::lifecycle`; the fields here are the
/// persisted columns plus the transient callback queues, which are never
/// written to the store.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    pub guid: Option<String>,
    pub state: BatchState,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,

    /// Owning process; set once, when the batch leaves `New`.
    pub pid: Option<u32>,
    pub hostname: Option<String>,

    pub parent_id: Option<BatchId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    error: Option<BatchFailure>,
    callbacks: CallbackQueues,
}

impl Batch {
    pub fn from_options(id: BatchId, options: BatchOptions, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: options.name,
            guid: options.guid,
            state: BatchState::New,
            started_at: None,
            finished_at: None,
            expire_at: options.expire_at,
            pid: None,
            hostname: None,
            parent_id: None,
            created_at: now,
            updated_at: now,
            error: None,
            callbacks: options.callbacks,
        }
    }

    pub fn error(&self) -> Option<&BatchFailure> {
        self.error.as_ref()
    }

    /// Record a failure. The failure already carries the trace taken when it
    /// was created, so nothing is lost when the record is reloaded later.
    pub fn set_error(&mut self, failure: impl Into<BatchFailure>) {
        self.error = Some(failure.into());
    }

    pub(crate) fn restore_error(&mut self, failure: Option<BatchFailure>) {
        self.error = failure;
    }

    pub fn has_errors(&self) -> bool {
        self.error.as_ref().is_some_and(|failure| !failure.is_blank())
    }

    pub fn callbacks(&self) -> &CallbackQueues {
        &self.callbacks
    }

    pub(crate) fn replace_callbacks(&mut self, callbacks: CallbackQueues) {
        self.callbacks = callbacks;
    }

    pub fn on_success(&mut self, callback: impl Into<Callback>) {
        self.callbacks.push(CallbackKind::Success, callback);
    }

    pub fn on_failure(&mut self, callback: impl Into<Callback>) {
        self.callbacks.push(CallbackKind::Failure, callback);
    }

    pub fn on_ignore(&mut self, callback: impl Into<Callback>) {
        self.callbacks.push(CallbackKind::Ignore, callback);
    }

    pub fn on_ensure(&mut self, callback: impl Into<Callback>) {
        self.callbacks.push(CallbackKind::Ensure, callback);
    }

    pub fn is_running(&self) -> bool {
        self.state == BatchState::Running
    }

    pub fn is_ignored(&self) -> bool {
        self.state == BatchState::Ignored
    }

    /// Terminal, but not a success.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, BatchState::Errored | BatchState::Stopped)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.is_some_and(|at| at < now)
    }

    /// Stamp process identity and start time. First call wins.
    pub(crate) fn stamp_start(&mut self, pid: u32, hostname: String, now: DateTime<Utc>) {
        if self.started_at.is_some() {
            return;
        }
        self.pid = Some(pid);
        self.hostname = Some(hostname);
        self.started_at = Some(now);
    }

    /// Stamp the finish time. First call wins.
    pub(crate) fn stamp_finish(&mut self, now: DateTime<Utc>) {
        if self.finished_at.is_none() {
            self.finished_at = Some(now);
        }
    }
}
