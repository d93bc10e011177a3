//! Lifecycle callbacks.
//!
//! Four independent queues per batch (and four more process-wide, held by
//! `Config`). Dispatch runs global callbacks first, then batch-local ones,
//! each in registration order. Errors are not caught here: the first failing
//! callback stops the dispatch and its error is handed back to the caller.

use std::fmt;
use std::sync::Arc;

use super::batch::Batch;

/// Error raised from inside a callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

type CallbackFn = dyn Fn(&Batch) -> Result<(), CallbackError> + Send + Sync;

/// A registered callback. Cheap to clone.
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Batch) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, batch: &Batch) -> Result<(), CallbackError> {
        (self.0)(batch)
    }
}

impl<F> From<F> for Callback
where
    F: Fn(&Batch) -> Result<(), CallbackError> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    Success,
    Failure,
    Ignore,
    Ensure,
}

/// One ordered list per callback kind.
#[derive(Debug, Clone, Default)]
pub struct CallbackQueues {
    success: Vec<Callback>,
    failure: Vec<Callback>,
    ignore: Vec<Callback>,
    ensure: Vec<Callback>,
}

impl CallbackQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: CallbackKind, callback: impl Into<Callback>) {
        self.queue_mut(kind).push(callback.into());
    }

    pub fn get(&self, kind: CallbackKind) -> &[Callback] {
        match kind {
            CallbackKind::Success => &self.success,
            CallbackKind::Failure => &self.failure,
            CallbackKind::Ignore => &self.ignore,
            CallbackKind::Ensure => &self.ensure,
        }
    }

    pub fn len(&self, kind: CallbackKind) -> usize {
        self.get(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.success.is_empty()
            && self.failure.is_empty()
            && self.ignore.is_empty()
            && self.ensure.is_empty()
    }

    fn queue_mut(&mut self, kind: CallbackKind) -> &mut Vec<Callback> {
        match kind {
            CallbackKind::Success => &mut self.success,
            CallbackKind::Failure => &mut self.failure,
            CallbackKind::Ignore => &mut self.ignore,
            CallbackKind::Ensure => &mut self.ensure,
        }
    }
}

/// Run `kind` callbacks for `batch`: `global` first, then the batch's own.
pub fn dispatch(
    kind: CallbackKind,
    global: &CallbackQueues,
    batch: &Batch,
) -> Result<(), CallbackError> {
    for callback in global.get(kind).iter().chain(batch.callbacks().get(kind)) {
        callback.call(batch)?;
    }
    Ok(())
}
