//! Domain model (ids, batch record, state machine, failures, callbacks).

pub mod batch;
pub mod callbacks;
pub mod errors;
pub mod failure;
pub mod ids;
pub mod state;

pub use batch::{Batch, BatchOptions};
pub use callbacks::{Callback, CallbackError, CallbackKind, CallbackQueues};
pub use errors::{BatchyError, StoreError};
pub use failure::{BatchFailure, FailureKind};
pub use ids::BatchId;
pub use state::{BatchState, Effect, Event, Transition, transition};
