//! Batch state machine.
//!
//! The transition function is pure: it only says where a batch goes next and
//! which effects have to be executed. Stamping, persistence and callback
//! dispatch are carried out by `app::lifecycle`.
//!
//! State transitions:
//! - New -> Running            (start, no conflicting duplicate)
//! - New -> Ignored            (start, a forbidden duplicate is running)
//! - Running -> Success        (finish, no error recorded)
//! - Running -> Errored        (finish, error recorded)
//! - Running -> Stopped        (finish, error of kind `stopped` recorded)

use std::fmt;

use serde::{Deserialize, Serialize};

use super::callbacks::CallbackKind;
use super::failure::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// Created, not started yet.
    New,

    /// Body is executing.
    Running,

    /// Body returned without error.
    Success,

    /// Body failed (or the owning process died).
    Errored,

    /// Body halted on purpose (e.g. upstream data not ready).
    Stopped,

    /// Start was rejected because a duplicate was running. The body never ran.
    Ignored,
}

impl BatchState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BatchState::Success | BatchState::Errored | BatchState::Stopped | BatchState::Ignored
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BatchState::New => "new",
            BatchState::Running => "running",
            BatchState::Success => "success",
            BatchState::Errored => "errored",
            BatchState::Stopped => "stopped",
            BatchState::Ignored => "ignored",
        }
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start { invalid_duplication: bool },
    Finish { failure: Option<FailureKind> },
}

/// Side effect requested by a transition, executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Record pid, hostname and started_at.
    StampStart,

    /// Record finished_at.
    StampFinish,

    /// Write the record to the store.
    Persist,

    /// Run global then batch-local callbacks of this kind.
    Dispatch(CallbackKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: BatchState,
    pub to: BatchState,
    pub effects: Vec<Effect>,
}

/// Compute the next state for `event`.
///
/// Returns `None` when the event is not accepted in `from`; callers treat that
/// as a no-op (e.g. finishing an ignored or already finished batch).
pub fn transition(from: BatchState, event: Event) -> Option<Transition> {
    let (to, effects) = match (from, event) {
        (BatchState::New, Event::Start { invalid_duplication: true }) => (
            BatchState::Ignored,
            vec![
                Effect::StampStart,
                Effect::StampFinish,
                Effect::Persist,
                Effect::Dispatch(CallbackKind::Ignore),
                Effect::Dispatch(CallbackKind::Ensure),
            ],
        ),
        (BatchState::New, Event::Start { invalid_duplication: false }) => {
            (BatchState::Running, vec![Effect::StampStart, Effect::Persist])
        }
        (BatchState::Running, Event::Finish { failure }) => {
            let (to, callbacks) = match failure {
                None => (BatchState::Success, CallbackKind::Success),
                Some(FailureKind::Stopped) => (BatchState::Stopped, CallbackKind::Failure),
                Some(_) => (BatchState::Errored, CallbackKind::Failure),
            };
            (
                to,
                vec![
                    Effect::StampFinish,
                    Effect::Persist,
                    Effect::Dispatch(callbacks),
                    Effect::Dispatch(CallbackKind::Ensure),
                ],
            )
        }
        _ => return None,
    };

    Some(Transition { from, to, effects })
}
