//! Errors surfaced when awaiting a task.

use core_types::{JsError, Value};

/// Why [`EventLoop::block_on`](crate::EventLoop::block_on) did not produce a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AwaitError {
    /// The task was rejected; its reason is re-raised at the await point.
    #[error("task rejected: {0}")]
    Rejected(Value),

    /// The loop ran out of work while the task was still pending.
    #[error("event loop ran out of work while the task was still pending")]
    Stalled,

    /// A macrotask or microtask failed and the turn was aborted.
    #[error("event loop failed: {0}")]
    Loop(#[from] JsError),
}

impl AwaitError {
    /// The rejection reason, if the task was rejected.
    pub fn reason(&self) -> Option<&Value> {
        match self {
            AwaitError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Consumes the error, returning the rejection reason if there was one.
    pub fn into_reason(self) -> Option<Value> {
        match self {
            AwaitError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}
