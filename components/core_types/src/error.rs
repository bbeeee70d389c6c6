//! Error values used as task rejection reasons.
//!
//! Rejection reasons are arbitrary [`Value`]s, but the runtime itself produces a
//! small set of distinguished error kinds: aborts, timeouts, aggregate failures
//! from `any`, and type errors such as a task adopting itself.

use crate::Value;
use std::fmt;

/// The kind of error.
///
/// These mirror the built-in error constructors a promise runtime raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Misuse of the API (e.g., a task resolved with itself)
    TypeError,
    /// A cancellation signal fired while an operation was outstanding
    AbortError,
    /// A timeout signal fired
    TimeoutError,
    /// Every input of an `any` combinator rejected
    AggregateError,
    /// Internal runtime error (e.g., the microtask queue never drained)
    InternalError,
}

impl ErrorKind {
    /// Returns the constructor name of this error kind.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::AbortError => "AbortError",
            ErrorKind::TimeoutError => "TimeoutError",
            ErrorKind::AggregateError => "AggregateError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error with a kind, a message and, for aggregate errors, the wrapped reasons.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, JsError, Value};
///
/// let error = JsError::aggregate(vec![Value::Smi(1), Value::Smi(2)]);
///
/// assert_eq!(error.kind, ErrorKind::AggregateError);
/// assert_eq!(error.errors.len(), 2);
/// assert_eq!(error.to_string(), "AggregateError: All tasks were rejected");
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Wrapped reasons, in input order (only populated for aggregate errors)
    pub errors: Vec<Value>,
}

impl JsError {
    /// Creates an error of the given kind with no wrapped reasons.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// The default reason used when a signal is aborted without one.
    pub fn abort() -> Self {
        Self::new(ErrorKind::AbortError, "This operation was aborted")
    }

    /// The reason used by timeout signals.
    pub fn timeout() -> Self {
        Self::new(
            ErrorKind::TimeoutError,
            "The operation was aborted due to timeout",
        )
    }

    /// Wraps every rejection reason of an `any` combinator.
    pub fn aggregate(errors: Vec<Value>) -> Self {
        Self {
            kind: ErrorKind::AggregateError,
            message: "All tasks were rejected".to_string(),
            errors,
        }
    }

    /// Shorthand for a [`ErrorKind::TypeError`].
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Shorthand for an [`ErrorKind::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }
}
