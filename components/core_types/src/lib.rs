//! Core value and error types shared by the task runtime.
//!
//! # Overview
//!
//! - [`Value`] - Dynamic payloads and rejection reasons
//! - [`JsError`] - Errors raised by the runtime itself (abort, timeout, aggregate)
//! - [`ErrorKind`] - Kinds of runtime errors
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, Value};
//!
//! let reason = Value::from(JsError::abort());
//! assert_eq!(reason.as_error().map(|e| e.kind), Some(ErrorKind::AbortError));
//! assert_eq!(reason.to_string(), "AbortError: This operation was aborted");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod value;

pub use error::{ErrorKind, JsError};
pub use value::Value;
