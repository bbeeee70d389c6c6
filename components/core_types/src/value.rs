//! Dynamic value representation.
//!
//! Rejection reasons are opaque: a producer may reject with a number, a string,
//! nothing at all, or an error object. [`Value`] models that universe the way a
//! JavaScript engine does, so reasons can be compared and printed.

use crate::JsError;
use std::fmt;

/// Represents any value a task can carry as a payload or rejection reason.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Double(3.0).to_string(), "3");
/// assert_eq!(Value::from("aborted"), Value::String("aborted".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value (what `reject()` with no argument produces)
    Undefined,
    /// Null value
    Null,
    /// Boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// String value
    String(std::string::String),
    /// Ordered sequence of values
    Array(Vec<Value>),
    /// Error object
    Error(JsError),
}

impl Value {
    /// Returns the wrapped error if this value is an error object.
    pub fn as_error(&self) -> Option<&JsError> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<JsError> for Value {
    fn from(error: JsError) -> Self {
        Value::Error(error)
    }
}

/// Follows JavaScript's `String()` conversion.
///
/// ```
/// use core_types::{JsError, Value};
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Array(vec![Value::Smi(1), Value::Smi(2)]).to_string(), "1,2");
/// assert_eq!(Value::from(JsError::abort()).to_string(), "AbortError: This operation was aborted");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Integer-valued doubles display without decimal point
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Array(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    // null and undefined elements print as empty strings
                    if !matches!(v, Value::Undefined | Value::Null) {
                        write!(f, "{}", v)?;
                    }
                }
                Ok(())
            }
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}
