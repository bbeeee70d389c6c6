//! Unit tests for the Value enum

use core_types::{JsError, Value};

#[cfg(test)]
mod value_to_string_tests {
    use super::*;

    #[test]
    fn test_primitives_to_string() {
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::Smi(-42).to_string(), "-42");
        assert_eq!(Value::Double(1.5).to_string(), "1.5");
        assert_eq!(Value::Double(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::from("hi").to_string(), "hi");
    }

    #[test]
    fn test_nested_array_to_string() {
        let nested = Value::Array(vec![
            Value::Smi(1),
            Value::Array(vec![Value::Smi(2), Value::Smi(3)]),
        ]);
        assert_eq!(nested.to_string(), "1,2,3");
    }

    #[test]
    fn test_error_to_string() {
        assert_eq!(
            Value::from(JsError::timeout()).to_string(),
            "TimeoutError: The operation was aborted due to timeout"
        );
    }
}

#[cfg(test)]
mod value_equality_tests {
    use super::*;

    #[test]
    fn test_same_variant_equality() {
        assert_eq!(Value::Smi(2), Value::Smi(2));
        assert_ne!(Value::Smi(2), Value::Double(2.0));
        assert_ne!(Value::Double(f64::NAN), Value::Double(f64::NAN));
    }

    #[test]
    fn test_error_equality_includes_wrapped_reasons() {
        let a = Value::from(JsError::aggregate(vec![Value::Smi(1)]));
        let b = Value::from(JsError::aggregate(vec![Value::Smi(1)]));
        let c = Value::from(JsError::aggregate(vec![Value::Smi(2)]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_as_error() {
        assert!(Value::Smi(1).as_error().is_none());
        assert!(Value::from(JsError::abort()).as_error().is_some());
    }
}
