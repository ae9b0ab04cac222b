//! Reference oracles.
//!
//! An oracle computes the expected output of an intent for given inputs.
//! Oracles are tolerant: a missing input counts as zero (or empty), the
//! argument name is ignored, and an input that cannot be interpreted yields
//! `None` instead of an error.

pub mod canonical;
pub mod duplicates;
pub mod fibonacci;
pub mod registry;
pub mod sum_first_n;

pub use registry::{intents, lookup};

use crate::exec::types::Inputs;
use crate::value::Value;

pub trait Oracle: Send + Sync {
    /// Intent label this oracle was written for
    fn intent(&self) -> &'static str;

    fn expected(&self, inputs: &Inputs) -> Option<Value>;
}

/// The first input value, whatever its key
pub(crate) fn single_input(inputs: &Inputs) -> Option<&Value> {
    inputs.values().next()
}

/// Integer interpretation of an oracle argument, `int()`-style:
/// floats truncate, strings are trimmed and parsed, other types fail.
pub(crate) fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Float(f) if f.is_finite() && f.abs() < 9.2e18 => Some(f.trunc() as i64),
        Value::Str(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(&Value::Int(4)), Some(4));
        assert_eq!(to_int(&Value::Float(4.9)), Some(4));
        assert_eq!(to_int(&Value::Float(-4.9)), Some(-4));
        assert_eq!(to_int(&Value::from(" 7 ")), Some(7));
        assert_eq!(to_int(&Value::Bool(true)), Some(1));
        assert_eq!(to_int(&Value::from("seven")), None);
        assert_eq!(to_int(&Value::Null), None);
        assert_eq!(to_int(&Value::Float(f64::NAN)), None);
    }

    #[test]
    fn test_single_input_ignores_key() {
        let inputs = Inputs::new().with("whatever", Value::Int(3));
        assert_eq!(single_input(&inputs), Some(&Value::Int(3)));
        assert_eq!(single_input(&Inputs::new()), None);
    }
}
