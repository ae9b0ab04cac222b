//! Dynamic values exchanged with candidate code.
//!
//! Test inputs, expected values and outputs are all [`Value`]s. Equality
//! follows the interpreter's rules for the types that cross the worker
//! boundary: `1 == 1.0 == True`, lists and tuples compare elementwise but
//! never with each other, sets and maps compare regardless of order.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    /// Integer outside the i64 range, in canonical decimal form
    BigInt(String),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Distinct elements; order carries no meaning
    Set(Vec<Value>),
    /// Insertion-ordered key/value pairs
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Interpreter type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::BigInt(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Map(_) => "dict",
        }
    }

    /// Integer from its decimal text: `Int` when it fits in an i64,
    /// `BigInt` otherwise. `None` unless `text` is an optional `-` followed
    /// by digits.
    pub fn integer(text: &str) -> Option<Value> {
        let digits = text.strip_prefix('-').unwrap_or(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(match text.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => Value::BigInt(text.to_string()),
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for `[]` and `{}`
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::List(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key in a map value
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Build a map from key/value pairs, keeping their order
    pub fn map<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Compact JSON rendering
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

fn numeric(value: &Value) -> Option<Number> {
    match value {
        Value::Bool(b) => Some(Number::Int(i64::from(*b))),
        Value::Int(i) => Some(Number::Int(*i)),
        Value::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

fn int_eq_float(i: i64, f: f64) -> bool {
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && (LOWER..UPPER).contains(&f) && f as i64 == i
}

/// Exact comparison: `1e19 == 10**19` but `1e19 != 10**19 + 1`
fn big_int_eq_float(digits: &str, f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && format!("{:.0}", f) == digits
}

fn numbers_eq(a: Number, b: Number) -> bool {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x == y,
        (Number::Float(x), Number::Float(y)) => x == y,
        (Number::Int(i), Number::Float(f)) | (Number::Float(f), Number::Int(i)) => {
            int_eq_float(i, f)
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (numeric(self), numeric(other)) {
            return numbers_eq(a, b);
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::BigInt(digits), Value::Float(f)) | (Value::Float(f), Value::BigInt(digits)) => {
                big_int_eq_float(digits, *f)
            }
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(other_key, other_value)| {
                            other_key == key && other_value == value
                        })
                    })
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            // JSON has no width limit but serde stops at 128 bits
            Value::BigInt(digits) => match digits.parse::<i128>() {
                Ok(i) => serializer.serialize_i128(i),
                Err(_) => match digits.parse::<u128>() {
                    Ok(u) => serializer.serialize_u128(u),
                    Err(_) => serializer.serialize_str(digits),
                },
            },
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
                items.serialize(serializer)
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Value::Int(i),
                (None, Some(u)) => Value::BigInt(u.to_string()),
                _ => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => {
                Value::Map(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Bool(true), Value::Int(1));
        assert_eq!(Value::Bool(false), Value::Float(0.0));
        assert_ne!(Value::Int(1), Value::Float(1.5));
        assert_ne!(Value::Int(1), Value::Str("1".into()));
        assert_ne!(Value::Null, Value::Int(0));
    }

    #[test]
    fn test_collection_equality() {
        assert_eq!(ints(&[0, 1, 1]), ints(&[0, 1, 1]));
        assert_ne!(ints(&[0, 1]), ints(&[1, 0]));

        let a = Value::map([("x", Value::Int(1)), ("y", Value::Int(2))]);
        let b = Value::map([("y", Value::Float(2.0)), ("x", Value::Int(1))]);
        assert_eq!(a, b);
        assert_ne!(a, Value::map([("x", Value::Int(1))]));
    }

    #[test]
    fn test_big_integers() {
        let big = Value::integer("10000000000000000000").unwrap();
        assert_eq!(big, Value::BigInt("10000000000000000000".into()));
        assert_eq!(big.type_name(), "int");
        assert_eq!(Value::integer("-42"), Some(Value::Int(-42)));
        assert_eq!(Value::integer("4.2"), None);
        assert_eq!(Value::integer("-"), None);

        assert_eq!(big, Value::Float(1e19));
        assert_ne!(Value::integer("10000000000000000001").unwrap(), Value::Float(1e19));
        assert_ne!(big, Value::Int(i64::MAX));

        // u64 range arrives from JSON as a plain number
        let parsed: Value = serde_json::from_str("10000000000000000000").unwrap();
        assert_eq!(parsed, big);
        assert_eq!(big.to_json_string(), "10000000000000000000");
        let huge = Value::integer(&format!("1{}", "0".repeat(40))).unwrap();
        assert_eq!(huge.to_json_string(), format!("\"1{}\"", "0".repeat(40)));
    }

    #[test]
    fn test_tuples_and_sets_are_not_lists() {
        let tuple = Value::Tuple(vec![Value::Int(1), Value::Int(2)]);
        assert_ne!(tuple, ints(&[1, 2]));
        assert_eq!(tuple, Value::Tuple(vec![Value::Float(1.0), Value::Int(2)]));
        assert_eq!(tuple.to_json_string(), "[1,2]");

        let set = Value::Set(vec![Value::Int(2), Value::Int(1)]);
        assert_eq!(set, Value::Set(vec![Value::Int(1), Value::Int(2)]));
        assert_ne!(set, ints(&[2, 1]));
        assert_ne!(set, Value::Set(vec![Value::Int(1)]));
        assert_eq!(set.type_name(), "set");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "NoneType");
        assert_eq!(Value::Int(3).type_name(), "int");
        assert_eq!(Value::Float(3.0).type_name(), "float");
        assert_eq!(ints(&[]).type_name(), "list");
        assert_eq!(Value::map::<&str, _>([]).type_name(), "dict");
    }

    #[test]
    fn test_json_preserves_map_order() {
        let value: Value = serde_json::from_str(r#"{"b": 1, "a": [true, null, 2.5]}"#).unwrap();
        match &value {
            Value::Map(entries) => {
                assert_eq!(entries[0].0, "b");
                assert_eq!(entries[1].0, "a");
            }
            other => panic!("expected map, got {other:?}"),
        }
        assert_eq!(value.to_json_string(), r#"{"b":1,"a":[true,null,2.5]}"#);
    }

    #[test]
    fn test_empty_collection() {
        assert!(ints(&[]).is_empty_collection());
        assert!(Value::map::<&str, _>([]).is_empty_collection());
        assert!(!Value::Str(String::new()).is_empty_collection());
        assert!(!ints(&[1]).is_empty_collection());
    }

    #[test]
    fn test_map_lookup() {
        let value = Value::map([("n", Value::Int(5))]);
        assert_eq!(value.get("n").and_then(Value::as_i64), Some(5));
        assert!(value.get("m").is_none());
    }
}
