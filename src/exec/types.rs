use crate::value::Value;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message of a non-numeric string bound to a single-parameter function.
pub const NON_NUMERIC_INPUT: &str = "Non-numeric input for numeric function";

/// Message of an empty input bound to a multi-parameter function.
pub const NO_INPUTS_FOR_MULTI_ARG: &str = "No inputs provided for multi-argument function";

/// Ordered parameter-name -> value mapping of one test case
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inputs(Vec<(String, Value)>);

impl Inputs {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace, keeping first-insertion order
    pub fn insert(&mut self, key: &str, value: Value) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.0
    }
}

impl FromIterator<(String, Value)> for Inputs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut inputs = Inputs::new();
        for (key, value) in iter {
            inputs.insert(&key, value);
        }
        inputs
    }
}

impl Serialize for Inputs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Inputs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Map(entries) => Ok(entries.into_iter().collect()),
            Value::Null => Ok(Inputs::new()),
            other => Err(de::Error::custom(format!(
                "test input must be an object, got {}",
                other.type_name()
            ))),
        }
    }
}

/// A named test case. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default = "unnamed")]
    pub name: String,
    #[serde(default)]
    pub input: Inputs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

fn unnamed() -> String {
    "unknown".to_string()
}

impl TestCase {
    pub fn new(name: &str, input: Inputs, expected: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            input,
            expected,
        }
    }

    /// Expected value, treating an explicit null as absent
    pub fn expected_value(&self) -> Option<&Value> {
        self.expected.as_ref().filter(|v| !v.is_null())
    }

    /// Copy of this test with `expected` filled in
    pub fn with_expected(&self, expected: Value) -> Self {
        Self {
            expected: Some(expected),
            ..self.clone()
        }
    }
}

/// Category of a per-test execution failure - closed set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    /// Input could not be coerced for a numeric single-parameter function
    Coercion,
    /// Inputs could not be bound to the signature
    Binding,
    /// The callable raised
    Runtime,
    /// Wall clock or CPU limit
    Timeout,
    /// Memory or other kernel-enforced limit
    ResourceLimit,
    /// The candidate could not be loaded at all
    Sandbox,
    /// Worker or protocol failure
    Internal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub message: String,
}

impl ExecutionError {
    pub fn new(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Input-shape problem rather than a defect of the candidate
    pub fn is_coercion(&self) -> bool {
        self.kind == ExecutionErrorKind::Coercion || self.message.contains("Non-numeric input")
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExecutionError {}

// Serialized as the bare message, the shape verdict consumers expect.
impl Serialize for ExecutionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.message)
    }
}

/// Outcome of running one test case. Exactly one of `output`/`error` is set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub name: String,
    pub input: Inputs,
    pub output: Option<Value>,
    /// Interpreter type name of the returned object, as the worker saw it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    pub error: Option<ExecutionError>,
}

impl ExecutionResult {
    pub fn success(test: &TestCase, output: Value) -> Self {
        Self {
            name: test.name.clone(),
            input: test.input.clone(),
            output: Some(output),
            output_type: None,
            error: None,
        }
    }

    pub fn failure(test: &TestCase, error: ExecutionError) -> Self {
        Self {
            name: test.name.clone(),
            input: test.input.clone(),
            output: None,
            output_type: None,
            error: Some(error),
        }
    }

    pub fn with_output_type(mut self, output_type: impl Into<String>) -> Self {
        self.output_type = Some(output_type.into());
        self
    }

    /// Type of the output: the worker's report when present, else inferred
    pub fn output_type_name(&self) -> Option<&str> {
        let output = self.output.as_ref()?;
        Some(self.output_type.as_deref().unwrap_or(output.type_name()))
    }
}
