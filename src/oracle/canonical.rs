//! Built-in test suites per intent, used when a caller supplies none.

use crate::exec::types::{Inputs, TestCase};
use crate::value::Value;
use once_cell::sync::Lazy;
use std::collections::HashMap;

fn ints(values: &[i64]) -> Value {
    Value::List(values.iter().copied().map(Value::Int).collect())
}

fn case(name: &str, key: &str, input: Value, expected: Value) -> TestCase {
    TestCase::new(name, Inputs::new().with(key, input), Some(expected))
}

static CATALOG: Lazy<HashMap<&'static str, Vec<TestCase>>> = Lazy::new(|| {
    let mut catalog = HashMap::new();
    catalog.insert(
        "sum_first_n",
        vec![
            case("n_equals_0", "n", Value::Int(0), Value::Int(0)),
            case("n_equals_1", "n", Value::Int(1), Value::Int(1)),
            case("n_equals_5", "n", Value::Int(5), Value::Int(15)),
        ],
    );
    catalog.insert(
        "find_duplicates",
        vec![
            case("basic_case", "nums", ints(&[1, 2, 3, 2]), ints(&[2])),
            case("no_duplicates", "nums", ints(&[1, 2, 3]), ints(&[])),
        ],
    );
    catalog.insert(
        "fibonacci",
        vec![
            case("n_0", "n", Value::Int(0), ints(&[])),
            case("n_1", "n", Value::Int(1), ints(&[0])),
            case("n_5", "n", Value::Int(5), ints(&[0, 1, 1, 2, 3])),
            case("n_negative", "n", Value::Int(-3), ints(&[])),
        ],
    );
    catalog
});

/// Canonical tests for `intent`; empty when none are defined.
pub fn canonical_tests(intent: &str) -> Vec<TestCase> {
    CATALOG.get(intent).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::lookup;

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(canonical_tests("sum_first_n").len(), 3);
        assert_eq!(canonical_tests("find_duplicates").len(), 2);
        assert_eq!(canonical_tests("fibonacci").len(), 4);
        assert!(canonical_tests("general").is_empty());
        assert!(canonical_tests("unknown").is_empty());
    }

    #[test]
    fn test_catalog_agrees_with_oracles() {
        for intent in ["sum_first_n", "find_duplicates", "fibonacci"] {
            let oracle = lookup(intent).unwrap();
            for test in canonical_tests(intent) {
                assert_eq!(
                    oracle.expected(&test.input).as_ref(),
                    test.expected_value(),
                    "{intent}/{}",
                    test.name
                );
            }
        }
    }
}
