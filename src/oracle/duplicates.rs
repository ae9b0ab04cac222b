use crate::exec::types::Inputs;
use crate::oracle::{single_input, Oracle};
use crate::value::Value;

/// Values that occur more than once, in the order their second occurrence
/// is reached. Each duplicate is reported once.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindDuplicatesOracle;

impl Oracle for FindDuplicatesOracle {
    fn intent(&self) -> &'static str {
        "find_duplicates"
    }

    fn expected(&self, inputs: &Inputs) -> Option<Value> {
        let items = match single_input(inputs) {
            None | Some(Value::Null) => return Some(Value::List(Vec::new())),
            Some(Value::List(items)) => items,
            Some(_) => return None,
        };

        let mut seen: Vec<&Value> = Vec::new();
        let mut duplicates: Vec<Value> = Vec::new();
        for item in items {
            if seen.contains(&item) {
                if !duplicates.contains(item) {
                    duplicates.push(item.clone());
                }
            } else {
                seen.push(item);
            }
        }
        Some(Value::List(duplicates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().copied().map(Value::Int).collect())
    }

    fn expected_for(value: Value) -> Option<Value> {
        FindDuplicatesOracle.expected(&Inputs::new().with("nums", value))
    }

    #[test]
    fn test_duplicates() {
        assert_eq!(expected_for(ints(&[1, 2, 3, 2])), Some(ints(&[2])));
        assert_eq!(expected_for(ints(&[1, 2, 3])), Some(ints(&[])));
        assert_eq!(expected_for(ints(&[3, 1, 1, 3, 3])), Some(ints(&[1, 3])));
    }

    #[test]
    fn test_numeric_equality_counts() {
        let mixed = Value::List(vec![Value::Int(1), Value::Float(1.0)]);
        assert_eq!(expected_for(mixed), Some(ints(&[1])));
    }

    #[test]
    fn test_tolerant_inputs() {
        assert_eq!(FindDuplicatesOracle.expected(&Inputs::new()), Some(ints(&[])));
        assert_eq!(expected_for(Value::Int(4)), None);
    }
}
