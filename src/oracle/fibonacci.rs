use crate::exec::types::Inputs;
use crate::oracle::{single_input, to_int, Oracle};
use crate::value::Value;

/// First `n` Fibonacci numbers starting at 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct FibonacciOracle;

impl FibonacciOracle {
    /// `None` when a term would overflow i64
    pub fn sequence(n: i64) -> Option<Vec<i64>> {
        if n <= 0 {
            return Some(Vec::new());
        }
        let len = n as usize;
        let mut fib: Vec<i64> = vec![0, 1];
        fib.truncate(len);
        while fib.len() < len {
            let next = fib[fib.len() - 1].checked_add(fib[fib.len() - 2])?;
            fib.push(next);
        }
        Some(fib)
    }
}

impl Oracle for FibonacciOracle {
    fn intent(&self) -> &'static str {
        "fibonacci"
    }

    fn expected(&self, inputs: &Inputs) -> Option<Value> {
        let n = match single_input(inputs) {
            None => 0,
            Some(value) => to_int(value)?,
        };
        let sequence = Self::sequence(n)?;
        Some(Value::List(sequence.into_iter().map(Value::Int).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_for(value: Value) -> Option<Value> {
        FibonacciOracle.expected(&Inputs::new().with("n", value))
    }

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_small_sequences() {
        assert_eq!(expected_for(Value::Int(0)), Some(ints(&[])));
        assert_eq!(expected_for(Value::Int(1)), Some(ints(&[0])));
        assert_eq!(expected_for(Value::Int(2)), Some(ints(&[0, 1])));
        assert_eq!(expected_for(Value::Int(5)), Some(ints(&[0, 1, 1, 2, 3])));
        assert_eq!(expected_for(Value::Int(-3)), Some(ints(&[])));
    }

    #[test]
    fn test_tolerant_inputs() {
        assert_eq!(FibonacciOracle.expected(&Inputs::new()), Some(ints(&[])));
        assert_eq!(
            FibonacciOracle.expected(&Inputs::new().with("count", Value::Int(3))),
            Some(ints(&[0, 1, 1]))
        );
        assert_eq!(expected_for(Value::from("4")), Some(ints(&[0, 1, 1, 2])));
        assert_eq!(expected_for(Value::from("abc")), None);
        assert_eq!(expected_for(Value::List(Vec::new())), None);
    }

    #[test]
    fn test_overflow_yields_none() {
        assert_eq!(FibonacciOracle::sequence(93).map(|s| s.len()), Some(93));
        assert_eq!(FibonacciOracle::sequence(94), None);
        assert_eq!(expected_for(Value::Int(1_000_000_000)), None);
    }
}
