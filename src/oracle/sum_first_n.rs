use crate::exec::types::Inputs;
use crate::oracle::{single_input, to_int, Oracle};
use crate::value::Value;

/// `1 + 2 + ... + n`; zero for `n <= 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumFirstNOracle;

impl Oracle for SumFirstNOracle {
    fn intent(&self) -> &'static str {
        "sum_first_n"
    }

    fn expected(&self, inputs: &Inputs) -> Option<Value> {
        let n = match single_input(inputs) {
            None => 0,
            Some(value) => to_int(value)?,
        };
        if n <= 0 {
            return Some(Value::Int(0));
        }
        let total = (n as i128 * (n as i128 + 1)) / 2;
        i64::try_from(total).ok().map(Value::Int)
    }
}
