/// Test execution against a sandboxed callable
///
/// Resolves how each test's inputs bind to the callable's signature, coerces
/// single-parameter inputs, invokes the callable in a fresh worker per test
/// and records the output or the error. A run never fails as a whole.
use crate::core::types::{ParamInfo, ParamKind, WorkerResponse, WorkerStage};
use crate::exec::pool::run_ordered;
use crate::exec::types::{
    ExecutionError, ExecutionErrorKind, ExecutionResult, Inputs, TestCase, NON_NUMERIC_INPUT,
    NO_INPUTS_FOR_MULTI_ARG,
};
use crate::sandbox::{Callable, Invocation, Sandbox};
use crate::value::Value;

/// Arguments ready to be passed to the callable
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundArguments {
    pub args: Vec<Value>,
    pub kwargs: Vec<(String, Value)>,
}

pub struct Executor<'a> {
    sandbox: &'a Sandbox,
    max_parallel: usize,
}

impl<'a> Executor<'a> {
    pub fn new(sandbox: &'a Sandbox) -> Self {
        Self {
            sandbox,
            max_parallel: sandbox.config().max_parallel.max(1),
        }
    }

    /// Run every test case; results are in input order.
    pub fn run(&self, callable: &Callable, tests: &[TestCase]) -> Vec<ExecutionResult> {
        log::info!(
            "running {} tests against {} (parallelism {})",
            tests.len(),
            callable.name(),
            self.max_parallel
        );
        run_ordered(tests, self.max_parallel, |test| self.run_one(callable, test))
    }

    pub fn run_one(&self, callable: &Callable, test: &TestCase) -> ExecutionResult {
        let bound = match bind_arguments(callable, &test.input) {
            Ok(bound) => bound,
            Err(error) => {
                log::debug!("test {}: {}", test.name, error);
                return ExecutionResult::failure(test, error);
            }
        };

        let invocation = self.sandbox.invoke(callable, bound.args, bound.kwargs);
        match invocation_result(invocation) {
            Ok((output, output_type)) => {
                ExecutionResult::success(test, output).with_output_type(output_type)
            }
            Err(error) => {
                log::debug!("test {} failed ({:?}): {}", test.name, error.kind, error);
                ExecutionResult::failure(test, error)
            }
        }
    }
}

/// Bind test inputs to the callable's parameters.
///
/// Parameter counts include `*args` and `**kwargs`:
/// - one parameter: the value under its name, else the sole input value,
///   else missing; then coerced for numeric use and passed positionally
///   (by keyword for a keyword-only parameter)
/// - several parameters: by keyword when every key names a parameter and all
///   required ones are covered, otherwise positionally in insertion order
/// - no inputs: `0` for one parameter, nothing for none, an error for several
pub fn bind_arguments(
    callable: &Callable,
    inputs: &Inputs,
) -> Result<BoundArguments, ExecutionError> {
    let params: &[ParamInfo] = callable.params();

    if let [param] = params {
        let raw = inputs.get(&param.name).or_else(|| {
            if inputs.len() == 1 {
                inputs.values().next()
            } else {
                None
            }
        });
        let value = coerce_single(raw)?;
        return Ok(if param.kind == ParamKind::KeywordOnly {
            BoundArguments {
                args: Vec::new(),
                kwargs: vec![(param.name.clone(), value)],
            }
        } else {
            BoundArguments {
                args: vec![value],
                kwargs: Vec::new(),
            }
        });
    }

    if inputs.is_empty() {
        return if params.is_empty() {
            Ok(BoundArguments::default())
        } else {
            Err(ExecutionError::new(
                ExecutionErrorKind::Binding,
                NO_INPUTS_FOR_MULTI_ARG,
            ))
        };
    }

    let keyword_names = callable.keyword_names();
    let accepts_any_keyword = callable
        .params()
        .iter()
        .any(|p| p.kind == ParamKind::VarKeyword);
    let keys_match = inputs
        .keys()
        .all(|key| accepts_any_keyword || keyword_names.contains(&key));
    let required_covered = callable
        .required_names()
        .iter()
        .all(|name| inputs.get(name).is_some());

    if keys_match && required_covered {
        Ok(BoundArguments {
            args: Vec::new(),
            kwargs: inputs.entries().to_vec(),
        })
    } else {
        Ok(BoundArguments {
            args: inputs.values().cloned().collect(),
            kwargs: Vec::new(),
        })
    }
}

/// Numeric normalization for single-parameter functions: missing/null -> 0,
/// strings are trimmed and parsed as integers, anything else passes through.
pub fn coerce_single(raw: Option<&Value>) -> Result<Value, ExecutionError> {
    match raw {
        None | Some(Value::Null) => Ok(Value::Int(0)),
        Some(Value::Str(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Value::Int(0));
            }
            trimmed
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ExecutionError::new(ExecutionErrorKind::Coercion, NON_NUMERIC_INPUT))
        }
        Some(other) => Ok(other.clone()),
    }
}

fn invocation_result(invocation: Invocation) -> Result<(Value, String), ExecutionError> {
    match invocation {
        Invocation::Returned {
            output,
            output_type,
        } => Ok((output, output_type)),
        Invocation::Raised {
            stage,
            error_type,
            message,
        } => {
            let kind = match stage {
                WorkerStage::Call | WorkerStage::Encode => ExecutionErrorKind::Runtime,
                WorkerStage::Compile | WorkerStage::Load => ExecutionErrorKind::Sandbox,
                WorkerStage::Protocol => ExecutionErrorKind::Internal,
            };
            Err(ExecutionError::new(
                kind,
                WorkerResponse::error_text(&error_type, &message),
            ))
        }
        Invocation::TimedOut { limit_ms } => Err(ExecutionError::new(
            ExecutionErrorKind::Timeout,
            format!("Execution timed out after {}ms", limit_ms),
        )),
        Invocation::LimitExceeded(message) => Err(ExecutionError::new(
            ExecutionErrorKind::ResourceLimit,
            message,
        )),
        Invocation::WorkerFailure(message) => {
            Err(ExecutionError::new(ExecutionErrorKind::Internal, message))
        }
    }
}
