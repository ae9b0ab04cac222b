use crate::config::types::{OutputIntegrity, ReviewConfig, WorkerStatus};
use crate::exec::preexec::WorkerLimits;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Everything the supervisor needs to launch one worker process.
#[derive(Clone, Debug)]
pub struct WorkerProfile {
    pub command: Vec<String>,
    pub stdin_data: Option<String>,
    /// Variables set after the environment is cleared
    pub environment: Vec<(String, String)>,
    pub workdir: PathBuf,
    pub wall_time_limit: Duration,
    pub limits: WorkerLimits,
    pub output_limit_bytes: usize,
}

impl WorkerProfile {
    pub fn from_config(config: &ReviewConfig, command: Vec<String>, wall_time_limit: Duration) -> Self {
        Self {
            command,
            stdin_data: None,
            environment: vec![
                ("PATH".to_string(), "/usr/bin:/bin".to_string()),
                ("LANG".to_string(), "C.UTF-8".to_string()),
            ],
            workdir: PathBuf::from("/"),
            wall_time_limit,
            limits: WorkerLimits::from_config(config),
            output_limit_bytes: config.output_limit_bytes,
        }
    }

    pub fn with_stdin(mut self, data: String) -> Self {
        self.stdin_data = Some(data);
        self
    }
}

/// Signal escalation report for timeout/forced termination paths.
#[derive(Clone, Debug, Default)]
pub struct KillReport {
    pub kill_sent: bool,
    pub waited_ms: u64,
    pub notes: Vec<String>,
}

/// Raw result of one worker process.
#[derive(Clone, Debug, Default)]
pub struct WorkerOutcome {
    pub pid: Option<i32>,
    pub exit_code: Option<i32>,
    pub term_signal: Option<i32>,
    pub timed_out: bool,
    pub wall_time_ms: u64,
    pub stdout: String,
    pub stderr: String,
    pub output_integrity: OutputIntegrity,
    pub kill_report: Option<KillReport>,
}

impl WorkerOutcome {
    /// Classify how the process ended
    pub fn status(&self) -> WorkerStatus {
        if self.timed_out {
            return WorkerStatus::TimeLimit;
        }
        match self.term_signal {
            Some(sig) if sig == libc::SIGXCPU => WorkerStatus::TimeLimit,
            // The kernel answers RLIMIT_AS exhaustion inside allocators with
            // SIGSEGV or SIGKILL; both are limit violations for a worker.
            Some(sig) if sig == libc::SIGKILL || sig == libc::SIGSEGV => {
                WorkerStatus::MemoryLimit
            }
            Some(_) => WorkerStatus::Signaled,
            None if self.exit_code == Some(0) => WorkerStatus::Ok,
            None => WorkerStatus::RuntimeError,
        }
    }

    /// Last framed response line the harness printed, if any
    pub fn response_line(&self, marker: &str) -> Option<&str> {
        self.stdout
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix(marker))
    }

    /// Short human-readable tail of stderr for diagnostics
    pub fn stderr_tail(&self) -> String {
        let trimmed = self.stderr.trim();
        let lines: Vec<&str> = trimmed.lines().collect();
        let start = lines.len().saturating_sub(3);
        lines[start..].join(" | ")
    }
}

/// Operation requested from the worker harness
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerOp {
    Parse,
    Load,
    Call,
}

/// Request written to worker stdin.
#[derive(Clone, Debug, Serialize)]
pub struct WorkerRequest {
    pub op: WorkerOp,
    pub source: String,
    pub builtins: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    pub args: Vec<Value>,
    /// Always a `Value::Map`
    pub kwargs: Value,
}

impl WorkerRequest {
    /// Parse without executing; the worker needs no builtins for this
    pub fn parse(source: &str) -> Self {
        Self {
            op: WorkerOp::Parse,
            source: source.to_string(),
            builtins: Vec::new(),
            function: None,
            args: Vec::new(),
            kwargs: Value::Map(Vec::new()),
        }
    }

    pub fn load(source: &str, builtins: Vec<String>) -> Self {
        Self {
            op: WorkerOp::Load,
            source: source.to_string(),
            builtins,
            function: None,
            args: Vec::new(),
            kwargs: Value::Map(Vec::new()),
        }
    }

    pub fn call(
        source: &str,
        builtins: Vec<String>,
        function: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Self {
        Self {
            op: WorkerOp::Call,
            source: source.to_string(),
            builtins,
            function: Some(function.to_string()),
            args,
            kwargs: Value::Map(kwargs),
        }
    }
}

/// Parameter kinds as reported by the harness' signature inspection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub has_default: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub callable: bool,
    /// Empty when the signature could not be inspected
    #[serde(default)]
    pub params: Vec<ParamInfo>,
}

/// Statement kind of a top-level syntax node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Import,
    Function,
    Class,
    Other,
}

/// Span of one top-level statement as the interpreter's parser sees it.
/// Lines are 1-based; columns are UTF-8 byte offsets, `end_col` exclusive.
/// A decorated definition starts at its first decorator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub name: Option<String>,
    pub line: usize,
    pub col: usize,
    pub end_line: usize,
    pub end_col: usize,
    /// Every function defined inside the statement, itself included, in
    /// source order
    #[serde(default)]
    pub functions: Vec<String>,
}

/// Value encoding of call results. Unlike plain JSON it keeps tuples and
/// sets apart from lists and carries integers of any size as text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "lowercase")]
pub enum WireValue {
    None,
    Bool(bool),
    Int(String),
    Float(f64),
    Str(String),
    List(Vec<WireValue>),
    Tuple(Vec<WireValue>),
    Set(Vec<WireValue>),
    /// `[key, value]` pairs in insertion order, keys already stringified
    Dict(Vec<(String, WireValue)>),
}

fn decode_all(items: Vec<WireValue>) -> std::result::Result<Vec<Value>, String> {
    items.into_iter().map(Value::try_from).collect()
}

impl TryFrom<WireValue> for Value {
    type Error = String;

    fn try_from(wire: WireValue) -> std::result::Result<Self, Self::Error> {
        Ok(match wire {
            WireValue::None => Value::Null,
            WireValue::Bool(b) => Value::Bool(b),
            WireValue::Int(text) => {
                Value::integer(&text).ok_or_else(|| format!("bad integer literal '{}'", text))?
            }
            WireValue::Float(f) => Value::Float(f),
            WireValue::Str(s) => Value::Str(s),
            WireValue::List(items) => Value::List(decode_all(items)?),
            WireValue::Tuple(items) => Value::Tuple(decode_all(items)?),
            WireValue::Set(items) => Value::Set(decode_all(items)?),
            WireValue::Dict(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| Value::try_from(value).map(|v| (key, v)))
                    .collect::<std::result::Result<_, _>>()?,
            ),
        })
    }
}

/// Phase of the harness that raised
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStage {
    Compile,
    Load,
    Call,
    Encode,
    Protocol,
}

/// Framed response the harness prints on stdout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerResponse {
    Ok {
        #[serde(default)]
        symbols: Vec<SymbolInfo>,
        #[serde(default)]
        nodes: Vec<SourceNode>,
        #[serde(default)]
        output: Option<WireValue>,
        #[serde(default)]
        output_type: Option<String>,
    },
    Error {
        stage: WorkerStage,
        error_type: String,
        message: String,
        /// Source line of a syntax error
        #[serde(default)]
        line: Option<usize>,
    },
}

impl WorkerResponse {
    /// `ErrorType: message` rendering of an error response
    pub fn error_text(error_type: &str, message: &str) -> String {
        if message.is_empty() {
            error_type.to_string()
        } else {
            format!("{}: {}", error_type, message)
        }
    }
}
