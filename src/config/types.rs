/// Core types and structures for the reviewbox system
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Review engine configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReviewConfig {
    /// Interpreter used for worker processes
    pub interpreter: PathBuf,
    /// Language adapter name
    pub language: String,
    /// Wall clock limit for a single test invocation
    pub call_wall_time_limit_ms: u64,
    /// Wall clock limit for loading the candidate module
    pub load_wall_time_limit_ms: u64,
    /// CPU time limit per worker (seconds granularity, rounded up)
    pub cpu_time_limit_ms: Option<u64>,
    /// Address space limit per worker in bytes
    pub memory_limit: Option<u64>,
    /// Maximum open file descriptors per worker
    pub fd_limit: Option<u64>,
    /// Maximum file size a worker may write
    pub file_size_limit: Option<u64>,
    /// Process limit applied inside the worker
    pub process_limit: Option<u64>,
    /// Captured stdout/stderr limit per worker stream
    pub output_limit_bytes: usize,
    /// Number of test invocations allowed to run at once
    pub max_parallel: usize,
    /// Optional JSONL file that receives audit events
    pub audit_log: Option<PathBuf>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("/usr/bin/python3"),
            language: "python".to_string(),
            call_wall_time_limit_ms: 5_000,
            load_wall_time_limit_ms: 5_000,
            cpu_time_limit_ms: Some(3_000),
            memory_limit: Some(256 * 1024 * 1024), // 256MB address space
            fd_limit: Some(32),
            file_size_limit: Some(0), // workers never write files
            process_limit: Some(1),
            output_limit_bytes: 1024 * 1024,
            max_parallel: default_parallelism(),
            audit_log: None,
        }
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(4))
        .unwrap_or(1)
}

impl ReviewConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            ReviewError::Config(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_wall_time_limit_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_wall_time_limit_ms)
    }
}

/// Terminal status of a single worker process - closed set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Worker exited normally and produced a response
    #[serde(rename = "OK")]
    Ok,
    /// Wall clock or CPU limit exceeded
    #[serde(rename = "TLE")]
    TimeLimit,
    /// Killed by the kernel for a resource limit other than time
    #[serde(rename = "MLE")]
    MemoryLimit,
    /// Non-zero exit without a response
    #[serde(rename = "RE")]
    RuntimeError,
    /// Fatal signal not attributable to a limit
    #[serde(rename = "SIG")]
    Signaled,
    /// Supervisor failure (spawn, pipe, protocol)
    #[serde(rename = "IE")]
    InternalError,
}

/// Output integrity classification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OutputIntegrity {
    #[default]
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "truncated_by_judge_limit")]
    TruncatedByJudgeLimit,
    #[serde(rename = "truncated_by_program_close")]
    TruncatedByProgramClose,
    #[serde(rename = "write_error")]
    WriteError,
}

impl std::fmt::Display for OutputIntegrity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputIntegrity::Complete => write!(f, "complete"),
            OutputIntegrity::TruncatedByJudgeLimit => write!(f, "truncated_by_judge_limit"),
            OutputIntegrity::TruncatedByProgramClose => write!(f, "truncated_by_program_close"),
            OutputIntegrity::WriteError => write!(f, "write_error"),
        }
    }
}

/// Candidate source could not be reduced to declarations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizationError {
    #[error("Invalid Python code: {message}{}", line_suffix(.line))]
    InvalidSource { message: String, line: Option<usize> },

    #[error("Source parser failed: {0}")]
    Parser(String),

    #[error("No valid function or class definitions found after sanitization.")]
    NoDefinitions,

    #[error("No function definition found in generated code.")]
    NoFunction,
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|n| format!(" (line {})", n)).unwrap_or_default()
}

/// Sandbox load/extract failures. Terminal for a review.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("Code execution failed: {0}")]
    Load(String),

    #[error("Function '{0}' not found or not callable")]
    MissingSymbol(String),

    #[error("Code loading timed out after {limit_ms}ms")]
    Timeout { limit_ms: u64 },

    #[error("Sandbox worker failure: {0}")]
    Worker(String),
}

/// Custom error types for reviewbox
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Worker protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sanitization(#[from] SanitizationError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

pub type Result<T> = std::result::Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_bounded() {
        let config = ReviewConfig::default();
        assert!(config.max_parallel >= 1 && config.max_parallel <= 4);
        assert_eq!(config.memory_limit, Some(256 * 1024 * 1024));
        assert_eq!(config.call_timeout(), Duration::from_secs(5));
        assert_eq!(config.language, "python");
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: ReviewConfig =
            serde_json::from_str(r#"{"call_wall_time_limit_ms": 250, "max_parallel": 2}"#)
                .unwrap();
        assert_eq!(config.call_wall_time_limit_ms, 250);
        assert_eq!(config.max_parallel, 2);
        assert_eq!(config.interpreter, PathBuf::from("/usr/bin/python3"));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviewbox.json");
        std::fs::write(&path, r#"{"fd_limit": 16}"#).unwrap();
        let config = ReviewConfig::from_file(&path).unwrap();
        assert_eq!(config.fd_limit, Some(16));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ReviewConfig::from_file(&path),
            Err(ReviewError::Config(_))
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SandboxError::MissingSymbol("fib".into()).to_string(),
            "Function 'fib' not found or not callable"
        );
        assert_eq!(
            SanitizationError::NoDefinitions.to_string(),
            "No valid function or class definitions found after sanitization."
        );
        let invalid = SanitizationError::InvalidSource {
            message: "expected ':'".into(),
            line: Some(1),
        };
        assert_eq!(invalid.to_string(), "Invalid Python code: expected ':' (line 1)");
        let no_line = SanitizationError::InvalidSource {
            message: "source code string cannot contain null bytes".into(),
            line: None,
        };
        assert!(!no_line.to_string().contains("line"));
        let err: ReviewError = SandboxError::Load("NameError: boom".into()).into();
        assert_eq!(err.to_string(), "Code execution failed: NameError: boom");
    }

    #[test]
    fn test_output_integrity_display() {
        assert_eq!(format!("{}", OutputIntegrity::Complete), "complete");
        assert_eq!(
            format!("{}", OutputIntegrity::TruncatedByJudgeLimit),
            "truncated_by_judge_limit"
        );
    }
}
