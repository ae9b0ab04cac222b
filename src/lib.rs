//! reviewbox: sandboxed review of generated Python functions
//!
//! Candidate code is reduced to its declarations, loaded and called in
//! short-lived interpreter workers under kernel resource limits, checked
//! against reference oracles and summarized as a verdict with a confidence
//! score.
//!
//! # Architecture
//!
//! ## Source handling
//! - [`sanitizer`]: parser-driven, declaration-only reduction of candidate source
//! - [`value`]: dynamic values crossing the worker boundary
//!
//! ## Worker Core ([`core`], [`judge`])
//! - [`core::supervisor`]: worker launch, watchdog and process-group kill
//! - [`core::types`]: worker profiles, outcomes and the JSON protocol
//! - [`judge::languages::python`]: interpreter command and harness
//!
//! ## Execution ([`sandbox`], [`exec`])
//! - [`sandbox`]: load/extract/invoke on top of fresh workers
//! - [`exec::executor`]: argument binding and per-test execution
//! - [`exec::pool`]: bounded, order-preserving parallel runs
//! - [`exec::preexec`]: rlimits applied in the child before exec
//!
//! ## Judgement ([`oracle`], [`verdict`])
//! - [`oracle`]: reference oracles and canonical test suites
//! - [`verdict::validator`]: per-test classification and overall status
//! - [`verdict::confidence`]: confidence scoring
//!
//! ## Orchestration
//! - [`review`]: the end-to-end review pipeline
//! - [`observability::audit`]: structured review events
//! - [`config`]: configuration, builtin policy presets and validation
//!
//! # Isolation model
//!
//! The builtin whitelist keeps honest mistakes and casual escapes out, but
//! it is not a security boundary on its own. Containment rests on the
//! worker process: a fresh interpreter per request, an empty environment,
//! `/` as working directory, and CPU/memory/fd/file-size/process rlimits
//! with a wall-clock kill of the whole process group.

// Source handling
pub mod sanitizer;
pub mod value;

// Worker core
pub mod core;
pub mod judge;

// Execution
pub mod exec;
pub mod sandbox;

// Judgement
pub mod oracle;
pub mod verdict;

// Orchestration
pub mod review;

// Observability
pub mod observability;

// Configuration & Policy
pub mod config;

// Utilities
pub mod utils;

// CLI entrypoint for the reviewbox binary.
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::*;
pub use exec::types::{ExecutionError, ExecutionErrorKind, ExecutionResult, Inputs, TestCase};
pub use review::{Disposition, ReviewReport, ReviewRequest, Reviewer};
pub use sanitizer::{extract_function_name, sanitize, CodeArtifact, SourceParser};
pub use value::Value;
pub use verdict::{ConfidenceLevel, ConfidenceReport, ReviewVerdict, TestStatus, VerdictStatus};
