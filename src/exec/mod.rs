//! Execution control
//!
//! Worker pre-exec setup, argument binding and bounded parallel test runs.

pub mod executor;
pub mod pool;
pub mod preexec;
pub mod types;
