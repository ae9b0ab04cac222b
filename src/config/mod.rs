//! Configuration and policy
//!
//! Review limits, the sandbox builtin policy, and startup validation.

pub mod presets;
pub mod types;
pub mod validator;
