//! Verdict derivation
//!
//! Pure functions from execution results to test outcomes, an overall
//! status and a confidence score.

pub mod confidence;
pub mod types;
pub mod validator;

pub use confidence::score;
pub use types::*;
pub use validator::validate;
