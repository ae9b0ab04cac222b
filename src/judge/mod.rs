//! Language adapters.
//!
//! The worker supervisor stays language-agnostic. Adapters define how the
//! interpreter is launched and which request/response harness it runs.

pub mod adapter;
pub mod languages;
pub mod registry;
