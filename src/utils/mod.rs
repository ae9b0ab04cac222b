//! Utilities
//!
//! Bounded collection of worker output.

pub mod output;
