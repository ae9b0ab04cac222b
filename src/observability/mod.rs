//! Observability
//!
//! Structured audit events for each review stage.

pub mod audit;
