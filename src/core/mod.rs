//! Language-agnostic worker core.
//!
//! Core owns the worker process model: launch under limits, wall-clock
//! watchdog, process-group kill and output capture. What a worker runs is
//! decided by the language adapters in [`crate::judge`].

pub mod supervisor;
pub mod types;
