/// Confidence scoring
///
/// Starts at 100 and subtracts fixed penalties for each kind of negative
/// evidence. The result is clamped to 0..=100 and bucketed into a level.
use crate::exec::types::ExecutionResult;
use crate::verdict::types::{ConfidenceReport, ReviewSummary};
use std::collections::BTreeSet;

pub const REASON_FAILED: &str = "One or more tests failed";
pub const REASON_ERRORS: &str = "Runtime errors detected";
pub const REASON_INCONSISTENT_TYPES: &str = "Inconsistent output types";
pub const REASON_NO_ORACLE: &str = "No oracle available (all tests unknown)";
pub const REASON_ALL_EMPTY: &str = "All outputs empty (possible underfitting)";

const PENALTY_FAILED: i32 = 40;
const PENALTY_ERRORS: i32 = 30;
const PENALTY_INCONSISTENT_TYPES: i32 = 20;
const PENALTY_NO_ORACLE: i32 = 10;
const PENALTY_ALL_EMPTY: i32 = 10;

pub fn score(results: &[ExecutionResult], summary: &ReviewSummary) -> ConfidenceReport {
    let mut score: i32 = 100;
    let mut reasons = Vec::new();

    if summary.failed > 0 {
        score -= PENALTY_FAILED;
        reasons.push(REASON_FAILED.to_string());
    }

    if results.iter().any(|r| r.error.is_some()) {
        score -= PENALTY_ERRORS;
        reasons.push(REASON_ERRORS.to_string());
    }

    let returned: Vec<&ExecutionResult> = results
        .iter()
        .filter(|r| r.output.as_ref().is_some_and(|o| !o.is_null()))
        .collect();
    let outputs: Vec<_> = returned.iter().filter_map(|r| r.output.as_ref()).collect();

    let types: BTreeSet<&str> = returned
        .iter()
        .filter_map(|r| r.output_type_name())
        .collect();
    if types.len() > 1 {
        score -= PENALTY_INCONSISTENT_TYPES;
        reasons.push(REASON_INCONSISTENT_TYPES.to_string());
    }

    // Also applies to an empty run: zero unknown out of zero tests
    if summary.unknown == summary.total_tests {
        score -= PENALTY_NO_ORACLE;
        reasons.push(REASON_NO_ORACLE.to_string());
    }

    if !outputs.is_empty() && outputs.iter().all(|o| o.is_empty_collection()) {
        score -= PENALTY_ALL_EMPTY;
        reasons.push(REASON_ALL_EMPTY.to_string());
    }

    ConfidenceReport::new(score.clamp(0, 100) as u8, reasons)
}
