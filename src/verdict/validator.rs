/// Result validation
///
/// Classifies each execution result against its test case and derives the
/// overall verdict. Never fails: missing expectations and unusable inputs
/// surface as UNKNOWN, not as errors.
use crate::exec::types::{ExecutionResult, TestCase};
use crate::verdict::confidence::score;
use crate::verdict::types::{ReviewSummary, ReviewVerdict, TestOutcome, TestStatus};

/// Classify one result:
/// coercion error -> UNKNOWN, other error -> FAIL, no expectation -> UNKNOWN,
/// equal -> PASS, otherwise FAIL.
pub fn classify(result: &ExecutionResult, test: Option<&TestCase>) -> TestStatus {
    if let Some(error) = &result.error {
        return if error.is_coercion() {
            TestStatus::Unknown
        } else {
            TestStatus::Fail
        };
    }
    match test.and_then(TestCase::expected_value) {
        None => TestStatus::Unknown,
        Some(expected) if result.output.as_ref() == Some(expected) => TestStatus::Pass,
        Some(_) => TestStatus::Fail,
    }
}

/// Test case that produced `result`: the one at the same position when the
/// names line up, otherwise the last test with that name.
fn matching_test<'a>(
    index: usize,
    result: &ExecutionResult,
    tests: &'a [TestCase],
) -> Option<&'a TestCase> {
    match tests.get(index) {
        Some(test) if test.name == result.name => Some(test),
        _ => tests.iter().rev().find(|t| t.name == result.name),
    }
}

pub fn validate(results: &[ExecutionResult], tests: &[TestCase]) -> ReviewVerdict {
    let mut summary = ReviewSummary::default();
    let mut outcomes = Vec::with_capacity(results.len());

    for (index, result) in results.iter().enumerate() {
        let test = matching_test(index, result, tests);
        let status = classify(result, test);
        summary.record(status);
        outcomes.push(TestOutcome {
            name: result.name.clone(),
            expected: test.and_then(|t| t.expected.clone()),
            actual: result.output.clone(),
            error: result.error.clone(),
            status,
        });
    }

    let status = summary.status();
    let confidence = score(results, &summary);
    log::info!(
        "verdict {}: {} passed, {} failed, {} unknown, confidence {}",
        status,
        summary.passed,
        summary.failed,
        summary.unknown,
        confidence.confidence_score
    );

    ReviewVerdict {
        total_tests: summary.total_tests,
        passed: summary.passed,
        failed: summary.failed,
        unknown: summary.unknown,
        status,
        confidence,
        results: outcomes,
    }
}
