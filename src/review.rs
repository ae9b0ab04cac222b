//! Review orchestration.
//!
//! Chains sanitization, test selection, oracle backfill, sandbox load,
//! execution and validation into one report. [`Reviewer::review`] is total:
//! every failure mode becomes a disposition on the report, never an `Err`.

use crate::config::presets::SandboxPolicy;
use crate::config::types::{Result, ReviewConfig, SanitizationError};
use crate::exec::executor::Executor;
use crate::exec::types::{ExecutionError, ExecutionErrorKind, ExecutionResult, TestCase};
use crate::observability::audit::{AuditLogger, ReviewEvent, ReviewEventType};
use crate::oracle::canonical::canonical_tests;
use crate::oracle::lookup;
use crate::sandbox::Sandbox;
use crate::sanitizer::{extract_function_name, sanitize};
use crate::verdict::{validate, ConfidenceReport, ReviewVerdict};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Intent assumed when a request names none
pub const DEFAULT_INTENT: &str = "general";

pub const NO_CANONICAL_TESTS_REASON: &str = "No canonical test cases available";

const NO_CANONICAL_TESTS_CONFIDENCE: u8 = 10;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub code: String,
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub test_cases: Option<Vec<TestCase>>,
}

impl ReviewRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn with_intent(mut self, intent: &str) -> Self {
        self.intent = Some(intent.to_string());
        self
    }

    pub fn with_function(mut self, name: &str) -> Self {
        self.function_name = Some(name.to_string());
        self
    }

    pub fn with_tests(mut self, tests: Vec<TestCase>) -> Self {
        self.test_cases = Some(tests);
        self
    }

    pub fn intent(&self) -> &str {
        self.intent
            .as_deref()
            .filter(|i| !i.is_empty())
            .unwrap_or(DEFAULT_INTENT)
    }
}

/// How far a review got
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Reviewed,
    NoCanonicalTests,
    SanitizationFailed,
    SandboxFailed,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReviewReport {
    pub review_id: Uuid,
    pub intent: String,
    pub function_name: Option<String>,
    pub disposition: Disposition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub verdict: ReviewVerdict,
}

pub struct Reviewer {
    sandbox: Sandbox,
    audit: AuditLogger,
}

impl Reviewer {
    /// Build a reviewer; the audit sink comes from `config.audit_log`.
    pub fn new(config: ReviewConfig, policy: Arc<SandboxPolicy>) -> Result<Self> {
        let audit = AuditLogger::from_path(config.audit_log.as_deref())?;
        let sandbox = Sandbox::new(config, policy)?;
        Ok(Self { sandbox, audit })
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = audit;
        self
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn review(&self, request: &ReviewRequest) -> ReviewReport {
        let review_id = Uuid::new_v4();
        let intent = request.intent().to_string();
        let mut report = ReviewReport {
            review_id,
            intent: intent.clone(),
            function_name: request.function_name.clone(),
            disposition: Disposition::Reviewed,
            code_digest: None,
            error: None,
            verdict: ReviewVerdict::rejected(ConfidenceReport::new(0, Vec::new())),
        };
        self.audit.record(
            ReviewEvent::new(
                ReviewEventType::ReviewStart,
                &review_id,
                format!("{} bytes of candidate code", request.code.len()),
            )
            .with_intent(&intent),
        );

        let tests = match &request.test_cases {
            Some(tests) if !tests.is_empty() => tests.clone(),
            _ => canonical_tests(&intent),
        };
        if tests.is_empty() {
            self.audit.record(
                ReviewEvent::new(
                    ReviewEventType::NoCanonicalTests,
                    &review_id,
                    NO_CANONICAL_TESTS_REASON,
                )
                .with_intent(&intent),
            );
            report.disposition = Disposition::NoCanonicalTests;
            report.verdict = ReviewVerdict::rejected(ConfidenceReport::new(
                NO_CANONICAL_TESTS_CONFIDENCE,
                vec![NO_CANONICAL_TESTS_REASON.to_string()],
            ));
            return self.finish(report);
        }

        let sanitized = sanitize(&self.sandbox, &request.code).and_then(|artifact| {
            let name = match &request.function_name {
                Some(name) if !name.is_empty() => name.clone(),
                _ => extract_function_name(&artifact)?,
            };
            Ok::<_, SanitizationError>((artifact, name))
        });
        let (artifact, function_name) = match sanitized {
            Ok(parts) => parts,
            Err(e) => {
                let message = e.to_string();
                self.audit.record(ReviewEvent::new(
                    ReviewEventType::SanitizationFailed,
                    &review_id,
                    message.clone(),
                ));
                report.disposition = Disposition::SanitizationFailed;
                report.verdict =
                    ReviewVerdict::rejected(ConfidenceReport::new(0, vec![message.clone()]));
                report.error = Some(message);
                return self.finish(report);
            }
        };
        report.function_name = Some(function_name.clone());
        report.code_digest = Some(artifact.digest.clone());
        self.audit.record(
            ReviewEvent::new(
                ReviewEventType::Sanitized,
                &review_id,
                format!(
                    "{} definitions, {} imports kept",
                    artifact.definitions.len(),
                    artifact.imports
                ),
            )
            .with_function(&function_name)
            .with_digest(&artifact.digest),
        );

        let (tests, filled) = backfill_expected(&intent, tests);
        if filled > 0 {
            self.audit.record(
                ReviewEvent::new(
                    ReviewEventType::OracleBackfill,
                    &review_id,
                    format!("oracle filled {} of {} expected values", filled, tests.len()),
                )
                .with_intent(&intent),
            );
        }

        let callable = match self
            .sandbox
            .load(&artifact.sanitized)
            .and_then(|namespace| self.sandbox.extract(&namespace, &function_name))
        {
            Ok(callable) => callable,
            Err(e) => {
                let message = e.to_string();
                self.audit.record(
                    ReviewEvent::new(ReviewEventType::SandboxLoadFailed, &review_id, message.clone())
                        .with_function(&function_name),
                );
                let results: Vec<ExecutionResult> = tests
                    .iter()
                    .map(|test| {
                        ExecutionResult::failure(
                            test,
                            ExecutionError::new(ExecutionErrorKind::Sandbox, message.clone()),
                        )
                    })
                    .collect();
                report.disposition = Disposition::SandboxFailed;
                report.verdict = validate(&results, &tests);
                report.error = Some(message);
                return self.finish(report);
            }
        };
        self.audit.record(
            ReviewEvent::new(
                ReviewEventType::SandboxLoaded,
                &review_id,
                format!("{} takes {} parameters", callable.name(), callable.arity()),
            )
            .with_function(&function_name),
        );

        let results = Executor::new(&self.sandbox).run(&callable, &tests);
        let errors = results.iter().filter(|r| r.error.is_some()).count();
        self.audit.record(
            ReviewEvent::new(
                ReviewEventType::TestsExecuted,
                &review_id,
                format!("{} tests executed, {} with errors", results.len(), errors),
            )
            .with_function(&function_name),
        );

        report.verdict = validate(&results, &tests);
        self.finish(report)
    }

    fn finish(&self, report: ReviewReport) -> ReviewReport {
        self.audit.record(
            ReviewEvent::new(
                ReviewEventType::ReviewEnd,
                &report.review_id,
                format!(
                    "{:?}: {} (confidence {})",
                    report.disposition,
                    report.verdict.status,
                    report.verdict.confidence.confidence_score
                ),
            )
            .with_intent(&report.intent),
        );
        report
    }
}

/// Fill missing expectations from the intent's oracle, if it has one.
/// Returns the new tests and how many were filled.
pub fn backfill_expected(intent: &str, tests: Vec<TestCase>) -> (Vec<TestCase>, usize) {
    let Some(oracle) = lookup(intent) else {
        return (tests, 0);
    };

    let mut filled = 0;
    let tests = tests
        .into_iter()
        .map(|test| {
            if test.expected_value().is_some() {
                return test;
            }
            match oracle.expected(&test.input) {
                Some(expected) => {
                    filled += 1;
                    test.with_expected(expected)
                }
                None => test,
            }
        })
        .collect();
    (tests, filled)
}
