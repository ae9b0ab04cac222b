use crate::exec::types::ExecutionError;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Per-test classification - closed set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TestStatus {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
    /// No oracle, or the input itself was unusable
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

/// Overall review status - closed set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerdictStatus {
    #[serde(rename = "FAIL")]
    Fail,
    /// Some tests passed, others could not be judged
    #[serde(rename = "PARTIAL")]
    Partial,
    #[serde(rename = "PASS")]
    Pass,
    /// Nothing failed but nothing could be checked either
    #[serde(rename = "PASS_WITHOUT_ORACLE")]
    PassWithoutOracle,
}

impl VerdictStatus {
    pub fn is_failure(&self) -> bool {
        *self == VerdictStatus::Fail
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictStatus::Fail => write!(f, "FAIL"),
            VerdictStatus::Partial => write!(f, "PARTIAL"),
            VerdictStatus::Pass => write!(f, "PASS"),
            VerdictStatus::PassWithoutOracle => write!(f, "PASS_WITHOUT_ORACLE"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            85..=u8::MAX => ConfidenceLevel::High,
            60..=84 => ConfidenceLevel::Medium,
            40..=59 => ConfidenceLevel::Low,
            _ => ConfidenceLevel::VeryLow,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfidenceReport {
    /// 0..=100
    pub confidence_score: u8,
    pub confidence_level: ConfidenceLevel,
    pub reasons: Vec<String>,
}

impl ConfidenceReport {
    pub fn new(score: u8, reasons: Vec<String>) -> Self {
        let score = score.min(100);
        Self {
            confidence_score: score,
            confidence_level: ConfidenceLevel::from_score(score),
            reasons,
        }
    }
}

/// Counters the confidence scorer works from
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewSummary {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl ReviewSummary {
    pub fn record(&mut self, status: TestStatus) {
        self.total_tests += 1;
        match status {
            TestStatus::Pass => self.passed += 1,
            TestStatus::Fail => self.failed += 1,
            TestStatus::Unknown => self.unknown += 1,
        }
    }

    /// Overall status, first matching rule wins:
    /// any failure, pass+unknown, pass, unknown, nothing.
    pub fn status(&self) -> VerdictStatus {
        if self.failed > 0 {
            VerdictStatus::Fail
        } else if self.passed > 0 && self.unknown > 0 {
            VerdictStatus::Partial
        } else if self.passed > 0 {
            VerdictStatus::Pass
        } else if self.unknown > 0 {
            VerdictStatus::PassWithoutOracle
        } else {
            VerdictStatus::Fail
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TestOutcome {
    pub name: String,
    pub expected: Option<Value>,
    pub actual: Option<Value>,
    pub error: Option<ExecutionError>,
    pub status: TestStatus,
}

/// Final review verdict, the external JSON contract
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ReviewVerdict {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub unknown: usize,
    pub status: VerdictStatus,
    pub confidence: ConfidenceReport,
    pub results: Vec<TestOutcome>,
}

impl ReviewVerdict {
    /// FAIL verdict with no tests and a fixed confidence
    pub fn rejected(confidence: ConfidenceReport) -> Self {
        Self {
            total_tests: 0,
            passed: 0,
            failed: 0,
            unknown: 0,
            status: VerdictStatus::Fail,
            confidence,
            results: Vec::new(),
        }
    }

    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary {
            total_tests: self.total_tests,
            passed: self.passed,
            failed: self.failed,
            unknown: self.unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(passed: usize, failed: usize, unknown: usize) -> ReviewSummary {
        ReviewSummary {
            total_tests: passed + failed + unknown,
            passed,
            failed,
            unknown,
        }
    }

    #[test]
    fn test_status_precedence() {
        assert_eq!(summary(3, 1, 2).status(), VerdictStatus::Fail);
        assert_eq!(summary(2, 0, 1).status(), VerdictStatus::Partial);
        assert_eq!(summary(2, 0, 0).status(), VerdictStatus::Pass);
        assert_eq!(summary(0, 0, 2).status(), VerdictStatus::PassWithoutOracle);
        assert_eq!(summary(0, 0, 0).status(), VerdictStatus::Fail);
    }

    #[test]
    fn test_confidence_level_thresholds() {
        assert_eq!(ConfidenceLevel::from_score(100), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(85), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(84), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(60), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(59), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(40), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(39), ConfidenceLevel::VeryLow);
        assert_eq!(ConfidenceLevel::from_score(0), ConfidenceLevel::VeryLow);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&VerdictStatus::PassWithoutOracle).unwrap(),
            "\"PASS_WITHOUT_ORACLE\""
        );
        assert_eq!(
            serde_json::to_string(&ConfidenceLevel::VeryLow).unwrap(),
            "\"VERY_LOW\""
        );
        assert_eq!(serde_json::to_string(&TestStatus::Unknown).unwrap(), "\"UNKNOWN\"");
    }

    #[test]
    fn test_rejected_verdict_shape() {
        let verdict = ReviewVerdict::rejected(ConfidenceReport::new(0, vec!["bad".into()]));
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["status"], "FAIL");
        assert_eq!(json["total_tests"], 0);
        assert_eq!(json["confidence"]["confidence_level"], "VERY_LOW");
        assert!(json["results"].as_array().unwrap().is_empty());
    }
}
