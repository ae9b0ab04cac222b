/// Review audit trail
///
/// Every review stage emits one structured event carrying the review id.
/// Events always go through the `log` facade; when an audit path is
/// configured they are also appended to it as JSON lines.
use crate::config::types::{ReviewError, Result};
use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditSeverity {
    High,
    Medium,
    Low,
}

/// Review lifecycle stages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewEventType {
    ReviewStart,
    NoCanonicalTests,
    SanitizationFailed,
    Sanitized,
    OracleBackfill,
    SandboxLoadFailed,
    SandboxLoaded,
    TestsExecuted,
    ReviewEnd,
}

impl ReviewEventType {
    pub fn default_severity(&self) -> AuditSeverity {
        match self {
            ReviewEventType::SanitizationFailed | ReviewEventType::SandboxLoadFailed => {
                AuditSeverity::High
            }
            ReviewEventType::NoCanonicalTests => AuditSeverity::Medium,
            _ => AuditSeverity::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub event_type: ReviewEventType,
    pub severity: AuditSeverity,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub review_id: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_digest: Option<String>,
}

impl ReviewEvent {
    pub fn new(event_type: ReviewEventType, review_id: &Uuid, details: impl Into<String>) -> Self {
        Self {
            event_type,
            severity: event_type.default_severity(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            review_id: review_id.to_string(),
            details: details.into(),
            function_name: None,
            intent: None,
            code_digest: None,
        }
    }

    pub fn with_function(mut self, name: &str) -> Self {
        self.function_name = Some(name.to_string());
        self
    }

    pub fn with_intent(mut self, intent: &str) -> Self {
        self.intent = Some(intent.to_string());
        self
    }

    pub fn with_digest(mut self, digest: &str) -> Self {
        self.code_digest = Some(digest.to_string());
        self
    }
}

/// Writes audit events to the log and, optionally, a JSONL file
#[derive(Clone, Default)]
pub struct AuditLogger {
    sink: Option<Arc<Mutex<File>>>,
    path: Option<PathBuf>,
}

impl AuditLogger {
    /// Log-only audit trail
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn to_file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ReviewError::Config(format!("Failed to create audit log directory: {}", e))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ReviewError::Config(format!("Failed to open audit log: {}", e)))?;

        Ok(Self {
            sink: Some(Arc::new(Mutex::new(file))),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn from_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::to_file(path),
            None => Ok(Self::disabled()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, event: ReviewEvent) {
        match event.severity {
            AuditSeverity::High | AuditSeverity::Medium => warn!(
                "review {} {:?}: {}",
                event.review_id, event.event_type, event.details
            ),
            AuditSeverity::Low => info!(
                "review {} {:?}: {}",
                event.review_id, event.event_type, event.details
            ),
        }

        let Some(sink) = &self.sink else {
            return;
        };
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to encode audit event: {}", e);
                return;
            }
        };
        match sink.lock() {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
                    warn!("Failed to write audit log: {}", e);
                }
            }
            Err(_) => warn!("Failed to acquire lock on audit log"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_event_shape() {
        let id = Uuid::new_v4();
        let event = ReviewEvent::new(ReviewEventType::Sanitized, &id, "2 definitions")
            .with_function("fib")
            .with_digest("abc");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "sanitized");
        assert_eq!(json["severity"], "Low");
        assert_eq!(json["review_id"], id.to_string());
        assert_eq!(json["function_name"], "fib");
        assert!(json.get("intent").is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");
        let logger = AuditLogger::to_file(&path).unwrap();
        let id = Uuid::new_v4();
        logger.record(ReviewEvent::new(ReviewEventType::ReviewStart, &id, "start"));
        logger.record(ReviewEvent::new(ReviewEventType::ReviewEnd, &id, "end"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let last: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(last["event_type"], "review_end");
    }

    #[test]
    fn test_disabled_logger_has_no_path() {
        let logger = AuditLogger::from_path(None).unwrap();
        assert!(logger.path().is_none());
        logger.record(ReviewEvent::new(
            ReviewEventType::SandboxLoadFailed,
            &Uuid::new_v4(),
            "boom",
        ));
    }
}
