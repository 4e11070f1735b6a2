use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const AUDIT_FILE: &str = "audit.jsonl";

/// One line of the consultation audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event_type: String,
    pub access_key: String,
    pub endpoint: Option<String>,
    pub response_hash: Option<String>,
    pub c_stat: Option<String>,
    pub error: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: &str, access_key: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event_type: event_type.to_string(),
            access_key: access_key.to_string(),
            endpoint: None,
            response_hash: None,
            c_stat: None,
            error: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_hash(mut self, hash: String) -> Self {
        self.response_hash = Some(hash);
        self
    }

    pub fn with_c_stat(mut self, c_stat: Option<String>) -> Self {
        self.c_stat = c_stat;
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

pub fn audit_log_path(dir: &Path) -> PathBuf {
    dir.join(AUDIT_FILE)
}

/// Append `event` as one JSON line to `<dir>/audit.jsonl`.
pub fn write_audit_event(dir: &Path, event: &AuditEvent) -> Result<()> {
    let path = audit_log_path(dir);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open audit log {}", path.display()))?;

    let json = serde_json::to_string(event)?;
    writeln!(file, "{}", json)?;
    tracing::debug!(event_type = %event.event_type, key = %event.access_key, "Audit event written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_audit_events(dir: &Path) -> Vec<AuditEvent> {
        std::fs::read_to_string(audit_log_path(dir))
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        write_audit_event(
            dir.path(),
            &AuditEvent::new("query_sent", "123").with_endpoint("https://sefaz"),
        )
        .unwrap();
        write_audit_event(
            dir.path(),
            &AuditEvent::new("status_parsed", "123")
                .with_hash("abc".into())
                .with_c_stat(Some("100".into())),
        )
        .unwrap();
        write_audit_event(
            dir.path(),
            &AuditEvent::new("transport_failed", "123").with_error("HTTP 500".into()),
        )
        .unwrap();

        let events = read_audit_events(dir.path());
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].endpoint.as_deref(), Some("https://sefaz"));
        assert_eq!(events[1].c_stat.as_deref(), Some("100"));
        assert_eq!(events[1].response_hash.as_deref(), Some("abc"));
        assert_eq!(events[2].error.as_deref(), Some("HTTP 500"));
        assert!(chrono::DateTime::parse_from_rfc3339(&events[0].timestamp).is_ok());
    }
}
