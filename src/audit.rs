//! Audit trail for lease state transitions.
//!
//! Every mutation of the pool (assignment, release, expiry, injected
//! failure) produces one [`AuditEvent`]. Events are delivered to an
//! [`AuditSink`] after the pool has committed the state change, so a failed
//! write never rolls back an allocation; delivery is at-least-once and
//! best-effort.
//!
//! The file sink appends one line per event and never rewrites earlier
//! lines. Lines carry a ctime-style timestamp prefix:
//!
//! ```text
//! Tue Aug  4 10:15:42 2026: IP 192.168.1.100 assigned to Device_1.
//! ```

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::Result;

/// What kind of state transition an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    /// An address was handed out to a client.
    Assigned,
    /// A client explicitly gave its address back.
    Released,
    /// The expiry sweep reclaimed an address.
    Expired,
    /// Failure injection disconnected a client.
    ForcedFailure,
}

impl AuditKind {
    /// Stable tag used in audit lines and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Released => "released",
            Self::Expired => "expired",
            Self::ForcedFailure => "forced-failure",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single append-only audit record.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// When the transition was committed.
    pub timestamp: DateTime<Utc>,

    /// The client whose lease changed.
    pub client_id: String,

    /// The address involved in the transition.
    pub address: Ipv4Addr,

    /// The kind of transition.
    pub kind: AuditKind,
}

impl AuditEvent {
    /// Creates an event stamped with the current time.
    pub fn new(kind: AuditKind, client_id: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            timestamp: Utc::now(),
            client_id: client_id.into(),
            address,
            kind,
        }
    }

    /// Human-readable message body, without the timestamp prefix.
    pub fn message(&self) -> String {
        match self.kind {
            AuditKind::Assigned => {
                format!("IP {} assigned to {}.", self.address, self.client_id)
            }
            AuditKind::Released => {
                format!("IP {} released by {}.", self.address, self.client_id)
            }
            AuditKind::Expired => {
                format!(
                    "Lease on {} held by {} expired.",
                    self.address, self.client_id
                )
            }
            AuditKind::ForcedFailure => {
                format!(
                    "Network failure: {} disconnected, {} reclaimed.",
                    self.client_id, self.address
                )
            }
        }
    }

    /// Full log line: ctime-style timestamp, colon, message.
    pub fn log_line(&self) -> String {
        format!(
            "{}: {}",
            self.timestamp.format("%a %b %e %H:%M:%S %Y"),
            self.message()
        )
    }
}

/// Destination for audit events.
///
/// Implementations must append events in the order they are emitted and
/// never rewrite what was already recorded.
pub trait AuditSink: Send + Sync {
    /// Records one event.
    fn emit(&self, event: &AuditEvent) -> Result<()>;
}

/// Appends audit lines to a text file.
///
/// The file is opened in append mode for every event, so concurrent
/// processes tailing the log always see whole lines.
#[derive(Debug, Clone)]
pub struct FileAuditSink {
    path: PathBuf,
}

impl FileAuditSink {
    /// Creates a sink writing to `path`. The file is created on first emit.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", event.log_line())?;
        Ok(())
    }
}

/// Collects audit events in memory.
///
/// Used by tests and by presentation layers that mirror the audit trail
/// into a scrollback view.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event emitted so far, in emission order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestGuard(String);
    impl Drop for TestGuard {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn event(kind: AuditKind) -> AuditEvent {
        AuditEvent::new(kind, "Device_1", Ipv4Addr::new(192, 168, 1, 100))
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(AuditKind::Assigned.as_str(), "assigned");
        assert_eq!(AuditKind::Released.as_str(), "released");
        assert_eq!(AuditKind::Expired.as_str(), "expired");
        assert_eq!(AuditKind::ForcedFailure.as_str(), "forced-failure");
    }

    #[test]
    fn test_messages_name_client_and_address() {
        for kind in [
            AuditKind::Assigned,
            AuditKind::Released,
            AuditKind::Expired,
            AuditKind::ForcedFailure,
        ] {
            let message = event(kind).message();
            assert!(message.contains("Device_1"), "{message}");
            assert!(message.contains("192.168.1.100"), "{message}");
        }
    }

    #[test]
    fn test_log_line_has_timestamp_prefix() {
        let event = event(AuditKind::Assigned);
        let line = event.log_line();
        let (prefix, message) = line.split_once(": ").unwrap();
        // ctime style: "Tue Aug  4 10:15:42 2026"
        assert_eq!(prefix.split_whitespace().count(), 5);
        assert_eq!(message, event.message());
    }

    #[test]
    fn test_file_sink_appends_one_line_per_event() {
        let path = "test_audit_append.log".to_string();
        let _guard = TestGuard(path.clone());
        let sink = FileAuditSink::new(&path);

        sink.emit(&event(AuditKind::Assigned)).unwrap();
        sink.emit(&event(AuditKind::Released)).unwrap();
        sink.emit(&event(AuditKind::Expired)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("assigned to Device_1"));
        assert!(lines[1].contains("released by Device_1"));
        assert!(lines[2].contains("expired"));
    }

    #[test]
    fn test_memory_sink_preserves_order() {
        let sink = MemoryAuditSink::new();
        sink.emit(&event(AuditKind::Assigned)).unwrap();
        sink.emit(&event(AuditKind::ForcedFailure)).unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, AuditKind::Assigned);
        assert_eq!(events[1].kind, AuditKind::ForcedFailure);
    }
}
