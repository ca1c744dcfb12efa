//! Observer-facing events and log entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lead::LeadRecord;

/// Severity of a user-visible log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One line of the persisted run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}

/// Events broadcast to attached observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum AutomationEvent {
    Started {
        total: usize,
    },
    Progress {
        current: usize,
        total: usize,
        lead: LeadRecord,
    },
    LeadProcessed {
        lead: LeadRecord,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        problems: Vec<String>,
        current: usize,
        total: usize,
    },
    Completed {
        processed: usize,
        failed: usize,
        duration_ms: u64,
    },
    Stopped {
        reason: String,
    },
    Log(LogEntry),
    LeadsAvailable {
        count: usize,
    },
}

impl AutomationEvent {
    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Stopped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_serialization() {
        assert_eq!(serde_json::to_string(&LogLevel::Warning).unwrap(), "\"warning\"");
        assert_eq!(LogLevel::Success.to_string(), "success");
    }

    #[test]
    fn test_event_tagging() {
        let event = AutomationEvent::Completed {
            processed: 2,
            failed: 1,
            duration_ms: 4200,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "COMPLETED");
        assert_eq!(json["durationMs"], 4200);
        assert!(event.is_terminal());
    }

    #[test]
    fn test_log_event_flattens_entry() {
        let event = AutomationEvent::Log(LogEntry::new(LogLevel::Info, "hello"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "LOG");
        assert_eq!(json["level"], "info");
        assert_eq!(json["message"], "hello");
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_event_round_trip() {
        let event = AutomationEvent::LeadProcessed {
            lead: LeadRecord::new(3, "Jane", "Citizen"),
            success: false,
            error: Some("timeout".to_string()),
            problems: vec![],
            current: 1,
            total: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: AutomationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
