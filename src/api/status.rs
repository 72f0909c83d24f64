use serde::{Deserialize, Serialize};

use crate::api::{lenient_count, lenient_flag};

/// A single line of the server side generation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLogEntry")]
pub struct LogEntry {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl LogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        LogEntry {
            message: message.into(),
            timestamp: None,
        }
    }
}

impl From<&str> for LogEntry {
    fn from(message: &str) -> Self {
        LogEntry::new(message)
    }
}

// The server sends either `{"message": .., "timestamp": ..}` objects or bare strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLogEntry {
    Text(String),
    Entry {
        message: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
}

impl From<RawLogEntry> for LogEntry {
    fn from(raw: RawLogEntry) -> Self {
        match raw {
            RawLogEntry::Text(message) => LogEntry {
                message,
                timestamp: None,
            },
            RawLogEntry::Entry { message, timestamp } => LogEntry { message, timestamp },
        }
    }
}

/// The payload of the generation status endpoint.
///
/// Counters and flags decode leniently: a missing or malformed value is read as `0`/`false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStatus {
    #[serde(default, deserialize_with = "lenient_flag::deserialize")]
    pub completed: bool,
    #[serde(default, deserialize_with = "lenient_flag::deserialize")]
    pub running: bool,
    #[serde(default, deserialize_with = "lenient_count::deserialize")]
    pub success_count: u32,
    #[serde(default, deserialize_with = "lenient_count::deserialize")]
    pub algorithms_completed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_log: Option<String>,
}

impl GenerationStatus {
    /// The log lines carried by this payload, in server order.
    ///
    /// `logs` wins over `last_log` when the server sends both.
    pub fn log_batch(&self) -> Vec<LogEntry> {
        match (&self.logs, &self.last_log) {
            (Some(logs), _) => logs.clone(),
            (None, Some(last_log)) => vec![LogEntry::new(last_log.as_str())],
            (None, None) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GenerationStatus, LogEntry};

    #[test]
    fn parse_status_with_logs() {
        let response = r#"
        {
            "completed": false,
            "success_count": 0,
            "algorithms_completed": 1,
            "logs": [
                { "message": "Starting Genetic Algorithm", "timestamp": "2024-03-01T10:00:00Z" },
                { "message": "Population size: 50" },
                "Best fitness: 0.82"
            ]
        }
        "#;
        let parsed = serde_json::from_str::<GenerationStatus>(response).unwrap();
        assert!(!parsed.completed);
        assert_eq!(parsed.algorithms_completed, 1);
        let batch = parsed.log_batch();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].timestamp.as_deref(), Some("2024-03-01T10:00:00Z"));
        assert_eq!(batch[1], LogEntry::new("Population size: 50"));
        assert_eq!(batch[2].message, "Best fitness: 0.82");
    }

    #[test]
    fn parse_status_with_last_log() {
        let response = r#"{ "completed": true, "success_count": 2, "last_log": "RL algorithm failed" }"#;
        let parsed = serde_json::from_str::<GenerationStatus>(response).unwrap();
        assert!(parsed.completed);
        assert_eq!(parsed.success_count, 2);
        assert_eq!(parsed.log_batch(), vec![LogEntry::new("RL algorithm failed")]);
    }

    #[test]
    fn malformed_counters_default_to_zero() {
        let response = r#"
        {
            "completed": true,
            "success_count": "many",
            "algorithms_completed": -1
        }
        "#;
        let parsed = serde_json::from_str::<GenerationStatus>(response).unwrap();
        assert_eq!(parsed.success_count, 0);
        assert_eq!(parsed.algorithms_completed, 0);

        let parsed = serde_json::from_str::<GenerationStatus>(r#"{ "success_count": null }"#).unwrap();
        assert_eq!(parsed.success_count, 0);
        assert!(!parsed.completed);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let response = r#"{ "completed": "yes", "success_count": "3", "algorithms_completed": 2.0 }"#;
        let parsed = serde_json::from_str::<GenerationStatus>(response).unwrap();
        assert!(!parsed.completed);
        assert_eq!(parsed.success_count, 3);
        assert_eq!(parsed.algorithms_completed, 2);
    }

    #[test]
    fn string_flags_are_accepted() {
        let response = r#"{ "completed": " True ", "running": "false" }"#;
        let parsed = serde_json::from_str::<GenerationStatus>(response).unwrap();
        assert!(parsed.completed);
        assert!(!parsed.running);

        let parsed = serde_json::from_str::<GenerationStatus>(r#"{ "completed": 1 }"#).unwrap();
        assert!(!parsed.completed);
    }

    #[test]
    fn empty_payload_has_no_logs() {
        let parsed = serde_json::from_str::<GenerationStatus>("{}").unwrap();
        assert_eq!(parsed, GenerationStatus::default());
        assert!(parsed.log_batch().is_empty());
    }
}
