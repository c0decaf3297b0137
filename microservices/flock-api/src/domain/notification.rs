//! Notification events produced by batch classification

use serde_json::{json, Value};

/// An event eligible for delivery to the chat channel
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    /// Catalog-defined notification kind
    pub kind: String,
    /// Either a verbatim stored record, a burst summary, or plain details
    pub payload: Value,
}

impl NotificationEvent {
    /// Event carrying a single stored record verbatim
    pub fn singleton(kind: &str, record: Value) -> Self {
        Self {
            kind: kind.to_string(),
            payload: record,
        }
    }

    /// Burst summary for a kind that matched more than one record in a batch
    pub fn summary(
        kind: &str,
        username: &str,
        name: &str,
        added_count: u64,
        removed_count: u64,
        other_count: u64,
    ) -> Self {
        Self {
            kind: kind.to_string(),
            payload: json!({
                "type": "summary",
                "username": username,
                "name": name,
                "added_count": added_count,
                "removed_count": removed_count,
                "other_count": other_count,
            }),
        }
    }

    /// Event carrying arbitrary details (registration and flock-log kinds)
    pub fn details(kind: &str, payload: Value) -> Self {
        Self {
            kind: kind.to_string(),
            payload,
        }
    }

    pub fn is_summary(&self) -> bool {
        self.payload.get("type").and_then(Value::as_str) == Some("summary")
    }
}
