//! Partitioned Writer
//!
//! Stamps validated records with submitter identity and a canonical
//! timestamp, then appends them to the day partition for the current
//! processing date. Late-arriving events therefore land in "today's"
//! partition, not the partition of their own timestamp.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::domain::Principal;
use crate::infrastructure::EventStore;

/// Category tag applied to every stored record
pub const CATEGORY_TAG: &str = "osquery";

pub struct PartitionedWriter {
    store: Arc<dyn EventStore>,
}

impl PartitionedWriter {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Partition name for a processing date: `flock-YYYY-MM-DD`
    pub fn partition_for(date: DateTime<Utc>) -> String {
        format!("flock-{}", date.format("%Y-%m-%d"))
    }

    /// Stamp and append each record, returning the stamped records in batch
    /// order. An append failure is logged and does not abort siblings; there
    /// is no dedup, so a retried batch appends a second copy of everything.
    pub async fn write(&self, docs: Vec<Value>, principal: &Principal) -> Vec<Value> {
        let partition = Self::partition_for(Utc::now());
        let mut stored = Vec::with_capacity(docs.len());

        for mut doc in docs {
            stamp(&mut doc, principal);
            if let Err(e) = self
                .store
                .append(&partition, CATEGORY_TAG, doc.clone())
                .await
            {
                warn!(partition, error = %e, "Failed to append record, continuing");
            }
            stored.push(doc);
        }

        stored
    }
}

fn stamp(doc: &mut Value, principal: &Principal) {
    let Some(fields) = doc.as_object_mut() else {
        return;
    };

    if let Some(secs) = fields.get("unixTime").and_then(epoch_seconds) {
        if let Some(timestamp) = format_timestamp(secs) {
            fields.insert("@timestamp".to_string(), Value::String(timestamp));
        }
    }

    fields.insert(
        "username".to_string(),
        Value::String(principal.username.clone()),
    );
    fields.insert("user_name".to_string(), Value::String(principal.name.clone()));
}

/// Accepts an integer, a float (truncated to whole seconds), or a numeric
/// string; anything else is a passthrough
fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn format_timestamp(secs: i64) -> Option<String> {
    let time = Utc.timestamp_opt(secs, 0).single()?;
    Some(time.format("%Y-%m-%dT%H:%M:%S.000Z").to_string())
}
