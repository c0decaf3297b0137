//! Notification Classifier
//!
//! Pure functions over one batch. Telemetry batches get the
//! singleton-vs-burst policy: one matching record emits that record, more
//! than one collapses into a single summary per kind, which is the
//! backpressure against flooding the chat channel when an agent reports many
//! simultaneous changes. Flock-log batches classify structurally, one event
//! per state-change record.

use serde_json::{json, Value};

use crate::domain::{NotificationEvent, Principal};
use crate::notifications::ConfigSnapshot;

/// Log-event types that produce a notification
const STATE_CHANGE_TYPES: [&str; 4] = [
    "server_enabled",
    "server_disabled",
    "twigs_enabled",
    "twigs_disabled",
];

/// Log-event types whose notification carries the affected twig identifiers
const TWIG_STATE_TYPES: [&str; 2] = ["twigs_enabled", "twigs_disabled"];

/// Group stored telemetry records by notification kind and apply the
/// singleton-vs-burst policy. Kind order follows first occurrence in the
/// batch; kinds with zero matches emit nothing.
pub fn classify_telemetry(
    docs: &[Value],
    snapshot: &ConfigSnapshot,
    principal: &Principal,
) -> Vec<NotificationEvent> {
    let eligible = snapshot.osquery_kinds();

    // First-seen-ordered grouping; batches are small enough for a scan
    let mut groups: Vec<(&str, Vec<&Value>)> = Vec::new();
    for doc in docs {
        let Some(name) = doc.get("name").and_then(Value::as_str) else {
            continue;
        };
        if !eligible.iter().any(|kind| *kind == name) {
            continue;
        }
        match groups.iter_mut().find(|(kind, _)| *kind == name) {
            Some((_, records)) => records.push(doc),
            None => groups.push((name, vec![doc])),
        }
    }

    groups
        .into_iter()
        .map(|(kind, records)| {
            if records.len() == 1 {
                NotificationEvent::singleton(kind, records[0].clone())
            } else {
                let mut added = 0;
                let mut removed = 0;
                let mut other = 0;
                for record in &records {
                    match record.get("action").and_then(Value::as_str) {
                        Some("added") => added += 1,
                        Some("removed") => removed += 1,
                        _ => other += 1,
                    }
                }
                NotificationEvent::summary(
                    kind,
                    &principal.username,
                    &principal.name,
                    added,
                    removed,
                    other,
                )
            }
        })
        .collect()
}

/// One notification per state-change log event, no summarization
pub fn classify_flock_logs(docs: &[Value], principal: &Principal) -> Vec<NotificationEvent> {
    docs.iter()
        .filter_map(|doc| {
            let event_type = doc.get("type").and_then(Value::as_str)?;
            if !STATE_CHANGE_TYPES.iter().any(|t| *t == event_type) {
                return None;
            }

            let mut details = json!({
                "username": principal.username,
                "name": principal.name,
            });
            if TWIG_STATE_TYPES.iter().any(|t| *t == event_type) {
                if let Some(twig_ids) = doc.get("twig_ids") {
                    details["twig_ids"] = twig_ids.clone();
                }
            }
            Some(NotificationEvent::details(event_type, details))
        })
        .collect()
}
