//! Batch Validator
//!
//! Whole-batch, first-failure-wins validation. Nothing is written or
//! dispatched for a batch with even one bad element; partial acceptance
//! would desynchronize the summary counts from what was persisted.

use flock_core::{FlockError, Result};
use serde_json::Value;

/// Log-event types that must also carry a `twig_id`
const TWIG_EVENT_TYPES: [&str; 2] = ["enable_twig", "disable_twig"];

/// Validate a telemetry submission: an array of objects, each claiming the
/// submitter's own identity in `hostIdentifier`
pub fn validate_telemetry(body: &Value, username: &str) -> Result<Vec<Value>> {
    let docs = as_array(body)?;
    if docs.is_empty() {
        return Err(FlockError::Validation("Invalid JSON object".to_string()));
    }

    for (i, doc) in docs.iter().enumerate() {
        let Some(fields) = doc.as_object() else {
            return Err(FlockError::Validation(format!("Item {i} is not an object")));
        };
        if fields.get("hostIdentifier").and_then(Value::as_str) != Some(username) {
            return Err(FlockError::Validation(format!(
                "Item {i} does not contain the correct hostIdentifier"
            )));
        }
    }

    Ok(docs.to_vec())
}

/// Validate a flock-logs submission against the log-event schema
pub fn validate_flock_logs(body: &Value) -> Result<Vec<Value>> {
    let docs = as_array(body)?;

    for (i, doc) in docs.iter().enumerate() {
        let Some(fields) = doc.as_object() else {
            return Err(FlockError::Validation(format!("Item {i} is not an object")));
        };
        let Some(event_type) = fields.get("type") else {
            return Err(FlockError::Validation(format!(
                "Item {i} does not contain a type field"
            )));
        };
        if !fields.contains_key("timestamp") {
            return Err(FlockError::Validation(format!(
                "Item {i} does not contain a timestamp field"
            )));
        }
        let is_twig_event = event_type
            .as_str()
            .map(|t| TWIG_EVENT_TYPES.iter().any(|twig| *twig == t))
            .unwrap_or(false);
        if is_twig_event && !fields.contains_key("twig_id") {
            return Err(FlockError::Validation(format!(
                "Item {i} is about a twig, but does not contain a twig_id field"
            )));
        }
    }

    Ok(docs.to_vec())
}

fn as_array(body: &Value) -> Result<&Vec<Value>> {
    body.as_array()
        .ok_or_else(|| FlockError::Validation("Data is not an array".to_string()))
}
