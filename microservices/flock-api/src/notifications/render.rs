//! Per-kind message templates
//!
//! Turns a notification event into the human-readable chat message. Osquery
//! kinds get either a burst-summary layout or a single-change layout; user
//! and flock kinds render their details verbatim as a code block.

use serde_json::Value;

use crate::domain::NotificationEvent;
use crate::notifications::catalog::{Category, KindSpec};

pub fn render(event: &NotificationEvent, spec: &KindSpec) -> String {
    let body = match spec.category {
        Category::Osquery if event.is_summary() => render_summary(&event.payload),
        Category::Osquery => render_single_change(&event.payload),
        _ => render_details(&event.payload),
    };

    if spec.warning {
        format!(
            "@here **:warning: :rotating_light:{}:rotating_light:**:\n{}",
            spec.description, body
        )
    } else {
        format!("**{}:**\n{}", spec.description, body)
    }
}

fn render_summary(payload: &Value) -> String {
    let username = str_field(payload, "username");
    let name = str_field(payload, "name");
    let added = count_field(payload, "added_count");
    let removed = count_field(payload, "removed_count");
    let other = count_field(payload, "other_count");

    let mut message = format!("- Computer: **{name}** (`{username}`)");
    if added > 0 {
        message.push_str(&format!("\n- **{added}** added"));
    }
    if removed > 0 {
        message.push_str(&format!("\n- **{removed}** removed"));
    }
    if other > 0 {
        message.push_str(&format!("\n- **{other}** unknown action"));
    }
    message
}

fn render_single_change(payload: &Value) -> String {
    let username = str_field(payload, "hostIdentifier");
    let name = str_field(payload, "user_name");
    let action = str_field(payload, "action");
    let time = str_field(payload, "calendarTime");
    let columns = pretty(payload.get("columns").unwrap_or(&Value::Null));

    format!(
        "- Computer: **{name}** (`{username}`)\n- Date: {time}\n- Action: {action}\n```\n{columns}```"
    )
}

fn render_details(payload: &Value) -> String {
    format!("```{}```", pretty(payload))
}

fn str_field<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or("")
}

fn count_field(payload: &Value, key: &str) -> u64 {
    payload.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
