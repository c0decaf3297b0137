//! Registered client identities

use serde::{Deserialize, Serialize};

/// A registered endpoint agent identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Unique machine identifier, restricted to `[A-Za-z0-9_-]`
    pub username: String,
    /// Human-readable display name
    pub name: String,
    /// Opaque auth token, compared exactly on every authenticated call
    pub token: String,
}

/// Characters that are silently stripped from display names
const NAME_STRIP_CHARS: &str = "`{}!@#$%^&*_";

/// Check the username charset: letters, numbers, '-' and '_' only
pub fn username_is_valid(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Strip disallowed characters from a display name rather than rejecting it
pub fn sanitize_display_name(name: &str) -> String {
    name.chars().filter(|c| !NAME_STRIP_CHARS.contains(*c)).collect()
}
