//! Credential Gate
//!
//! Basic-auth credential checking against the principal store. A lookup
//! error is a deny, never an error to the caller.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use std::sync::Arc;
use tracing::warn;

use crate::domain::Principal;
use crate::infrastructure::PrincipalStore;

pub struct CredentialGate {
    principals: Arc<dyn PrincipalStore>,
}

impl CredentialGate {
    pub fn new(principals: Arc<dyn PrincipalStore>) -> Self {
        Self { principals }
    }

    /// True iff the principal exists and its stored token equals the secret
    pub async fn authenticate(&self, username: &str, secret: &str) -> bool {
        match self.principals.get(username).await {
            Ok(Some(principal)) => principal.token == secret,
            Ok(None) => false,
            Err(e) => {
                warn!(username, error = %e, "Credential lookup failed, denying");
                false
            }
        }
    }

    /// Load the principal behind an already-authenticated username
    pub async fn principal(&self, username: &str) -> Option<Principal> {
        self.principals.get(username).await.ok().flatten()
    }
}

/// Parse an HTTP Basic Authorization header into (username, secret)
pub fn parse_basic_auth(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, secret) = credentials.split_once(':')?;
    Some((username.to_string(), secret.to_string()))
}

/// 32 hex chars, issued once at registration
pub fn generate_token() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
