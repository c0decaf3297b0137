//! Principal Store - registered identities

use async_trait::async_trait;
use dashmap::DashMap;
use flock_core::{FlockError, Result};

use crate::domain::Principal;

/// Lookup and registration of principals, unique by username
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Insert a new principal; a taken username is a duplicate error and
    /// leaves the existing principal untouched
    async fn insert(&self, principal: Principal) -> Result<()>;

    /// Look up a principal by username
    async fn get(&self, username: &str) -> Result<Option<Principal>>;
}

/// In-memory principal store
#[derive(Default)]
pub struct MemoryPrincipalStore {
    principals: DashMap<String, Principal>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn insert(&self, principal: Principal) -> Result<()> {
        match self.principals.entry(principal.username.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(FlockError::Duplicate(principal.username))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(principal);
                Ok(())
            }
        }
    }

    async fn get(&self, username: &str) -> Result<Option<Principal>> {
        Ok(self.principals.get(username).map(|p| p.clone()))
    }
}
