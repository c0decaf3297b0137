//! Infrastructure module

pub mod event_store;
pub mod principal_store;

pub use event_store::{EventStore, MemoryEventStore, StoredRecord};
pub use principal_store::{MemoryPrincipalStore, PrincipalStore};
