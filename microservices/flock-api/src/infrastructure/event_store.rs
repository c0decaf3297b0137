//! Event Store - time-partitioned document persistence
//!
//! Partitions are append-only and created implicitly the first time a record
//! lands on a new day. The store enforces no identity: a retried submission
//! appends a second copy of each record.

use async_trait::async_trait;
use dashmap::DashMap;
use flock_core::Result;
use serde::Serialize;
use serde_json::Value;

/// One persisted document with its category tag
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    pub category: String,
    pub document: Value,
}

/// Write sink over the document store
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one document to a partition, preserving insertion order
    async fn append(&self, partition: &str, category: &str, document: Value) -> Result<()>;

    /// Read a partition back in insertion order (empty if it does not exist)
    async fn records(&self, partition: &str) -> Vec<StoredRecord>;

    /// Names of all partitions that have received at least one record
    async fn partitions(&self) -> Vec<String>;
}

/// In-memory partitioned store
#[derive(Default)]
pub struct MemoryEventStore {
    partitions: DashMap<String, Vec<StoredRecord>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, partition: &str, category: &str, document: Value) -> Result<()> {
        self.partitions
            .entry(partition.to_string())
            .or_default()
            .push(StoredRecord {
                category: category.to_string(),
                document,
            });
        Ok(())
    }

    async fn records(&self, partition: &str) -> Vec<StoredRecord> {
        self.partitions
            .get(partition)
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    async fn partitions(&self) -> Vec<String> {
        self.partitions.iter().map(|e| e.key().clone()).collect()
    }
}
