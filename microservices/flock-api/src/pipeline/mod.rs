//! The ingestion pipeline: validate -> write -> classify -> dispatch

pub mod classifier;
pub mod dispatcher;
pub mod validator;
pub mod writer;

pub use dispatcher::{DispatchOutcome, DispatchStats, NotificationDispatcher};
pub use writer::PartitionedWriter;

use flock_core::Result;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::{NotificationEvent, Principal};
use crate::notifications::NotificationConfigStore;

/// One submission's worth of pipeline, shared across request contexts
pub struct SubmissionPipeline {
    writer: PartitionedWriter,
    dispatcher: NotificationDispatcher,
    config: Arc<NotificationConfigStore>,
}

impl SubmissionPipeline {
    pub fn new(
        writer: PartitionedWriter,
        dispatcher: NotificationDispatcher,
        config: Arc<NotificationConfigStore>,
    ) -> Self {
        Self {
            writer,
            dispatcher,
            config,
        }
    }

    /// Full telemetry path. Validation failure aborts before any write or
    /// dispatch; dispatch outcomes never affect the result.
    pub async fn process_telemetry(&self, body: &Value, principal: &Principal) -> Result<usize> {
        let docs = validator::validate_telemetry(body, &principal.username)?;
        let stored = self.writer.write(docs, principal).await;

        // One policy snapshot per batch: a toggle flipped mid-batch applies
        // to the next submission, not half of this one.
        let snapshot = self.config.snapshot();
        let events = classifier::classify_telemetry(&stored, &snapshot, principal);
        for event in &events {
            self.dispatcher.dispatch(event, &snapshot).await;
        }

        Ok(stored.len())
    }

    /// Flock-logs path: structural classification, nothing persisted.
    pub async fn process_flock_logs(&self, body: &Value, principal: &Principal) -> Result<usize> {
        let docs = validator::validate_flock_logs(body)?;

        let snapshot = self.config.snapshot();
        let events = classifier::classify_flock_logs(&docs, principal);
        for event in &events {
            self.dispatcher.dispatch(event, &snapshot).await;
        }

        Ok(docs.len())
    }

    /// Dispatch a standalone event (registration lifecycle notifications)
    pub async fn notify(&self, event: &NotificationEvent) -> DispatchOutcome {
        let snapshot = self.config.snapshot();
        self.dispatcher.dispatch(event, &snapshot).await
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }
}
