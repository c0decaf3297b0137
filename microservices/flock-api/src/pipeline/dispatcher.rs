//! Notification Dispatcher
//!
//! Consults the enablement snapshot, renders the per-kind message, and
//! forwards it through the chat transport. Delivery is best-effort,
//! at-most-once per attempt: a failed or timed-out send is logged and
//! dropped, and no outcome ever reaches the submitting client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::NotificationEvent;
use crate::notifications::{render, ChatTransport, ConfigSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Suppressed,
    Failed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchStats {
    pub sent: u64,
    pub suppressed: u64,
    pub failed: u64,
}

pub struct NotificationDispatcher {
    transport: Arc<dyn ChatTransport>,
    send_timeout: Duration,
    sent: AtomicU64,
    suppressed: AtomicU64,
    failed: AtomicU64,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn ChatTransport>, send_timeout: Duration) -> Self {
        Self {
            transport,
            send_timeout,
            sent: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub async fn dispatch(
        &self,
        event: &NotificationEvent,
        snapshot: &ConfigSnapshot,
    ) -> DispatchOutcome {
        if !snapshot.is_enabled(&event.kind) {
            debug!(kind = %event.kind, "Notification suppressed");
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            return DispatchOutcome::Suppressed;
        }

        // is_enabled above guarantees the kind is in the catalog
        let Some(spec) = snapshot.spec(&event.kind) else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            return DispatchOutcome::Suppressed;
        };

        let message = render::render(event, spec);

        let send = tokio::time::timeout(self.send_timeout, self.transport.send(&message));
        match send.await {
            Ok(Ok(())) => {
                debug!(kind = %event.kind, "Notification sent");
                self.sent.fetch_add(1, Ordering::Relaxed);
                DispatchOutcome::Sent
            }
            Ok(Err(e)) => {
                warn!(kind = %event.kind, error = %e, "Notification send failed, dropping");
                self.failed.fetch_add(1, Ordering::Relaxed);
                DispatchOutcome::Failed
            }
            Err(_) => {
                warn!(kind = %event.kind, "Notification send timed out, dropping");
                self.failed.fetch_add(1, Ordering::Relaxed);
                DispatchOutcome::Failed
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            sent: self.sent.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationConfigStore;
    use async_trait::async_trait;
    use flock_core::{FlockError, Result};
    use serde_json::json;
    use tokio::sync::Mutex;

    struct RecordingTransport {
        messages: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingTransport {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                messages: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send(&self, message: &str) -> Result<()> {
            if self.fail {
                return Err(FlockError::Unavailable("channel down".to_string()));
            }
            self.messages.lock().await.push(message.to_string());
            Ok(())
        }
    }

    fn dispatcher(transport: Arc<RecordingTransport>) -> NotificationDispatcher {
        NotificationDispatcher::new(transport, Duration::from_secs(1))
    }

    fn event() -> NotificationEvent {
        NotificationEvent::singleton("crontab", json!({"action": "added"}))
    }

    #[tokio::test]
    async fn enabled_kind_is_sent() {
        let transport = RecordingTransport::new(false);
        let d = dispatcher(transport.clone());
        let snapshot = NotificationConfigStore::default().snapshot();

        let outcome = d.dispatch(&event(), &snapshot).await;
        assert_eq!(outcome, DispatchOutcome::Sent);
        let messages = transport.messages.lock().await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Cron job has changed"));
        assert_eq!(d.stats().sent, 1);
    }

    #[tokio::test]
    async fn disabled_kind_never_reaches_the_channel() {
        let transport = RecordingTransport::new(false);
        let d = dispatcher(transport.clone());
        let store = NotificationConfigStore::default();
        store.disable("crontab").unwrap();

        let outcome = d.dispatch(&event(), &store.snapshot()).await;
        assert_eq!(outcome, DispatchOutcome::Suppressed);
        assert!(transport.messages.lock().await.is_empty());
        assert_eq!(d.stats().suppressed, 1);
    }

    #[tokio::test]
    async fn unknown_kind_is_suppressed() {
        let transport = RecordingTransport::new(false);
        let d = dispatcher(transport.clone());
        let snapshot = NotificationConfigStore::default().snapshot();

        let unknown = NotificationEvent::details("made_up_kind", json!({}));
        assert_eq!(
            d.dispatch(&unknown, &snapshot).await,
            DispatchOutcome::Suppressed
        );
        assert!(transport.messages.lock().await.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_dropped_not_propagated() {
        let transport = RecordingTransport::new(true);
        let d = dispatcher(transport);
        let snapshot = NotificationConfigStore::default().snapshot();

        let outcome = d.dispatch(&event(), &snapshot).await;
        assert_eq!(outcome, DispatchOutcome::Failed);
        assert_eq!(d.stats().failed, 1);
    }
}
