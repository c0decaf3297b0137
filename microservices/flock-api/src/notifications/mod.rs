//! Notification catalog, enablement policy, rendering and transport

pub mod catalog;
pub mod config_store;
pub mod render;
pub mod transport;

pub use catalog::{Category, KindSpec, NotificationCatalog};
pub use config_store::{ConfigSnapshot, NotificationConfigStore, NotificationTypeConfig};
pub use transport::{ChatTransport, WebhookTransport};
