//! Flock API - host-telemetry ingestion and notification pipeline
//!
//! Endpoint agents register once, then submit batches of osquery telemetry
//! and flock log events over authenticated requests. Batches are validated
//! whole, persisted into day partitions, classified into notification events
//! under a singleton-vs-burst policy, and dispatched best-effort to an
//! advisory chat channel.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod pipeline;

pub use api::{create_router, AppState};
pub use auth::CredentialGate;
pub use config::ApiConfig;
pub use pipeline::SubmissionPipeline;
