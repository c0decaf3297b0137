//! Flock Core - Shared service infrastructure
//!
//! This crate provides:
//! - Standard service trait the flock services implement
//! - Error taxonomy shared across the pipeline
//! - Service runtime bootstrap with graceful shutdown

pub mod error;
pub mod service;

pub use error::{FlockError, Result};
pub use service::{DependencyStatus, FlockService, HealthStatus, ReadinessStatus, ServiceRuntime};
