//! Per-kind notification enablement
//!
//! Read by the dispatcher on every decision, mutated through the
//! administrative surface. The pipeline never reads the store directly; it
//! takes a [`ConfigSnapshot`] per batch so one submission sees one policy.

use dashmap::DashMap;
use flock_core::{FlockError, Result};
use serde::Serialize;
use std::collections::HashMap;

use super::catalog::{Category, KindSpec, NotificationCatalog};

/// Enablement state of one notification kind
#[derive(Debug, Clone, Serialize)]
pub struct NotificationTypeConfig {
    pub kind: String,
    pub category: Category,
    pub enabled: bool,
}

/// Mutable enable/disable configuration, seeded all-on from the catalog
pub struct NotificationConfigStore {
    catalog: NotificationCatalog,
    enabled: DashMap<String, bool>,
}

impl NotificationConfigStore {
    pub fn new(catalog: NotificationCatalog) -> Self {
        let enabled = DashMap::new();
        for (kind, _) in catalog.iter() {
            enabled.insert(kind.to_string(), true);
        }
        Self { catalog, enabled }
    }

    pub fn get(&self, kind: &str) -> Option<NotificationTypeConfig> {
        let spec = self.catalog.get(kind)?;
        Some(NotificationTypeConfig {
            kind: kind.to_string(),
            category: spec.category,
            enabled: self.enabled.get(kind).map(|e| *e).unwrap_or(true),
        })
    }

    pub fn all(&self) -> Vec<NotificationTypeConfig> {
        self.catalog
            .iter()
            .map(|(kind, _)| self.get(kind).expect("kind comes from the catalog"))
            .collect()
    }

    /// Administrative path: turn a kind on
    pub fn enable(&self, kind: &str) -> Result<()> {
        self.set_enabled(kind, true)
    }

    /// Administrative path: turn a kind off
    pub fn disable(&self, kind: &str) -> Result<()> {
        self.set_enabled(kind, false)
    }

    fn set_enabled(&self, kind: &str, value: bool) -> Result<()> {
        if !self.catalog.contains(kind) {
            return Err(FlockError::NotFound(format!(
                "unknown notification kind: {kind}"
            )));
        }
        self.enabled.insert(kind.to_string(), value);
        Ok(())
    }

    /// Immutable view of catalog + enablement for one pipeline invocation
    pub fn snapshot(&self) -> ConfigSnapshot {
        let enabled = self
            .enabled
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        ConfigSnapshot {
            catalog: self.catalog.clone(),
            enabled,
        }
    }
}

impl Default for NotificationConfigStore {
    fn default() -> Self {
        Self::new(NotificationCatalog::standard())
    }
}

/// Owned, consistent policy view passed into classify and dispatch
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    catalog: NotificationCatalog,
    enabled: HashMap<String, bool>,
}

impl ConfigSnapshot {
    pub fn spec(&self, kind: &str) -> Option<&KindSpec> {
        self.catalog.get(kind)
    }

    /// Unknown kinds are never enabled
    pub fn is_enabled(&self, kind: &str) -> bool {
        self.catalog.contains(kind) && self.enabled.get(kind).copied().unwrap_or(true)
    }

    /// Kinds a telemetry batch can trigger, in catalog order
    pub fn osquery_kinds(&self) -> Vec<&'static str> {
        self.catalog
            .iter()
            .filter(|(_, spec)| spec.category == Category::Osquery)
            .map(|(kind, _)| kind)
            .collect()
    }
}
