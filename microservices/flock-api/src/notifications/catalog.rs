//! Fixed catalog of notification kinds
//!
//! The catalog is an injected, enumerable resource: the classifier and
//! dispatcher only ask it questions, they never branch on kind names. New
//! kinds are added here without touching the pipeline.

use serde::{Deserialize, Serialize};

/// Which part of the system a notification kind belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Registration lifecycle
    User,
    /// Agent state changes reported through the flock-logs channel
    Flock,
    /// Telemetry kinds an osquery batch can trigger
    Osquery,
}

/// Static description of one notification kind
#[derive(Debug, Clone, Copy)]
pub struct KindSpec {
    pub category: Category,
    pub description: &'static str,
    /// Warning kinds get an alert banner when rendered
    pub warning: bool,
}

/// The enumerable set of notification kinds
#[derive(Debug, Clone)]
pub struct NotificationCatalog {
    kinds: Vec<(&'static str, KindSpec)>,
}

impl NotificationCatalog {
    /// The full flock catalog
    pub fn standard() -> Self {
        use Category::*;

        let spec = |category, description| KindSpec {
            category,
            description,
            warning: false,
        };

        Self {
            kinds: vec![
                // User registration
                (
                    "user_registered",
                    spec(User, "A user has registered with the server"),
                ),
                (
                    "user_already_exists",
                    spec(
                        User,
                        "A user tried to register with an existing username (they might be \
                         trying to re-setup their Flock Agent; if so delete the existing user \
                         so they can finish registering)",
                    ),
                ),
                // Flock logs
                ("server_enabled", spec(Flock, "A user has enabled the server")),
                ("server_disabled", spec(Flock, "A user has disabled the server")),
                ("twigs_enabled", spec(Flock, "A user has enabled twigs")),
                ("twigs_disabled", spec(Flock, "A user has disabled twigs")),
                // Osquery
                (
                    "reverse_shell",
                    KindSpec {
                        category: Osquery,
                        description: "A reverse shell was detected",
                        warning: true,
                    },
                ),
                ("os_version", spec(Osquery, "OS version has changed")),
                ("safari_extensions", spec(Osquery, "Safari extension has changed")),
                ("opera_extensions", spec(Osquery, "Opera extension has changed")),
                ("chrome_extensions", spec(Osquery, "Chrome extension has changed")),
                ("firefox_addons", spec(Osquery, "Firefox add-on has changed")),
                ("launchd", spec(Osquery, "Launch daemon has changed")),
                ("startup_items", spec(Osquery, "Startup item has changed")),
                ("crontab", spec(Osquery, "Cron job has changed")),
                ("kextstat", spec(Osquery, "Kernel extension has changed")),
                (
                    "installed_applications",
                    spec(Osquery, "Applications have changed"),
                ),
            ],
        }
    }

    pub fn get(&self, kind: &str) -> Option<&KindSpec> {
        self.kinds.iter().find(|(k, _)| *k == kind).map(|(_, s)| s)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.get(kind).is_some()
    }

    /// All kinds in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &KindSpec)> {
        self.kinds.iter().map(|(k, s)| (*k, s))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
