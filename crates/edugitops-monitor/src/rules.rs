//! Roster → Checkmk rule list.

use edugitops_core::{Catalog, CheckDescriptor, Protocol, StudentRecord};
use tracing::warn;

/// One rule to create on the monitored host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleSpec {
    /// HTTP check: `<host> <url> <service>`.
    Http {
        /// `http://<app>-service.<student>.svc.cluster.local:<port>`.
        url: String,
        /// `<student>-<app>`.
        service: String,
    },
    /// TCP connect check: `<host> <target> <port> <service>`.
    Tcp {
        /// `<app>-service.<student>.svc.cluster.local`.
        target: String,
        /// Service port.
        port: u16,
        /// `<student>-<app>`.
        service: String,
    },
}

impl RuleSpec {
    fn from_check(student: &str, check: &CheckDescriptor) -> Self {
        let service = format!("{student}-{}", check.app_id);
        match check.protocol {
            Protocol::Http => Self::Http {
                url: check.url(),
                service,
            },
            Protocol::Tcp => Self::Tcp {
                target: check.target_host.clone(),
                port: check.port,
                service,
            },
        }
    }

    /// Checkmk service name.
    pub fn service(&self) -> &str {
        match self {
            Self::Http { service, .. } | Self::Tcp { service, .. } => service,
        }
    }

    /// Script arguments after the host name.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Http { url, service } => vec![url.clone(), service.clone()],
            Self::Tcp {
                target,
                port,
                service,
            } => vec![target.clone(), port.to_string(), service.clone()],
        }
    }
}

/// Every rule the roster asks for, in roster then app order.
///
/// Rules are derived from `apps` and the catalog, not from the stored
/// `check-http` list. Students without a name and apps the catalog does not
/// know are skipped with a warning.
pub fn plan_rules(roster: &[StudentRecord], catalog: &Catalog) -> Vec<RuleSpec> {
    let mut rules = Vec::new();
    for student in roster {
        let name = student.name.trim();
        if name.is_empty() {
            warn!(id = %student.id, "student without a name, skipping");
            continue;
        }
        for app in &student.apps {
            let Some(entry) = catalog.get(app) else {
                warn!(student = name, app = %app, "app not in catalog, skipping");
                continue;
            };
            rules.push(RuleSpec::from_check(name, &CheckDescriptor::new(name, entry)));
        }
    }
    rules
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
