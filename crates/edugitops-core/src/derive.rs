//! Check derivation.
//!
//! A student's checks are a pure function of their name, their assigned apps
//! and the catalog. Two entry points exist:
//!
//! - [`derive`] skips apps missing from the catalog. Used when saving through
//!   the form, whose app choices always come from the catalog.
//! - [`derive_strict`] fails on the first missing app. Used when validating
//!   hand-edited YAML, where any id can be typed.

use crate::model::{Catalog, CatalogEntry, Protocol};
use crate::validate::ValidationError;

/// Cluster-internal DNS suffix for student services.
pub const SERVICE_DOMAIN: &str = "svc.cluster.local";

/// One monitoring check derived from a student/app pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CheckDescriptor {
    /// Catalog id the check was derived from.
    pub app_id: String,
    /// Check protocol from the catalog entry.
    pub protocol: Protocol,
    /// `<appId>-service.<student>.svc.cluster.local`.
    pub target_host: String,
    /// Service port from the catalog entry.
    pub port: u16,
}

impl CheckDescriptor {
    /// Build the check for `student` running catalog entry `entry`.
    pub fn new(student: &str, entry: &CatalogEntry) -> Self {
        Self {
            app_id: entry.id.clone(),
            protocol: entry.protocol,
            target_host: format!("{}-service.{}.{SERVICE_DOMAIN}", entry.id, student.trim()),
            port: entry.port,
        }
    }

    /// `http://<host>:<port>`, regardless of protocol.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.target_host, self.port)
    }

    /// The string stored in `check-http`: a URL for HTTP checks, a bare
    /// `host:port` pair for TCP checks.
    pub fn endpoint(&self) -> String {
        match self.protocol {
            Protocol::Http => self.url(),
            Protocol::Tcp => format!("{}:{}", self.target_host, self.port),
        }
    }
}

/// Derive checks, silently skipping apps that are not in the catalog.
pub fn derive(name: &str, apps: &[String], catalog: &Catalog) -> Vec<CheckDescriptor> {
    apps.iter()
        .filter_map(|app| catalog.get(app))
        .map(|entry| CheckDescriptor::new(name, entry))
        .collect()
}

/// Derive checks, failing with [`ValidationError::UnknownApp`] on the first
/// app that is not in the catalog.
pub fn derive_strict(
    name: &str,
    apps: &[String],
    catalog: &Catalog,
) -> Result<Vec<CheckDescriptor>, ValidationError> {
    apps.iter()
        .map(|app| {
            catalog
                .get(app)
                .map(|entry| CheckDescriptor::new(name, entry))
                .ok_or_else(|| ValidationError::UnknownApp {
                    name: name.trim().to_string(),
                    app_id: app.clone(),
                })
        })
        .collect()
}

/// [`derive`] rendered to the stored `check-http` strings.
pub fn derive_checks(name: &str, apps: &[String], catalog: &Catalog) -> Vec<String> {
    derive(name, apps, catalog)
        .iter()
        .map(CheckDescriptor::endpoint)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn apps(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn http_check_is_a_url() {
        let catalog = Catalog::new(vec![CatalogEntry::http("app1", 5000)]);
        let checks = derive_checks("juan", &apps(&["app1"]), &catalog);
        assert_eq!(checks, vec!["http://app1-service.juan.svc.cluster.local:5000"]);
    }

    #[test]
    fn tcp_check_is_host_and_port() {
        let catalog = Catalog::new(vec![CatalogEntry::tcp("mysql", 3306)]);
        let derived = derive("ana", &apps(&["mysql"]), &catalog);
        assert_eq!(derived[0].endpoint(), "mysql-service.ana.svc.cluster.local:3306");
        assert_eq!(derived[0].target_host, "mysql-service.ana.svc.cluster.local");
        assert_eq!(derived[0].port, 3306);
    }

    #[test]
    fn output_follows_app_order() {
        let catalog = Catalog::new(vec![
            CatalogEntry::http("a", 1),
            CatalogEntry::http("b", 2),
        ]);
        let derived = derive("x", &apps(&["b", "a"]), &catalog);
        let ids: Vec<_> = derived.iter().map(|c| c.app_id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn name_is_trimmed() {
        let catalog = Catalog::new(vec![CatalogEntry::http("a", 1)]);
        let checks = derive_checks("  juan ", &apps(&["a"]), &catalog);
        assert_eq!(checks, vec!["http://a-service.juan.svc.cluster.local:1"]);
    }

    #[test]
    fn permissive_derive_skips_unknown_apps() {
        let catalog = Catalog::new(vec![CatalogEntry::http("a", 1)]);
        let derived = derive("x", &apps(&["ghost", "a"]), &catalog);
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].app_id, "a");
    }

    #[test]
    fn strict_derive_rejects_unknown_apps() {
        let catalog = Catalog::new(vec![CatalogEntry::http("a", 1)]);
        let err = derive_strict("u1", &apps(&["a", "ghost"]), &catalog).unwrap_err();
        assert_matches!(err, ValidationError::UnknownApp { ref name, ref app_id } if name == "u1" && app_id == "ghost");
    }

    #[test]
    fn url_ignores_protocol() {
        let check = CheckDescriptor::new("s", &CatalogEntry::tcp("db", 5432));
        assert_eq!(check.url(), "http://db-service.s.svc.cluster.local:5432");
    }

    proptest! {
        #[test]
        fn derive_is_deterministic(
            name in "[a-z]{1,12}",
            picks in proptest::collection::vec(0usize..6, 0..8),
            tcp_mask in proptest::collection::vec(any::<bool>(), 4),
        ) {
            let catalog: Catalog = (0..4)
                .map(|i| {
                    let id = format!("app{i}");
                    let port = 8000 + u16::try_from(i).unwrap();
                    if tcp_mask[i] { CatalogEntry::tcp(id, port) } else { CatalogEntry::http(id, port) }
                })
                .collect();
            // Indices 4 and 5 reference apps the catalog does not have.
            let assigned: Vec<String> = picks.iter().map(|i| format!("app{i}")).collect();

            let first = derive(&name, &assigned, &catalog);
            let second = derive(&name, &assigned, &catalog);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), picks.iter().filter(|i| **i < 4).count());
        }
    }
}
