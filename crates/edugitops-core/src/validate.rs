//! Validation of hand-edited roster YAML.
//!
//! The raw editor accepts arbitrary text, so nothing from it is trusted until
//! it passes every rule below. Rules run in a fixed order and stop at the
//! first failure; the error message is shown to the user as-is.
//!
//! 1. YAML syntax
//! 2. empty document → empty roster
//! 3. top level is a list
//! 4. per element: mapping, id, name, apps, `check-http`

use std::collections::HashSet;

use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

use crate::derive::{CheckDescriptor, derive_strict};
use crate::model::{Catalog, Roster, StudentRecord, name_key, scalar_to_string, unique_apps};

/// Why a raw roster was rejected.
///
/// Indices in messages are 1-based, matching what a user counts in the editor.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Text is not valid YAML.
    #[error("YAML syntax error: {0}")]
    Syntax(String),

    /// Top-level value is not a list.
    #[error("the YAML document must be a list of students")]
    Shape,

    /// A list element is not a mapping.
    #[error("element #{index} is not a valid record")]
    ElementShape {
        /// 1-based position in the list.
        index: usize,
    },

    /// A record has no usable `id`.
    #[error("student #{index} has no id")]
    MissingId {
        /// 1-based position in the list.
        index: usize,
    },

    /// Two records share an `id`.
    #[error("duplicate id found: {id}")]
    DuplicateId {
        /// The repeated id.
        id: String,
    },

    /// A record has no usable `nombre`.
    #[error("student with id {id} has no name")]
    MissingName {
        /// Id of the nameless record.
        id: String,
    },

    /// Two records share a name (case-insensitive).
    #[error("duplicate name found: {name}")]
    DuplicateName {
        /// The repeated name, as written in the second record.
        name: String,
    },

    /// `apps` is not a list of strings.
    #[error("the 'apps' list of {name} is invalid")]
    InvalidApps {
        /// Student name.
        name: String,
    },

    /// `apps` references an id missing from the catalog.
    #[error("app '{app_id}' assigned to {name} does not exist in the catalog")]
    UnknownApp {
        /// Student name.
        name: String,
        /// The unknown catalog id.
        app_id: String,
    },

    /// `check-http` is not exactly the derived set.
    #[error("'check-http' for {name} does not match the assigned apps")]
    ChecksMismatch {
        /// Student name.
        name: String,
    },
}

/// Validate raw roster text against `catalog`.
///
/// On success the returned roster is normalized: ids and names trimmed,
/// repeated apps dropped (first occurrence wins) and `check-http` rewritten
/// in derivation order.
pub fn validate(raw: &str, catalog: &Catalog) -> Result<Roster, ValidationError> {
    let items = match parse_document(raw)? {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(items) => items,
        _ => return Err(ValidationError::Shape),
    };

    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut roster = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let index = i + 1;
        let Value::Mapping(map) = item else {
            return Err(ValidationError::ElementShape { index });
        };

        let id = map
            .get("id")
            .and_then(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingId { index })?;
        if !seen_ids.insert(id.clone()) {
            return Err(ValidationError::DuplicateId { id });
        }

        let name = map
            .get("nombre")
            .and_then(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ValidationError::MissingName { id: id.clone() })?;
        if !seen_names.insert(name_key(&name)) {
            return Err(ValidationError::DuplicateName { name });
        }

        let apps = string_list(map.get("apps"))
            .map(unique_apps)
            .ok_or_else(|| ValidationError::InvalidApps { name: name.clone() })?;
        let derived = derive_strict(&name, &apps, catalog)?;

        let expected: HashSet<String> = derived.iter().map(CheckDescriptor::endpoint).collect();
        let declared: HashSet<String> = string_list(map.get("check-http"))
            .ok_or_else(|| ValidationError::ChecksMismatch { name: name.clone() })?
            .into_iter()
            .collect();
        if declared != expected {
            return Err(ValidationError::ChecksMismatch { name });
        }

        let checks = derived.iter().map(CheckDescriptor::endpoint).collect();

        roster.push(StudentRecord {
            name,
            id,
            apps,
            checks,
        });
    }

    Ok(roster)
}

/// Parse a single YAML document. A stream with no document at all (empty
/// text, only comments) reads as null.
fn parse_document(raw: &str) -> Result<Value, ValidationError> {
    let mut documents = serde_yaml::Deserializer::from_str(raw);
    let Some(first) = documents.next() else {
        return Ok(Value::Null);
    };
    let value = Value::deserialize(first).map_err(|e| ValidationError::Syntax(e.to_string()))?;
    if documents.next().is_some() {
        return Err(ValidationError::Syntax(
            "expected a single YAML document".to_string(),
        ));
    }
    Ok(value)
}

/// A missing or null field is an empty list; anything but a list of strings
/// is `None`.
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(_) => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CatalogEntry;
    use assert_matches::assert_matches;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogEntry::http("app1", 80),
            CatalogEntry::tcp("db", 5432),
        ])
    }

    #[test]
    fn accepts_consistent_roster() {
        let raw = "
- nombre: user1
  id: '001'
  apps: ['app1']
  check-http:
  - http://app1-service.user1.svc.cluster.local:80
";
        let roster = validate(raw, &catalog()).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, "001");
        assert_eq!(roster[0].checks.len(), 1);
    }

    #[test]
    fn accepts_tcp_endpoint() {
        let raw = "
- nombre: ana
  id: '002'
  apps: [db]
  check-http: [db-service.ana.svc.cluster.local:5432]
";
        assert!(validate(raw, &catalog()).is_ok());
    }

    #[test]
    fn empty_document_is_empty_roster() {
        assert_eq!(validate("", &catalog()).unwrap(), Vec::new());
        assert_eq!(validate("# nothing\n", &catalog()).unwrap(), Vec::new());
        assert_eq!(validate("~", &catalog()).unwrap(), Vec::new());
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = validate("- nombre: [unclosed", &catalog()).unwrap_err();
        assert_matches!(err, ValidationError::Syntax(_));
        assert!(err.to_string().starts_with("YAML syntax error"));
    }

    #[test]
    fn multiple_documents_are_rejected() {
        let err = validate("- nombre: a\n  id: '1'\n---\n- nombre: b\n", &catalog()).unwrap_err();
        assert_matches!(err, ValidationError::Syntax(_));
    }

    #[test]
    fn top_level_must_be_a_list() {
        assert_eq!(
            validate("nombre: juan\nid: '1'\n", &catalog()).unwrap_err(),
            ValidationError::Shape
        );
    }

    #[test]
    fn element_must_be_a_mapping() {
        let raw = "- nombre: a\n  id: '1'\n- just a string\n";
        assert_eq!(
            validate(raw, &catalog()).unwrap_err(),
            ValidationError::ElementShape { index: 2 }
        );
    }

    #[test]
    fn missing_id_is_rejected() {
        let raw = "- nombre: a\n  id: '  '\n";
        assert_eq!(
            validate(raw, &catalog()).unwrap_err(),
            ValidationError::MissingId { index: 1 }
        );
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let raw = "
- nombre: u1
  id: '001'
- nombre: u2
  id: '001'
";
        let err = validate(raw, &Catalog::default()).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateId { id: "001".into() });
        assert_eq!(err.to_string(), "duplicate id found: 001");
    }

    #[test]
    fn duplicate_id_wins_over_later_rules() {
        // The second record also has a duplicate name and an unknown app;
        // the id rule runs first.
        let raw = "
- nombre: u1
  id: '001'
- nombre: U1
  id: '001'
  apps: [ghost]
";
        assert_matches!(
            validate(raw, &catalog()).unwrap_err(),
            ValidationError::DuplicateId { .. }
        );
    }

    #[test]
    fn missing_name_is_rejected() {
        let raw = "- id: '001'\n";
        assert_eq!(
            validate(raw, &catalog()).unwrap_err(),
            ValidationError::MissingName { id: "001".into() }
        );
    }

    #[test]
    fn duplicate_name_is_case_insensitive() {
        let raw = "
- nombre: juan
  id: '001'
- nombre: JUAN
  id: '002'
";
        assert_eq!(
            validate(raw, &catalog()).unwrap_err(),
            ValidationError::DuplicateName { name: "JUAN".into() }
        );
    }

    #[test]
    fn apps_must_be_a_list() {
        let raw = "- nombre: u1\n  id: '1'\n  apps: app1\n";
        assert_eq!(
            validate(raw, &catalog()).unwrap_err(),
            ValidationError::InvalidApps { name: "u1".into() }
        );
    }

    #[test]
    fn unknown_app_is_rejected() {
        let catalog = Catalog::new(vec![CatalogEntry::http("app1", 80)]);
        let raw = "
- nombre: u1
  id: '001'
  apps: ['ghost']
";
        let err = validate(raw, &catalog).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownApp {
                name: "u1".into(),
                app_id: "ghost".into()
            }
        );
        assert!(err.to_string().contains("does not exist in the catalog"));
    }

    #[test]
    fn wrong_check_is_rejected() {
        let catalog = Catalog::new(vec![CatalogEntry::http("app1", 80)]);
        let raw = "
- nombre: u1
  id: '001'
  apps: ['app1']
  check-http:
  - http://wrong
";
        assert_eq!(
            validate(raw, &catalog).unwrap_err(),
            ValidationError::ChecksMismatch { name: "u1".into() }
        );
    }

    #[test]
    fn missing_check_is_rejected() {
        let raw = "- nombre: u1\n  id: '001'\n  apps: ['app1']\n";
        assert_matches!(
            validate(raw, &catalog()).unwrap_err(),
            ValidationError::ChecksMismatch { .. }
        );
    }

    #[test]
    fn extra_check_is_rejected() {
        let raw = "
- nombre: u1
  id: '001'
  apps: []
  check-http: [http://app1-service.u1.svc.cluster.local:80]
";
        assert_matches!(
            validate(raw, &catalog()).unwrap_err(),
            ValidationError::ChecksMismatch { .. }
        );
    }

    #[test]
    fn malformed_check_list_is_rejected() {
        let raw = "- nombre: u1\n  id: '001'\n  check-http: not-a-list\n";
        assert_matches!(
            validate(raw, &catalog()).unwrap_err(),
            ValidationError::ChecksMismatch { .. }
        );
    }

    #[test]
    fn stale_http_form_of_tcp_app_is_rejected() {
        let raw = "
- nombre: ana
  id: '002'
  apps: [db]
  check-http: [http://db-service.ana.svc.cluster.local:5432]
";
        assert_matches!(
            validate(raw, &catalog()).unwrap_err(),
            ValidationError::ChecksMismatch { .. }
        );
    }

    #[test]
    fn checks_compare_as_a_set_and_are_normalized() {
        let raw = "
- nombre: ' u1 '
  id: 7
  apps: [app1, db]
  check-http:
  - db-service.u1.svc.cluster.local:5432
  - http://app1-service.u1.svc.cluster.local:80
  - db-service.u1.svc.cluster.local:5432
";
        let roster = validate(raw, &catalog()).unwrap();
        let record = &roster[0];
        assert_eq!(record.name, "u1");
        assert_eq!(record.id, "7");
        assert_eq!(
            record.checks,
            vec![
                "http://app1-service.u1.svc.cluster.local:80".to_string(),
                "db-service.u1.svc.cluster.local:5432".to_string(),
            ]
        );
    }

    #[test]
    fn repeated_apps_collapse_to_one() {
        let raw = "
- nombre: u1
  id: '001'
  apps: [app1, db, app1]
  check-http:
  - http://app1-service.u1.svc.cluster.local:80
  - db-service.u1.svc.cluster.local:5432
";
        let catalog = catalog();
        let record = &validate(raw, &catalog).unwrap()[0];
        assert_eq!(record.apps, vec!["app1".to_string(), "db".to_string()]);
        let derived: Vec<String> = crate::derive::derive(&record.name, &record.apps, &catalog)
            .iter()
            .map(CheckDescriptor::endpoint)
            .collect();
        assert_eq!(record.checks, derived);
    }
}
