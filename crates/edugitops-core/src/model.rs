//! Roster and catalog types.
//!
//! Field names follow the YAML documents that instructors edit by hand
//! (`nombre`, `id`, `apps`, `check-http`), so a load/save cycle never renames
//! anything. Struct field order is the serialization order.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Check protocol for a catalog service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// HTTP check against `http://<host>:<port>`.
    #[default]
    Http,
    /// Plain TCP connect check against `<host>:<port>`.
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Tcp => f.write_str("tcp"),
        }
    }
}

/// One deployable application in `catalogo-servicios.yaml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Catalog key, referenced from [`StudentRecord::apps`].
    pub id: String,
    /// Display name shown by the UI.
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Service port inside the student's namespace.
    pub port: u16,
    /// Check protocol (defaults to HTTP when omitted).
    #[serde(default)]
    pub protocol: Protocol,
}

impl CatalogEntry {
    /// HTTP entry without a display name.
    pub fn http(id: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            name: None,
            port,
            protocol: Protocol::Http,
        }
    }

    /// TCP entry without a display name.
    pub fn tcp(id: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            ..Self::http(id, port)
        }
    }
}

/// The loaded service catalog.
///
/// Lookups resolve duplicated ids to the entry that appears last in the
/// document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from entries in document order.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().rev().find(|e| e.id == id)
    }

    /// Whether `id` names a catalog entry.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Roster
// ─────────────────────────────────────────────────────────────────────────────

/// One student in `alumnos.yaml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Student name, used as the Kubernetes namespace in check hostnames.
    #[serde(rename = "nombre", deserialize_with = "de_scalar_string")]
    pub name: String,
    /// Stable identifier, conventionally a zero-padded number (`"007"`).
    #[serde(deserialize_with = "de_scalar_string")]
    pub id: String,
    /// Assigned catalog ids, in the order the checks are derived.
    #[serde(default)]
    pub apps: Vec<String>,
    /// Derived check endpoints, one per resolvable app.
    #[serde(rename = "check-http", default)]
    pub checks: Vec<String>,
}

impl StudentRecord {
    /// Create a record with an empty check list.
    pub fn new(id: impl Into<String>, name: impl Into<String>, apps: Vec<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            apps,
            checks: Vec::new(),
        }
    }

    /// Case-insensitive comparison key for name uniqueness.
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }
}

/// Ordered list of students as stored on disk.
pub type Roster = Vec<StudentRecord>;

/// Normalize a student name for uniqueness checks.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Drop repeated app ids, keeping the first occurrence of each.
pub fn unique_apps(apps: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(apps.len());
    for app in apps {
        if !unique.contains(&app) {
            unique.push(app);
        }
    }
    unique
}

/// Render a YAML scalar the way a loosely typed reader would (`id: 7` → `"7"`).
///
/// Sequences, mappings and nulls have no scalar form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn de_scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(&value)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| D::Error::custom("expected a string or number"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
