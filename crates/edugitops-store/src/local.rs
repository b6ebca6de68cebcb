//! YAML files on the local filesystem.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use edugitops_core::{Catalog, Roster, StudentRecord};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::errors::StoreError;
use crate::traits::{Document, DocumentStore};

/// Default roster file name.
pub const ROSTER_FILE: &str = "alumnos.yaml";
/// Default catalog file name.
pub const CATALOG_FILE: &str = "catalogo-servicios.yaml";

/// [`DocumentStore`] backed by two YAML files.
///
/// Saves write a sibling `.tmp` file and rename it over the target, creating
/// the parent directory when needed. Output is block-style YAML with fields in
/// declaration order, so saving an unchanged roster is byte-identical.
#[derive(Clone, Debug)]
pub struct LocalStore {
    roster_path: PathBuf,
    catalog_path: PathBuf,
}

impl LocalStore {
    /// Store using explicit document paths.
    pub fn new(roster_path: impl Into<PathBuf>, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            roster_path: roster_path.into(),
            catalog_path: catalog_path.into(),
        }
    }

    /// Store using the default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(ROSTER_FILE), dir.join(CATALOG_FILE))
    }

    /// Path of `doc`.
    pub fn path(&self, doc: Document) -> &Path {
        match doc {
            Document::Roster => &self.roster_path,
            Document::Catalog => &self.catalog_path,
        }
    }
}

impl DocumentStore for LocalStore {
    fn load_roster(&self) -> Roster {
        load_list(&self.roster_path)
    }

    fn load_roster_for_update(&self) -> Result<Roster, StoreError> {
        let path = &self.roster_path;
        read_list(path)?
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                item.map_err(|e| StoreError::Corrupt {
                    path: path.clone(),
                    index: Some(i + 1),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    fn load_catalog(&self) -> Catalog {
        Catalog::new(load_list(&self.catalog_path))
    }

    fn raw_text(&self, doc: Document) -> String {
        read_text(self.path(doc)).unwrap_or_default()
    }

    fn save_roster(&self, roster: &[StudentRecord]) -> Result<(), StoreError> {
        let text = serde_yaml::to_string(roster)?;
        write_atomic(&self.roster_path, &text)?;
        debug!(path = %self.roster_path.display(), students = roster.len(), "roster saved");
        Ok(())
    }

    fn write_raw(&self, doc: Document, text: &str) -> Result<(), StoreError> {
        let path = self.path(doc);
        write_atomic(path, text)?;
        debug!(path = %path.display(), bytes = text.len(), "document replaced");
        Ok(())
    }
}

fn read_text(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "document not found");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read document");
            None
        }
    }
}

/// Read a YAML list, keeping the elements that deserialize as `T`.
fn load_list<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let items = match read_list(path) {
        Ok(items) => items,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring document");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match item {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(path = %path.display(), index = i + 1, error = %e, "skipping malformed element");
                None
            }
        })
        .collect()
}

/// Parse a YAML list element by element.
///
/// A missing, empty or null document is an empty list. Anything that is not
/// a list at all is [`StoreError::Corrupt`] with no index.
fn read_list<T: DeserializeOwned>(
    path: &Path,
) -> Result<Vec<Result<T, serde_yaml::Error>>, StoreError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "document not found");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let corrupt = |reason: String| StoreError::Corrupt {
        path: path.to_path_buf(),
        index: None,
        reason,
    };
    match serde_yaml::from_str::<Value>(&text) {
        Ok(Value::Sequence(items)) => Ok(items.into_iter().map(serde_yaml::from_value).collect()),
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(_) => Err(corrupt("document is not a list".to_string())),
        Err(e) => Err(corrupt(format!("invalid YAML: {e}"))),
    }
}

fn write_atomic(path: &Path, text: &str) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp_name = path.file_name().map(OsString::from).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, text).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        io_err(e)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use edugitops_core::logging::capture_logs;
    use edugitops_core::{CatalogEntry, Protocol};
    use proptest::prelude::*;
    use tracing::Level;

    use super::*;

    fn student(id: &str, name: &str, apps: &[&str], checks: &[&str]) -> StudentRecord {
        StudentRecord {
            name: name.into(),
            id: id.into(),
            apps: apps.iter().map(|s| (*s).to_string()).collect(),
            checks: checks.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        assert!(store.load_roster().is_empty());
        assert!(store.load_catalog().is_empty());
        assert_eq!(store.raw_text(Document::Roster), "");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        let roster = vec![
            student("001", "juan", &["app1"], &["http://app1-service.juan.svc.cluster.local:5000"]),
            student("002", "ana", &[], &[]),
        ];

        store.save_roster(&roster).unwrap();
        assert_eq!(store.load_roster(), roster);
    }

    #[test]
    fn saved_text_uses_document_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        store
            .save_roster(&[student("001", "juan", &["app1"], &["http://x:1"])])
            .unwrap();

        let text = store.raw_text(Document::Roster);
        assert!(text.starts_with("- nombre: juan\n"), "{text}");
        assert!(text.contains("id: '001'"), "{text}");
        assert!(text.contains("check-http:"), "{text}");
    }

    #[test]
    fn repeated_saves_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        let roster = vec![student("001", "juan", &["a", "b"], &["x", "y"])];

        store.save_roster(&roster).unwrap();
        let first = store.raw_text(Document::Roster);
        store.save_roster(&store.load_roster()).unwrap();
        assert_eq!(store.raw_text(Document::Roster), first);
    }

    #[test]
    fn save_creates_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path().join("nested").join("data"));
        store.save_roster(&[]).unwrap();
        assert!(store.path(Document::Roster).exists());
        assert!(!dir.path().join("nested/data/alumnos.yaml.tmp").exists());
    }

    #[test]
    fn invalid_yaml_reads_as_empty_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        std::fs::write(store.path(Document::Roster), "- nombre: [unclosed\n").unwrap();

        let (logs, _guard) = capture_logs();
        assert!(store.load_roster().is_empty());
        let events = logs.events();
        let warning = events
            .iter()
            .find(|e| e.level == Level::WARN && e.message.contains("ignoring document"))
            .unwrap();
        assert!(warning.field("error").unwrap().contains("invalid YAML"));
    }

    #[test]
    fn non_list_document_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        std::fs::write(store.path(Document::Catalog), "id: app1\nport: 80\n").unwrap();
        assert!(store.load_catalog().is_empty());
    }

    #[test]
    fn malformed_elements_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        std::fs::write(
            store.path(Document::Catalog),
            "- id: app1\n  port: 5000\n- just a string\n- id: db\n  port: 3306\n  protocol: tcp\n- id: bad\n  port: not-a-port\n",
        )
        .unwrap();

        let (logs, _guard) = capture_logs();
        let catalog = store.load_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("db").unwrap().protocol, Protocol::Tcp);
        assert_eq!(logs.count_at_level(Level::WARN), 2);
    }

    #[test]
    fn numeric_ids_load_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        std::fs::write(store.path(Document::Roster), "- nombre: juan\n  id: 7\n").unwrap();
        assert_eq!(store.load_roster()[0].id, "7");
    }

    #[test]
    fn write_raw_keeps_text_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        let text = "# catalog from the repo\n- id: app1\n  port: 5000\n";
        store.write_raw(Document::Catalog, text).unwrap();
        assert_eq!(store.raw_text(Document::Catalog), text);
        assert_eq!(store.load_catalog().get("app1"), Some(&CatalogEntry::http("app1", 5000)));
    }

    #[test]
    fn unwritable_target_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        // Parent is a regular file, so the directory cannot be created.
        let store = LocalStore::in_dir(blocker.join("data"));

        let err = store.save_roster(&[]).unwrap_err();
        assert!(matches!(err, StoreError::Io { ref path, .. } if path.ends_with("alumnos.yaml")));
    }

    fn arb_student() -> impl Strategy<Value = StudentRecord> {
        (
            "[0-9]{3}",
            "[a-z][a-z ]{0,10}[a-z]",
            proptest::collection::vec("[a-z][a-z0-9-]{0,7}", 0..4),
            proptest::collection::vec("[a-z][a-z0-9/.-]{0,19}", 0..4),
        )
            .prop_map(|(id, name, apps, checks)| StudentRecord {
                name,
                id,
                apps,
                checks,
            })
    }

    proptest! {
        #[test]
        fn save_load_save_is_stable(roster in proptest::collection::vec(arb_student(), 0..5)) {
            let dir = tempfile::tempdir().unwrap();
            let store = LocalStore::in_dir(dir.path());

            store.save_roster(&roster).unwrap();
            let first = store.raw_text(Document::Roster);
            let loaded = store.load_roster();
            prop_assert_eq!(&loaded, &roster);

            store.save_roster(&loaded).unwrap();
            prop_assert_eq!(store.raw_text(Document::Roster), first);
        }
    }

    // ── strict reads ────────────────────────────────────────────────

    #[test]
    fn update_load_reports_first_malformed_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        std::fs::write(
            store.path(Document::Roster),
            "- nombre: ana\n  id: '001'\n- id: '002'\n- nombre: juan\n  id: '003'\n  apps: app1\n",
        )
        .unwrap();

        assert_eq!(store.load_roster().len(), 1);
        let err = store.load_roster_for_update().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { index: Some(2), .. }), "{err}");
        assert!(err.to_string().contains("element #2"), "{err}");
    }

    #[test]
    fn update_load_rejects_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        std::fs::write(store.path(Document::Roster), "- nombre: [unclosed\n").unwrap();
        assert!(matches!(
            store.load_roster_for_update(),
            Err(StoreError::Corrupt { index: None, .. })
        ));

        std::fs::write(store.path(Document::Roster), "nombre: juan\n").unwrap();
        assert!(matches!(
            store.load_roster_for_update(),
            Err(StoreError::Corrupt { index: None, .. })
        ));
    }

    #[test]
    fn update_load_of_missing_or_clean_roster() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::in_dir(dir.path());
        assert!(store.load_roster_for_update().unwrap().is_empty());

        let roster = vec![student("001", "juan", &["app1"], &[])];
        store.save_roster(&roster).unwrap();
        assert_eq!(store.load_roster_for_update().unwrap(), roster);
    }
}
