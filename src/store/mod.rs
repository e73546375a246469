//! Selection Store - durable user decisions keyed by component id
//!
//! Three files live under the configuration directory:
//! - `selections.yaml`: `entry_id -> {included, custom_title, custom_description}`
//! - `state.json`: free-form generation state
//! - `descriptions.json`: `component_id -> generated description`
//!
//! Every save rewrites the whole file. Concurrent writers across processes are not
//! supported; callers run one store per repository at a time.

pub mod documents;

pub use documents::{DescriptionMap, DocumentFormat, Metadata, Selection, SelectionMap, FORMAT_VERSION};

use crate::error::{StoreError, StoreResult};
use crate::toc::{flatten, TocEntry};
use documents::{
    load_or_default, read_document, timestamp, with_entry_ids, write_document, DescriptionsDocument,
    ExportDocument, SelectionsDocument,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration directory name under a repository root
pub const CONFIG_DIR_NAME: &str = ".docuagent";

pub const SELECTIONS_FILE: &str = "selections.yaml";
pub const STATE_FILE: &str = "state.json";
pub const DESCRIPTIONS_FILE: &str = "descriptions.json";

/// Partial update of one selection; `None` leaves the stored value alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionUpdate {
    pub included: Option<bool>,
    pub custom_title: Option<String>,
    pub custom_description: Option<String>,
}

pub struct SelectionStore {
    config_dir: PathBuf,
}

impl SelectionStore {
    /// Store rooted at `config_dir`; nothing touches the disk until the first save
    pub fn open(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Store in `<repo_root>/.docuagent`
    pub fn for_repository(repo_root: &Path) -> Self {
        Self::open(repo_root.join(CONFIG_DIR_NAME))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn selections_path(&self) -> PathBuf {
        self.config_dir.join(SELECTIONS_FILE)
    }

    pub fn state_path(&self) -> PathBuf {
        self.config_dir.join(STATE_FILE)
    }

    pub fn descriptions_path(&self) -> PathBuf {
        self.config_dir.join(DESCRIPTIONS_FILE)
    }

    /// Create the configuration directory
    ///
    /// When the directory's parent holds a `.gitignore` that does not mention it yet, an
    /// ignore line for the directory is appended.
    pub fn ensure_config_dir(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.config_dir).map_err(|e| StoreError::io(&self.config_dir, e))?;

        let Some(dir_name) = self.config_dir.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        let gitignore = self
            .config_dir
            .parent()
            .map(|parent| parent.join(".gitignore"))
            .unwrap_or_else(|| PathBuf::from(".gitignore"));
        if !gitignore.is_file() {
            return Ok(());
        }

        let ignore_line = format!("{}/", dir_name);
        let content = fs::read_to_string(&gitignore).map_err(|e| StoreError::io(&gitignore, e))?;
        if content.contains(&ignore_line) {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&gitignore)
            .map_err(|e| StoreError::io(&gitignore, e))?;
        write!(file, "\n# DocuAgent configuration\n{}\n", ignore_line)
            .map_err(|e| StoreError::io(&gitignore, e))?;
        debug!("Added {} to {}", ignore_line, gitignore.display());

        Ok(())
    }

    // ---------------------------------------------------------------------
    // Selections
    // ---------------------------------------------------------------------

    fn read_selections(&self) -> StoreResult<SelectionsDocument> {
        let mut document: SelectionsDocument =
            load_or_default(&self.selections_path(), DocumentFormat::Yaml)?;
        document.selections = with_entry_ids(document.selections);
        Ok(document)
    }

    /// Replace the selections file
    pub fn save_selections(&self, selections: &SelectionMap, metadata: &Metadata) -> StoreResult<()> {
        self.ensure_config_dir()?;

        let document = SelectionsDocument {
            version: FORMAT_VERSION.to_string(),
            updated_at: timestamp(),
            metadata: metadata.clone(),
            selections: selections.clone(),
        };
        write_document(&self.selections_path(), DocumentFormat::Yaml, &document)
    }

    /// Persisted selections; empty when nothing was saved yet
    pub fn load_selections(&self) -> StoreResult<SelectionMap> {
        Ok(self.read_selections()?.selections)
    }

    pub fn load_metadata(&self) -> StoreResult<Metadata> {
        Ok(self.read_selections()?.metadata)
    }

    /// Apply a partial update and persist; unknown ids get a new record, included by default
    pub fn update_selection(&self, entry_id: &str, update: SelectionUpdate) -> StoreResult<Selection> {
        let SelectionsDocument {
            metadata,
            mut selections,
            ..
        } = self.read_selections()?;

        let selection = selections.entry(entry_id.to_string()).or_default();
        selection.entry_id = entry_id.to_string();
        if let Some(included) = update.included {
            selection.included = included;
        }
        if let Some(title) = update.custom_title {
            selection.custom_title = Some(title);
        }
        if let Some(description) = update.custom_description {
            selection.custom_description = Some(description);
        }
        let updated = selection.clone();

        self.save_selections(&selections, &metadata)?;
        Ok(updated)
    }

    /// Reconcile a fresh outline with the stored decisions
    ///
    /// Every outline id (all levels, pre-order) keeps its stored selection or gets a new one
    /// with `default_included`. Stored ids missing from the outline are kept after the
    /// outline ids in their previous order. The merged map is persisted and returned.
    pub fn initialize_from_outline(
        &self,
        entries: &[TocEntry],
        default_included: bool,
    ) -> StoreResult<SelectionMap> {
        let SelectionsDocument {
            metadata,
            selections: mut existing,
            ..
        } = self.read_selections()?;

        let mut merged = SelectionMap::with_capacity(existing.len());
        let mut created = 0;
        for entry in flatten(entries) {
            if merged.contains_key(&entry.id) {
                continue;
            }
            let selection = match existing.shift_remove(&entry.id) {
                Some(selection) => selection,
                None => {
                    created += 1;
                    Selection {
                        entry_id: entry.id.clone(),
                        ..Selection::new(default_included)
                    }
                }
            };
            merged.insert(entry.id.clone(), selection);
        }

        let orphaned = existing.len();
        merged.extend(existing);

        self.save_selections(&merged, &metadata)?;
        info!(
            "Selections reconciled: {} total, {} new, {} orphaned",
            merged.len(),
            created,
            orphaned
        );

        Ok(merged)
    }

    /// Ids marked included, in store order
    pub fn included_ids(&self) -> StoreResult<Vec<String>> {
        self.ids_where(true)
    }

    /// Ids marked excluded, in store order
    pub fn excluded_ids(&self) -> StoreResult<Vec<String>> {
        self.ids_where(false)
    }

    fn ids_where(&self, included: bool) -> StoreResult<Vec<String>> {
        let ids = self
            .load_selections()?
            .into_iter()
            .filter(|(_, selection)| selection.included == included)
            .map(|(id, _)| id)
            .collect();
        Ok(ids)
    }

    /// `id -> included` for `toc::filter_by_selections`
    pub fn inclusion_map(&self) -> StoreResult<HashMap<String, bool>> {
        let map = self
            .load_selections()?
            .into_iter()
            .map(|(id, selection)| (id, selection.included))
            .collect();
        Ok(map)
    }

    // ---------------------------------------------------------------------
    // Export / import
    // ---------------------------------------------------------------------

    /// Write the selections to a standalone file (YAML for `.yaml`/`.yml`, JSON otherwise)
    pub fn export_selections(&self, output_path: &Path) -> StoreResult<()> {
        let document = ExportDocument {
            version: FORMAT_VERSION.to_string(),
            exported_at: timestamp(),
            selections: self.load_selections()?,
        };
        write_document(output_path, DocumentFormat::from_path(output_path), &document)?;
        info!(
            "Exported {} selections to {}",
            document.selections.len(),
            output_path.display()
        );
        Ok(())
    }

    /// Replace the live selections with the content of an exported file
    ///
    /// Unlike regular loads, a damaged import file is an error and the store is untouched.
    pub fn import_selections(&self, input_path: &Path) -> StoreResult<SelectionMap> {
        let mut document: ExportDocument =
            read_document(input_path, DocumentFormat::from_path(input_path))?;
        document.selections = with_entry_ids(document.selections);

        let mut metadata = Metadata::new();
        metadata.insert(
            "imported_from".to_string(),
            Value::String(input_path.display().to_string()),
        );
        self.save_selections(&document.selections, &metadata)?;
        info!(
            "Imported {} selections from {}",
            document.selections.len(),
            input_path.display()
        );

        Ok(document.selections)
    }

    // ---------------------------------------------------------------------
    // State and descriptions
    // ---------------------------------------------------------------------

    /// Persist generation state, stamped with `updated_at`
    pub fn save_state(&self, state: &Map<String, Value>) -> StoreResult<()> {
        self.ensure_config_dir()?;

        let mut stamped = state.clone();
        stamped.insert("updated_at".to_string(), Value::String(timestamp()));
        write_document(&self.state_path(), DocumentFormat::Json, &stamped)
    }

    pub fn load_state(&self) -> StoreResult<Map<String, Value>> {
        load_or_default(&self.state_path(), DocumentFormat::Json)
    }

    pub fn save_descriptions(&self, descriptions: &DescriptionMap) -> StoreResult<()> {
        self.ensure_config_dir()?;

        let document = DescriptionsDocument {
            version: FORMAT_VERSION.to_string(),
            updated_at: timestamp(),
            descriptions: descriptions.clone(),
        };
        write_document(&self.descriptions_path(), DocumentFormat::Json, &document)
    }

    pub fn load_descriptions(&self) -> StoreResult<DescriptionMap> {
        let document: DescriptionsDocument =
            load_or_default(&self.descriptions_path(), DocumentFormat::Json)?;
        Ok(document.descriptions)
    }

    /// Merge new descriptions over the cached ones; selections are not touched
    pub fn update_descriptions<I>(&self, new_descriptions: I) -> StoreResult<DescriptionMap>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut descriptions = self.load_descriptions()?;
        descriptions.extend(new_descriptions);
        self.save_descriptions(&descriptions)?;
        Ok(descriptions)
    }

    /// Delete all three files; the directory itself stays
    pub fn clear(&self) -> StoreResult<()> {
        for path in [self.selections_path(), self.state_path(), self.descriptions_path()] {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::base::ComponentKind;
    use crate::extractors::python::parse_source;
    use crate::extractors::repository::module_hashes;
    use crate::toc::{build_toc, filter_by_selections};
    use tempfile::TempDir;

    fn store() -> (TempDir, SelectionStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = SelectionStore::for_repository(temp_dir.path());
        (temp_dir, store)
    }

    fn entry(id: &str, level: u32, children: Vec<TocEntry>) -> TocEntry {
        TocEntry {
            id: id.to_string(),
            title: id.to_string(),
            kind: if level == 0 { ComponentKind::Module } else { ComponentKind::Function },
            level,
            parent_id: None,
            file_path: "m.py".to_string(),
            line_number: 1,
            children,
        }
    }

    fn keys(map: &SelectionMap) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_merge_preserves_history() {
        let (_dir, store) = store();
        let mut stored = SelectionMap::new();
        stored.insert("x".to_string(), Selection::new(false));
        store.save_selections(&stored, &Metadata::new()).unwrap();

        let outline = vec![entry("m", 0, vec![entry("x", 1, vec![]), entry("y", 1, vec![])])];
        let merged = store.initialize_from_outline(&outline, true).unwrap();

        assert!(!merged["x"].included, "Existing decision must survive");
        assert_eq!(merged["y"].entry_id, "y");
        assert!(merged["y"].included, "New ids get the default");
        assert!(merged["m"].included);
        assert_eq!(store.load_selections().unwrap(), merged);
    }

    #[test]
    fn test_orphans_are_retained_after_outline_ids() {
        let (_dir, store) = store();
        let mut stored = SelectionMap::new();
        stored.insert("gone_a".to_string(), Selection::new(false));
        stored.insert("kept".to_string(), Selection::new(false));
        stored.insert("gone_b".to_string(), Selection::new(true));
        store.save_selections(&stored, &Metadata::new()).unwrap();

        let outline = vec![entry("m", 0, vec![entry("kept", 1, vec![])])];
        let merged = store.initialize_from_outline(&outline, false).unwrap();

        assert_eq!(keys(&merged), vec!["m", "kept", "gone_a", "gone_b"]);
        assert!(!merged["m"].included, "Default applies to new ids");
        assert!(merged["gone_b"].included);
    }

    #[test]
    fn test_update_selection_is_partial() {
        let (_dir, store) = store();

        let created = store
            .update_selection(
                "abc",
                SelectionUpdate {
                    custom_title: Some("Getting started".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(created.entry_id, "abc");
        assert!(created.included);
        assert_eq!(created.custom_title.as_deref(), Some("Getting started"));

        let updated = store
            .update_selection(
                "abc",
                SelectionUpdate {
                    included: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.included);
        assert_eq!(updated.custom_title.as_deref(), Some("Getting started"));
        assert_eq!(store.load_selections().unwrap()["abc"], updated);
    }

    #[test]
    fn test_round_trip_keeps_order_and_metadata() {
        let (_dir, store) = store();
        let mut selections = SelectionMap::new();
        selections.insert("zeta".to_string(), Selection::new(true));
        selections.insert(
            "alpha".to_string(),
            Selection {
                custom_title: Some("Alpha".to_string()),
                custom_description: Some("First: with colon".to_string()),
                ..Selection::new(false)
            },
        );
        let mut metadata = Metadata::new();
        metadata.insert("repository".to_string(), Value::String("demo".to_string()));

        store.save_selections(&selections, &metadata).unwrap();

        assert_eq!(store.load_selections().unwrap(), with_entry_ids(selections.clone()));
        assert_eq!(keys(&store.load_selections().unwrap()), vec!["zeta", "alpha"]);
        assert_eq!(store.load_metadata().unwrap(), metadata);

        let raw = fs::read_to_string(store.selections_path()).unwrap();
        assert!(raw.contains("version: '1.0'") || raw.contains("version: \"1.0\""));
        assert!(raw.contains("updated_at:"));

        // Updates keep the metadata
        store.update_selection("zeta", SelectionUpdate::default()).unwrap();
        assert_eq!(store.load_metadata().unwrap(), metadata);
    }

    #[test]
    fn test_included_and_excluded_ids() {
        let (_dir, store) = store();
        let mut selections = SelectionMap::new();
        selections.insert("a".to_string(), Selection::new(true));
        selections.insert("b".to_string(), Selection::new(false));
        selections.insert("c".to_string(), Selection::new(true));
        store.save_selections(&selections, &Metadata::new()).unwrap();

        assert_eq!(store.included_ids().unwrap(), vec!["a", "c"]);
        assert_eq!(store.excluded_ids().unwrap(), vec!["b"]);
        assert_eq!(store.inclusion_map().unwrap().get("b"), Some(&false));
    }

    #[test]
    fn test_corrupted_selections_load_empty() {
        let (_dir, store) = store();
        store.ensure_config_dir().unwrap();
        fs::write(store.selections_path(), "selections: [unclosed\n  - : :").unwrap();

        assert!(store.load_selections().unwrap().is_empty());

        // A later reconciliation repairs the file
        let outline = vec![entry("m", 0, vec![])];
        store.initialize_from_outline(&outline, true).unwrap();
        assert_eq!(keys(&store.load_selections().unwrap()), vec!["m"]);
    }

    #[test]
    fn test_export_and_import_both_formats() {
        let (dir, store) = store();
        let mut selections = SelectionMap::new();
        selections.insert("a".to_string(), Selection::new(false));
        selections.insert(
            "b".to_string(),
            Selection {
                custom_title: Some("Bee".to_string()),
                ..Selection::new(true)
            },
        );
        store.save_selections(&selections, &Metadata::new()).unwrap();
        let selections = with_entry_ids(selections);

        let json_path = dir.path().join("shared.json");
        let yaml_path = dir.path().join("shared.yml");
        store.export_selections(&json_path).unwrap();
        store.export_selections(&yaml_path).unwrap();

        let json: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["version"], "1.0");
        assert!(json["exported_at"].is_string());
        assert_eq!(json["selections"]["a"]["included"], false);
        assert_eq!(json["selections"]["b"]["custom_title"], "Bee");

        // Import replaces, never merges
        store.update_selection("local_only", SelectionUpdate::default()).unwrap();
        let imported = store.import_selections(&yaml_path).unwrap();
        assert_eq!(imported, selections);
        assert_eq!(store.load_selections().unwrap(), selections);

        store.clear().unwrap();
        assert_eq!(store.import_selections(&json_path).unwrap(), selections);
    }

    #[test]
    fn test_import_handwritten_yaml() {
        let (dir, store) = store();
        let path = dir.path().join("team.yaml");
        fs::write(&path, "selections:\n  abc:\n    included: false\n  def:\n    custom_title: Nice\n").unwrap();

        let imported = store.import_selections(&path).unwrap();
        assert!(!imported["abc"].included);
        assert_eq!(imported["def"].entry_id, "def");
        assert!(imported["def"].included);
        assert_eq!(imported["def"].custom_title.as_deref(), Some("Nice"));
    }

    #[test]
    fn test_corrupted_import_is_an_error() {
        let (dir, store) = store();
        store.update_selection("keep", SelectionUpdate::default()).unwrap();

        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"selections\": ").unwrap();
        assert!(matches!(store.import_selections(&path), Err(StoreError::Json { .. })));

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(store.import_selections(&missing), Err(StoreError::Io { .. })));

        assert_eq!(keys(&store.load_selections().unwrap()), vec!["keep"]);
    }

    #[test]
    fn test_descriptions_merge_independently() {
        let (_dir, store) = store();
        store.update_selection("a", SelectionUpdate::default()).unwrap();

        store
            .update_descriptions([("a".to_string(), "First".to_string())])
            .unwrap();
        let merged = store
            .update_descriptions([
                ("a".to_string(), "Rewritten".to_string()),
                ("b".to_string(), "Second".to_string()),
            ])
            .unwrap();

        assert_eq!(merged["a"], "Rewritten");
        assert_eq!(merged["b"], "Second");
        assert_eq!(store.load_descriptions().unwrap(), merged);
        assert_eq!(keys(&store.load_selections().unwrap()), vec!["a"]);
    }

    #[test]
    fn test_state_is_stamped() {
        let (_dir, store) = store();
        let module = parse_source("def run(): ...\n", "app.py", false).unwrap();

        let mut state = Map::new();
        state.insert(
            "file_hashes".to_string(),
            serde_json::to_value(module_hashes(&[module.clone()])).unwrap(),
        );
        store.save_state(&state).unwrap();

        let loaded = store.load_state().unwrap();
        assert!(loaded["updated_at"].is_string());
        assert_eq!(loaded["file_hashes"]["app.py"], module.content_hash.as_str());
        assert!(!state.contains_key("updated_at"), "Caller's map is not modified");
    }

    #[test]
    fn test_clear_removes_every_file() {
        let (_dir, store) = store();
        store.update_selection("a", SelectionUpdate::default()).unwrap();
        store.save_state(&Map::new()).unwrap();
        store.save_descriptions(&DescriptionMap::new()).unwrap();

        store.clear().unwrap();
        assert!(!store.selections_path().exists());
        assert!(!store.state_path().exists());
        assert!(!store.descriptions_path().exists());
        assert!(store.config_dir().exists());

        // Clearing twice is fine
        store.clear().unwrap();
        assert!(store.load_state().unwrap().is_empty());
    }

    #[test]
    fn test_gitignore_gets_config_dir_once() {
        let (dir, store) = store();
        let gitignore = dir.path().join(".gitignore");
        fs::write(&gitignore, "target/\n").unwrap();

        store.ensure_config_dir().unwrap();
        store.ensure_config_dir().unwrap();

        let content = fs::read_to_string(&gitignore).unwrap();
        assert_eq!(content, "target/\n\n# DocuAgent configuration\n.docuagent/\n");
    }

    #[test]
    fn test_no_gitignore_is_created() {
        let (dir, store) = store();
        store.ensure_config_dir().unwrap();
        assert!(store.config_dir().is_dir());
        assert!(!dir.path().join(".gitignore").exists());
    }

    #[test]
    fn test_outline_selection_round_trip() {
        let (_dir, store) = store();
        let source = "def keep(): ...\n\ndef drop(): ...\n";
        let toc = build_toc(&[parse_source(source, "tools.py", false).unwrap()]);
        store.initialize_from_outline(&toc, true).unwrap();

        let drop_id = toc[0].children[1].id.clone();
        store
            .update_selection(
                &drop_id,
                SelectionUpdate {
                    included: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let filtered = filter_by_selections(&toc, &store.inclusion_map().unwrap());
        let titles: Vec<&str> = filtered[0].children.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["keep()"]);
    }
}
