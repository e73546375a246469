//! On-disk documents of the selection store
//!
//! Every document is rewritten whole on save. Reads of damaged documents fall back to the
//! empty document with a warning; only explicit imports surface parse errors.

use crate::error::{StoreError, StoreResult};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

/// Version written into every document
pub const FORMAT_VERSION: &str = "1.0";

/// `entry_id -> Selection`, in insertion order
pub type SelectionMap = IndexMap<String, Selection>;

/// Free-form metadata stored next to the selections
pub type Metadata = IndexMap<String, serde_json::Value>;

/// `component_id -> generated description`
pub type DescriptionMap = IndexMap<String, String>;

/// A user decision about one outline entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Outline id this decision belongs to; on disk it is the map key
    #[serde(skip)]
    pub entry_id: String,
    #[serde(default = "included_by_default")]
    pub included: bool,
    #[serde(default)]
    pub custom_title: Option<String>,
    #[serde(default)]
    pub custom_description: Option<String>,
}

fn included_by_default() -> bool {
    true
}

impl Selection {
    pub fn new(included: bool) -> Self {
        Self {
            entry_id: String::new(),
            included,
            custom_title: None,
            custom_description: None,
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Copy every map key into its record's `entry_id`
pub(crate) fn with_entry_ids(mut selections: SelectionMap) -> SelectionMap {
    for (id, selection) in selections.iter_mut() {
        selection.entry_id.clone_from(id);
    }
    selections
}

/// `selections.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct SelectionsDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub selections: SelectionMap,
}

/// `descriptions.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct DescriptionsDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub descriptions: DescriptionMap,
}

/// Standalone export file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ExportDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub exported_at: String,
    #[serde(default)]
    pub selections: SelectionMap,
}

/// Current time as RFC 3339
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Serialization format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.yaml` / `.yml` are YAML, everything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "yaml" | "yml" => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }

    pub(crate) fn serialize<T: Serialize>(self, value: &T, path: &Path) -> StoreResult<String> {
        match self {
            DocumentFormat::Yaml => serde_yaml::to_string(value).map_err(|e| StoreError::yaml(path, e)),
            DocumentFormat::Json => {
                serde_json::to_string_pretty(value).map_err(|e| StoreError::json(path, e))
            }
        }
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(self, content: &str, path: &Path) -> StoreResult<T> {
        match self {
            DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| StoreError::yaml(path, e)),
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| StoreError::json(path, e)),
        }
    }
}

/// Read and parse a document that must be valid
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path, format: DocumentFormat) -> StoreResult<T> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    format.deserialize(&content, path)
}

/// Read a persisted document
///
/// Missing or blank files give the default document. Unparseable or non-UTF-8 files are
/// logged and also give the default; other I/O failures are errors.
pub(crate) fn load_or_default<T: DeserializeOwned + Default>(
    path: &Path,
    format: DocumentFormat,
) -> StoreResult<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            warn!("Ignoring unreadable store file {}: {}", path.display(), e);
            return Ok(T::default());
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    match format.deserialize(&content, path) {
        Ok(document) => Ok(document),
        Err(e) => {
            warn!("Ignoring corrupted store file: {}", e);
            Ok(T::default())
        }
    }
}

/// Serialize and replace the whole file
pub(crate) fn write_document<T: Serialize>(path: &Path, format: DocumentFormat, value: &T) -> StoreResult<()> {
    let mut content = format.serialize(value, path)?;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| StoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(&PathBuf::from("a.yaml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(&PathBuf::from("a.YML")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(&PathBuf::from("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(&PathBuf::from("selections")), DocumentFormat::Json);
    }

    #[test]
    fn test_selection_defaults_when_fields_missing() {
        let parsed: SelectionMap =
            serde_yaml::from_str("a:\n  custom_title: Intro\nb:\n  included: false\n").unwrap();
        assert_eq!(
            parsed["a"],
            Selection {
                custom_title: Some("Intro".to_string()),
                ..Selection::new(true)
            }
        );
        assert!(!parsed["b"].included);
        assert!(parsed["b"].entry_id.is_empty());

        let keyed = with_entry_ids(parsed);
        assert_eq!(keyed["a"].entry_id, "a");
        assert_eq!(keyed["b"].entry_id, "b");
    }

    #[test]
    fn test_entry_id_stays_out_of_the_file() {
        let mut selections = SelectionMap::new();
        selections.insert("abc".to_string(), Selection::new(false));
        let text = serde_yaml::to_string(&with_entry_ids(selections)).unwrap();
        assert!(!text.contains("entry_id"));
    }

    #[test]
    fn test_load_or_default_tolerates_damage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("descriptions.json");

        let missing: DescriptionsDocument = load_or_default(&path, DocumentFormat::Json).unwrap();
        assert!(missing.descriptions.is_empty());

        fs::write(&path, "{ not json").unwrap();
        let corrupted: DescriptionsDocument = load_or_default(&path, DocumentFormat::Json).unwrap();
        assert!(corrupted.descriptions.is_empty());

        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let binary: DescriptionsDocument = load_or_default(&path, DocumentFormat::Json).unwrap();
        assert!(binary.descriptions.is_empty());

        assert!(read_document::<DescriptionsDocument>(&path, DocumentFormat::Json).is_err());
    }
}
