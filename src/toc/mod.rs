//! Table of contents over extracted modules
//!
//! The outline is a forest of `TocEntry` trees, one per module. Every entry id is the id of
//! the component it stands for, so selections and descriptions stored against entry ids
//! resolve back to component records.
//!
//! # Hierarchy
//!
//! - level 0: modules
//! - level 1: classes, functions, significant constants
//! - level 2: methods, properties, class variables

pub mod builder;

pub use builder::{
    class_title, function_title, is_significant_constant, method_title, module_title, TocBuilder,
};

use crate::extractors::base::{ComponentKind, Module};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// One node of the outline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TocEntry {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    /// 0 for modules, parent level + 1 below
    pub level: u32,
    pub parent_id: Option<String>,
    pub file_path: String,
    pub line_number: u32,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub(crate) fn leaf(
        id: &str,
        title: String,
        kind: ComponentKind,
        level: u32,
        parent_id: &str,
        file_path: &str,
        line_number: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            title,
            kind,
            level,
            parent_id: Some(parent_id.to_string()),
            file_path: file_path.to_string(),
            line_number,
            children: Vec::new(),
        }
    }

    /// Nested map `{id, title, type, level, file_path, line_number, children}`
    pub fn to_value(&self) -> Value {
        let children: Vec<Value> = self.children.iter().map(TocEntry::to_value).collect();
        json!({
            "id": self.id,
            "title": self.title,
            "type": self.kind.to_string(),
            "level": self.level,
            "file_path": self.file_path,
            "line_number": self.line_number,
            "children": children,
        })
    }
}

/// Build the outline with default options
pub fn build_toc(modules: &[Module]) -> Vec<TocEntry> {
    TocBuilder::default().build(modules)
}

/// Pre-order, depth-first: every parent directly before its subtree
pub fn flatten(entries: &[TocEntry]) -> Vec<&TocEntry> {
    let mut flat = Vec::new();
    for entry in entries {
        flatten_into(entry, &mut flat);
    }
    flat
}

fn flatten_into<'a>(entry: &'a TocEntry, flat: &mut Vec<&'a TocEntry>) {
    flat.push(entry);
    for child in &entry.children {
        flatten_into(child, flat);
    }
}

pub fn get_entry_by_id<'a>(entries: &'a [TocEntry], id: &str) -> Option<&'a TocEntry> {
    flatten(entries).into_iter().find(|entry| entry.id == id)
}

/// Rebuild the outline without excluded entries
///
/// An entry is dropped only when `selections` maps its id to `false`; ids missing from the
/// map stay. Children are filtered on their own, so a kept parent may lose some children,
/// and a dropped parent takes its whole subtree with it.
pub fn filter_by_selections(entries: &[TocEntry], selections: &HashMap<String, bool>) -> Vec<TocEntry> {
    entries
        .iter()
        .filter(|entry| selections.get(&entry.id).copied().unwrap_or(true))
        .map(|entry| TocEntry {
            children: filter_by_selections(&entry.children, selections),
            ..entry.clone()
        })
        .collect()
}

/// Serialize a whole outline for external consumers
pub fn to_value(entries: &[TocEntry]) -> Value {
    Value::Array(entries.iter().map(TocEntry::to_value).collect())
}

/// Resolve a user reference to an entry
///
/// A number is a 1-based position in the flattened outline. Anything else is an id prefix
/// and must match exactly one entry.
pub fn find_by_prefix<'a>(entries: &'a [TocEntry], reference: &str) -> Option<&'a TocEntry> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    let flat = flatten(entries);

    if let Ok(index) = reference.parse::<usize>() {
        if index >= 1 && index <= flat.len() {
            return Some(flat[index - 1]);
        }
    }

    let mut matches = flat.into_iter().filter(|entry| entry.id.starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(entry), None) => Some(entry),
        (Some(first), Some(_)) => {
            tracing::debug!("Ambiguous id prefix '{}' (first match {})", reference, first.id);
            None
        }
        _ => None,
    }
}
