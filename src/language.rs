//! Language Support - tree-sitter grammar configuration
//!
//! DocuAgent documents one language. All grammar wiring lives here so the parser and
//! the repository walk agree on what a source file is.

use anyhow::Result;
use std::path::Path;
use tree_sitter::Parser;

/// Name used in logs and prompts
pub const LANGUAGE_NAME: &str = "python";

/// Source file extension picked up by the repository walk
pub const SOURCE_EXTENSION: &str = "py";

/// Get the tree-sitter grammar
pub fn get_tree_sitter_language() -> tree_sitter::Language {
    tree_sitter_python::LANGUAGE.into()
}

/// Create a parser with the grammar already loaded
pub fn new_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&get_tree_sitter_language())
        .map_err(|e| anyhow::anyhow!("Failed to set parser language for {}: {}", LANGUAGE_NAME, e))?;
    Ok(parser)
}

/// Detect language from file extension
pub fn detect_language_from_extension(extension: &str) -> Option<&'static str> {
    match extension {
        SOURCE_EXTENSION => Some(LANGUAGE_NAME),
        _ => None,
    }
}

/// Whether the repository walk should hand this path to the parser
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(detect_language_from_extension)
        .is_some()
}
