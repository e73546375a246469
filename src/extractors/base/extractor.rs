// BaseExtractor implementation for DocuAgent
//
// Holds the per-file state every declaration handler needs: the relative path used in
// identifiers and the raw source used for node text and declaration slices.

use sha2::{Digest, Sha256};
use tree_sitter::Node;

/// Length of the hex identifier kept from the digest
pub const ID_LENGTH: usize = 12;

/// Generate the identifier of a component
///
/// SHA-256 over `file_path:qualified_name:line`, truncated to `ID_LENGTH` hex characters.
/// Stable for as long as path, qualified name and line are unchanged, and identical to
/// the ids already written into existing `selections.yaml` files. Collisions are possible
/// in principle, so treat the result as a probabilistic key.
pub fn generate_id(file_path: &str, qualified_name: &str, line: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}", file_path, qualified_name, line).as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(ID_LENGTH);
    hex
}

/// Per-file extraction state shared by all declaration handlers
pub struct BaseExtractor {
    /// Relative Unix-style path (e.g. `pkg/core.py`)
    pub file_path: String,
    pub content: String,
}

impl BaseExtractor {
    pub fn new(file_path: String, content: String) -> Self {
        Self { file_path, content }
    }

    /// Get text from a tree-sitter node
    pub fn get_node_text(&self, node: &Node) -> String {
        self.source_slice(node).unwrap_or_default().to_string()
    }

    /// Verbatim source for a node's byte span; `None` when the span does not map onto
    /// character boundaries of the source
    pub fn source_slice(&self, node: &Node) -> Option<&str> {
        self.content.get(node.start_byte()..node.end_byte())
    }

    /// Owned declaration slice as stored on component records
    pub fn source_segment(&self, node: &Node) -> Option<String> {
        self.source_slice(node).map(str::to_string)
    }

    /// 1-based line of a node's first character
    pub fn line_number(node: &Node) -> u32 {
        (node.start_position().row + 1) as u32
    }

    /// Identifier for a component declared at `node`
    pub fn generate_id(&self, qualified_name: &str, node: &Node) -> String {
        generate_id(&self.file_path, qualified_name, Self::line_number(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_is_fixed_length_hex() {
        let id = generate_id("pkg/core.py", "Foo.bar", 12);
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_id_matches_existing_selection_files() {
        // sha256("pkg/core.py:Foo:3"), first 12 hex characters
        assert_eq!(generate_id("pkg/core.py", "Foo", 3), "499444393493");
    }

    #[test]
    fn test_generate_id_is_stable() {
        assert_eq!(
            generate_id("pkg/core.py", "Foo", 3),
            generate_id("pkg/core.py", "Foo", 3)
        );
    }

    #[test]
    fn test_generate_id_changes_with_each_input() {
        let base = generate_id("pkg/core.py", "Foo", 3);
        assert_ne!(base, generate_id("pkg/other.py", "Foo", 3));
        assert_ne!(base, generate_id("pkg/core.py", "Bar", 3));
        assert_ne!(base, generate_id("pkg/core.py", "Foo", 4));
    }
}
