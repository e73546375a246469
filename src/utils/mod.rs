// DocuAgent Utilities Module
//
// Common helpers shared by the repository walk, the parser and the store.

/// Path conversion utilities (absolute to relative Unix-style, dotted module paths)
pub mod paths;

/// Exclusion pattern utilities (.docuagentignore support)
pub mod ignore;

/// Content hashing
pub mod hashing {
    /// BLAKE3 hex digest of a file's text, used to spot changed files between runs
    pub fn content_hash(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }

}
