//! Exclusion patterns for the repository walk
//!
//! Shell-style glob patterns (`*.egg-info`, `test_*`) tested against every path segment
//! and against the whole relative path. Patterns come from the built-in defaults, the
//! caller, and an optional `.docuagentignore` file at the repository root.
//!
use anyhow::Result;
use glob::Pattern;
use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Per-repository ignore file
pub const IGNORE_FILE_NAME: &str = ".docuagentignore";

/// Build artifacts, caches, virtual environments, VCS metadata and test files
pub const DEFAULT_EXCLUDE_PATTERNS: [&str; 20] = [
    "__pycache__",
    "*.pyc",
    ".git",
    ".venv",
    "venv",
    "env",
    ".env",
    "node_modules",
    "dist",
    "build",
    "*.egg-info",
    ".tox",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    "tests",
    "test_*",
    "*_test.py",
    "conftest.py",
    "setup.py",
];

/// Defaults dropped when test files are documented too
pub const TEST_FILE_PATTERNS: [&str; 4] = ["tests", "test_*", "*_test.py", "conftest.py"];

static COMPILED_DEFAULTS: Lazy<Vec<(&'static str, Pattern)>> = Lazy::new(|| {
    DEFAULT_EXCLUDE_PATTERNS
        .iter()
        .filter_map(|raw| Pattern::new(raw).ok().map(|pattern| (*raw, pattern)))
        .collect()
});

/// Load custom exclusion patterns from `.docuagentignore` in the repository root
///
/// Returns a vector of patterns. Empty lines and comments (lines starting with #) are skipped.
///
/// # Examples
///
/// ```text
/// # .docuagentignore file content
/// migrations
/// *_pb2.py
/// docs/conf.py
/// ```
pub fn load_docuagentignore(repo_root: &Path) -> Result<Vec<String>> {
    let ignore_file = repo_root.join(IGNORE_FILE_NAME);

    if !ignore_file.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&ignore_file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", IGNORE_FILE_NAME, e))?;

    let patterns: Vec<String> = content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect();

    if !patterns.is_empty() {
        debug!(
            "Loaded {} custom exclusion patterns from {}",
            patterns.len(),
            IGNORE_FILE_NAME
        );
    }

    Ok(patterns)
}

/// Compiled exclusion set
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    /// Default patterns (minus the test set when `include_tests`) plus `extra`
    ///
    /// Extra patterns that are not valid globs are skipped with a warning.
    pub fn new(include_tests: bool, extra: &[String]) -> Self {
        let mut patterns: Vec<Pattern> = COMPILED_DEFAULTS
            .iter()
            .filter(|(raw, _)| !(include_tests && TEST_FILE_PATTERNS.contains(raw)))
            .map(|(_, pattern)| pattern.clone())
            .collect();

        for raw in extra {
            match Pattern::new(raw) {
                Ok(pattern) => patterns.push(pattern),
                Err(e) => warn!("Skipping invalid exclusion pattern '{}': {}", raw, e),
            }
        }

        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check a path relative to the repository root
    ///
    /// A pattern matching any single segment excludes the file wherever that segment
    /// sits; otherwise the whole Unix-style relative path is tested.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let segments: Vec<String> = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        let full_path = segments.join("/");

        self.patterns.iter().any(|pattern| {
            segments.iter().any(|segment| pattern.matches(segment)) || pattern.matches(&full_path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_load_empty_docuagentignore() {
        let temp_dir = TempDir::new().unwrap();
        let patterns = load_docuagentignore(temp_dir.path()).unwrap();
        assert!(
            patterns.is_empty(),
            "Should return empty vector if .docuagentignore doesn't exist"
        );
    }

    #[test]
    fn test_load_docuagentignore_with_patterns() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(IGNORE_FILE_NAME),
            "# Comment line\nmigrations\n*_pb2.py\n\ndocs/conf.py\n# Another comment\n",
        )
        .unwrap();

        let patterns = load_docuagentignore(temp_dir.path()).unwrap();
        assert_eq!(
            patterns,
            vec!["migrations", "*_pb2.py", "docs/conf.py"],
            "Should load 3 patterns (ignoring comments and empty lines)"
        );
    }

    #[test]
    fn test_default_patterns_match_segments_anywhere() {
        let set = ExclusionSet::new(false, &[]);
        assert!(set.is_excluded(&PathBuf::from("pkg/__pycache__/core.py")));
        assert!(set.is_excluded(&PathBuf::from(".venv/lib/site.py")));
        assert!(set.is_excluded(&PathBuf::from("src/mylib.egg-info/meta.py")));
        assert!(set.is_excluded(&PathBuf::from("setup.py")));
        assert!(!set.is_excluded(&PathBuf::from("pkg/core.py")));
        assert!(
            !set.is_excluded(&PathBuf::from("pkg/environment.py")),
            "'env' must match whole segments only"
        );
    }

    #[test]
    fn test_test_patterns_follow_include_tests() {
        let default = ExclusionSet::new(false, &[]);
        assert!(default.is_excluded(&PathBuf::from("tests/test_core.py")));
        assert!(default.is_excluded(&PathBuf::from("pkg/core_test.py")));
        assert!(default.is_excluded(&PathBuf::from("conftest.py")));

        let with_tests = ExclusionSet::new(true, &[]);
        assert_eq!(with_tests.len(), DEFAULT_EXCLUDE_PATTERNS.len() - TEST_FILE_PATTERNS.len());
        assert!(!with_tests.is_excluded(&PathBuf::from("tests/test_core.py")));
        assert!(with_tests.is_excluded(&PathBuf::from("build/lib/core.py")));
    }

    #[test]
    fn test_extra_patterns_match_full_path() {
        let set = ExclusionSet::new(false, &["docs/*.py".to_string(), "[".to_string()]);
        assert!(set.is_excluded(&PathBuf::from("docs/conf.py")));
        assert!(!set.is_excluded(&PathBuf::from("pkg/docs.py")));
        assert_eq!(set.len(), DEFAULT_EXCLUDE_PATTERNS.len() + 1, "Invalid glob is skipped");
    }
}
