//! Repository Extractor - walks a source tree and parses every documented file
//!
//! Enumerates Python files under a root, applies the exclusion set, parses each surviving
//! file, drops modules without public API and sorts the rest by path. Output is a pure
//! function of the filesystem snapshot and the options.

use crate::error::ParseFailure;
use crate::extractors::base::Module;
use crate::extractors::python::parse_file;
use crate::language::is_source_file;
use crate::utils::ignore::{load_docuagentignore, ExclusionSet};
use crate::utils::paths::to_relative_unix_style;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Options for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Document underscore-prefixed names too
    pub include_private: bool,
    /// Keep test files and directories (drops the test patterns from the defaults)
    pub include_tests: bool,
    /// Extra glob patterns on top of the defaults and `.docuagentignore`
    pub exclude_patterns: Vec<String>,
    /// Parse files on the rayon pool; output is identical to a sequential run
    pub parallel: bool,
}

/// Result of one extraction run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Modules with public API, sorted by file path
    pub modules: Vec<Module>,
    /// Files that could not be parsed, in walk order
    pub warnings: Vec<ParseFailure>,
}

/// A source file found by the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Relative Unix-style path used for ids and display
    pub relative_path: String,
}

/// Walks one repository
pub struct RepositoryExtractor {
    root: PathBuf,
    options: ExtractOptions,
    exclusions: ExclusionSet,
}

impl RepositoryExtractor {
    /// Build the extractor; `.docuagentignore` patterns are read here
    pub fn new(root: impl Into<PathBuf>, options: ExtractOptions) -> Self {
        let root = root.into();

        let mut patterns = options.exclude_patterns.clone();
        match load_docuagentignore(&root) {
            Ok(custom) => patterns.extend(custom),
            Err(e) => tracing::warn!("Ignoring unreadable exclusion file: {}", e),
        }
        let exclusions = ExclusionSet::new(options.include_tests, &patterns);

        Self {
            root,
            options,
            exclusions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Every non-excluded source file, sorted by relative path
    pub fn discover_files(&self) -> Vec<SourceFile> {
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                // Excluded directory names exclude every file below them
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self
                        .exclusions
                        .is_excluded(Path::new(entry.file_name()))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable path during walk: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }

            let relative_path = match to_relative_unix_style(entry.path(), &self.root) {
                Ok(relative) => relative,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            if self.exclusions.is_excluded(Path::new(&relative_path)) {
                continue;
            }

            files.push(SourceFile {
                path: entry.path().to_path_buf(),
                relative_path,
            });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        files
    }

    /// Parse every discovered file
    ///
    /// A file that fails to parse is logged, recorded in `warnings` and skipped; it never
    /// aborts the run.
    pub fn extract(&self) -> Extraction {
        let files = self.discover_files();
        let include_private = self.options.include_private;
        let parse = |file: &SourceFile| parse_file(&file.path, &file.relative_path, include_private);

        let results: Vec<Result<Module, ParseFailure>> = if self.options.parallel {
            files.par_iter().map(parse).collect()
        } else {
            files.iter().map(parse).collect()
        };

        let mut extraction = Extraction::default();
        for result in results {
            match result {
                Ok(module) if module.has_public_api() => extraction.modules.push(module),
                Ok(module) => tracing::debug!("No public API in {}", module.file_path),
                Err(failure) => {
                    tracing::warn!("{}", failure);
                    extraction.warnings.push(failure);
                }
            }
        }

        extraction
            .modules
            .sort_by(|a, b| a.file_path.cmp(&b.file_path));

        tracing::info!(
            "Extracted {} modules from {} files under {} ({} skipped)",
            extraction.modules.len(),
            files.len(),
            self.root.display(),
            extraction.warnings.len()
        );

        extraction
    }
}

/// Extract a repository in one call
pub fn extract_repository(root: impl Into<PathBuf>, options: ExtractOptions) -> Extraction {
    RepositoryExtractor::new(root, options).extract()
}

/// Aggregate counts over an extracted module list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatistics {
    pub total_modules: usize,
    pub total_classes: usize,
    pub total_functions: usize,
    pub total_methods: usize,
    /// Properties and class variables together
    pub total_properties: usize,
    pub total_constants: usize,
    pub modules_with_docstrings: usize,
    pub classes_with_docstrings: usize,
    pub functions_with_docstrings: usize,
}

impl ApiStatistics {
    pub fn from_modules(modules: &[Module]) -> Self {
        let documented = |docstring: &Option<String>| {
            docstring.as_deref().is_some_and(|text| !text.is_empty())
        };

        let mut stats = ApiStatistics {
            total_modules: modules.len(),
            ..Default::default()
        };

        for module in modules {
            if documented(&module.docstring) {
                stats.modules_with_docstrings += 1;
            }

            stats.total_classes += module.classes.len();
            stats.total_functions += module.functions.len();
            stats.total_constants += module.constants.len();
            stats.functions_with_docstrings += module
                .functions
                .iter()
                .filter(|function| documented(&function.docstring))
                .count();

            for class in &module.classes {
                if documented(&class.docstring) {
                    stats.classes_with_docstrings += 1;
                }
                stats.total_methods += class.methods.len();
                stats.total_properties += class.properties.len() + class.class_variables.len();
            }
        }

        stats
    }
}

/// `file_path -> content_hash` for every module, in module order
pub fn module_hashes(modules: &[Module]) -> IndexMap<String, String> {
    modules
        .iter()
        .map(|module| (module.file_path.clone(), module.content_hash.clone()))
        .collect()
}
