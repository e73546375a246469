//! DocuAgent Extractors Module
//!
//! Tree-sitter based extraction of the public API of a Python repository.
//!
//! # Architecture
//!
//! The module is organized into several sub-modules:
//! - `base` - Component model and the shared per-file `BaseExtractor`
//! - `python` - Source parser: one file into one module record
//! - `repository` - Repository walk, exclusion rules, sorting and statistics

pub mod base;
pub mod python;
pub mod repository;

// Re-export the public API
pub use base::{
    find_component, generate_id, Class, Component, ComponentKind, ComponentRef, Function, Method,
    Module, Parameter, Property,
};
pub use python::{parse_file, parse_source, PythonExtractor};
pub use repository::{
    extract_repository, module_hashes, ApiStatistics, ExtractOptions, Extraction,
    RepositoryExtractor, SourceFile,
};
