// DocuAgent Core - tree-sitter powered public API extraction for Python repositories
//
// Pipeline: the repository extractor finds and parses files into module records, the TOC
// builder turns modules into an outline, and the selection store reconciles outline ids
// with persisted user decisions. Control flows one way; nothing calls back upward.

pub mod error;
pub mod extractors;
pub mod language;
pub mod toc;
pub mod store;
pub mod describe;
pub mod utils;

pub use error::{ParseFailure, ParseFailureReason, StoreError, StoreResult};
pub use extractors::{
    extract_repository, find_component, parse_file, parse_source, ApiStatistics, Class, Component,
    ComponentKind, ComponentRef, ExtractOptions, Extraction, Function, Method, Module, Parameter,
    Property, RepositoryExtractor,
};
pub use store::{Selection, SelectionMap, SelectionStore, SelectionUpdate};
pub use toc::{build_toc, filter_by_selections, flatten, TocBuilder, TocEntry};

/// Crate version, recorded by callers in generated state
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
