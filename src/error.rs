//! Error types for extraction and persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Why a single source file could not be turned into a module record
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseFailureReason {
    /// The grammar reported error or missing nodes
    #[error("invalid syntax near line {line}")]
    Syntax { line: u32 },

    /// The file is not valid UTF-8
    #[error("undecodable source: {0}")]
    Encoding(String),

    /// The file could not be read at all
    #[error("unreadable source: {0}")]
    Io(String),

    /// The parser could not be set up or gave up without a tree
    #[error("parser unavailable: {0}")]
    Grammar(String),
}

/// Per-file parse failure. Never fatal: the repository walk logs it and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("could not parse '{file_path}': {reason}")]
pub struct ParseFailure {
    pub file_path: String,
    pub reason: ParseFailureReason,
}

impl ParseFailure {
    pub fn new(file_path: impl Into<String>, reason: ParseFailureReason) -> Self {
        Self {
            file_path: file_path.into(),
            reason,
        }
    }

    /// True for malformed syntax, false for encoding or I/O trouble
    pub fn is_syntax(&self) -> bool {
        matches!(self.reason, ParseFailureReason::Syntax { .. })
    }
}

/// Failures of the selection store and its sibling files
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access '{path}': {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("invalid YAML in '{path}': {error}")]
    Yaml {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    #[error("invalid JSON in '{path}': {error}")]
    Json {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    pub(crate) fn yaml(path: impl Into<PathBuf>, error: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            error,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, error: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            error,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
