//! Error types for blogstore
//!
//! Provides a unified error type for all storage operations. Every variant
//! carries the directory, stage or path it concerns so callers can render a
//! useful message without re-deriving context.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using BlogError
pub type Result<T> = std::result::Result<T, BlogError>;

/// Unified error type for blogstore operations
#[derive(Debug, Error)]
pub enum BlogError {
    // -------------------------------------------------------------------------
    // Content File Errors
    // -------------------------------------------------------------------------
    /// A content directory or file could not be created or written
    #[error("Storage write failed at {}: {source}", .path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A content file exists but could not be read
    #[error("Storage read failed at {}: {source}", .path.display())]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    /// The metadata index could not be loaded, serialized or persisted
    #[error("Metadata index error at {}: {reason}", .path.display())]
    StorageIndex { path: PathBuf, reason: String },

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    /// No index entry for the directory (or for the requested stage)
    #[error("Blog not found: {directory}{}", stage_suffix(.stage))]
    NotFound {
        directory: String,
        stage: Option<String>,
    },

    /// The index references a content file that is missing on disk
    #[error("Index out of sync: {directory}/{stage} is indexed but {} does not exist", .path.display())]
    Desync {
        directory: String,
        stage: String,
        path: PathBuf,
    },

    // -------------------------------------------------------------------------
    // Input / Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn stage_suffix(stage: &Option<String>) -> String {
    match stage {
        Some(stage) => format!(" (stage '{}')", stage),
        None => String::new(),
    }
}

impl BlogError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BlogError::StorageWrite {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BlogError::StorageRead {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn index(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        BlogError::StorageIndex {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for plain absence (`NotFound`), false for every other kind
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogError::NotFound { .. })
    }

    /// True when the index and the filesystem disagree
    pub fn is_desync(&self) -> bool {
        matches!(self, BlogError::Desync { .. })
    }
}
