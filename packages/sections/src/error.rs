//! Error types for the section resolver.
//!
//! Reference data loading is the only fallible part of this crate: resolving
//! headings never fails, it leaves headings unresolved instead.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for loading IAO reference data.
#[derive(Debug, Error)]
pub enum SectionsError {
    /// A reference resource could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// GraphML parsing failed.
    #[error("GraphML parsing failed: {0}")]
    GraphMl(#[from] roxmltree::Error),

    /// Edge cost could not be parsed as a number.
    #[error("Invalid cost '{value}' on edge {source_node} -> {target_node}")]
    InvalidCost {
        source_node: String,
        target_node: String,
        value: String,
    },

    /// A required GraphML element or attribute was missing.
    #[error("Missing required GraphML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// A term table line did not have the expected tab-separated columns.
    #[error("Malformed line {line} in {table}: '{content}'")]
    MalformedLine {
        table: &'static str,
        line: usize,
        content: String,
    },
}

impl SectionsError {
    /// Wrap an IO error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for section resolver operations.
pub type Result<T> = std::result::Result<T, SectionsError>;
