//! Error types for the harvester.
//!
//! Uses the dual-error pattern: `HarvesterError` for library consumers
//! with detailed error context, and `ConfigError` for everything that can
//! go wrong while reading an article selector configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors in an article selector configuration.
///
/// All of these are fatal: a run cannot continue with a broken config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be parsed.
    #[error("Invalid config syntax: {0}")]
    Syntax(String),

    /// A section, definition or data block is not a mapping (or list of mappings).
    #[error("{context} must be a dict or a list of dicts, got: {found}")]
    NotAMapping { context: String, found: String },

    /// A section has no `defined-by` key.
    #[error("{section} does not contain the required 'defined-by' key.")]
    MissingDefinedBy { section: String },

    /// A `tag` or attribute value is neither a string nor a list of strings.
    #[error("{found} must be a string or list of strings (in {context})")]
    InvalidPatterns { context: String, found: String },

    /// A regular expression in the config did not compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A path query uses syntax outside the supported subset.
    #[error("Invalid path query '{query}': {reason}")]
    InvalidPath { query: String, reason: String },
}

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Selector configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Loading IAO reference data failed.
    #[error(transparent)]
    Sections(#[from] iao_sections::SectionsError),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Reading or writing a file failed.
    #[error("IO error on {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input file pattern.
    #[error("Invalid file pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Directory traversal failed.
    #[error("Directory traversal failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// A supplementary extractor backend failed.
    #[error("Failed to extract {}: {message}", .path.display())]
    Extraction { path: PathBuf, message: String },
}

impl HarvesterError {
    /// Wrap an IO error with the path that caused it.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
