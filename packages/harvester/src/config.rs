//! Configuration constants and validation functions for the harvester.

use std::path::Path;

use crate::error::{HarvesterError, Result};

/// Default pattern for article files when a directory is given as input.
pub const DEFAULT_INPUT_PATTERN: &str = r"(?i).*\.html?$";

/// Directory name fragments skipped during input discovery.
pub const SKIPPED_DIRECTORIES: &[&str] = &["ipynb_checkpoints"];

/// Selector config section holding the article title.
pub const TITLE_SECTION: &str = "title";

/// Selector config section holding the article body sections.
pub const SECTIONS_SECTION: &str = "sections";

/// Selector config section holding tables.
pub const TABLES_SECTION: &str = "tables";

/// `data` keys that provide a section's heading, in priority order.
pub const HEADING_DATA_KEYS: &[&str] = &["headers", "title"];

/// `data` key that provides a section's paragraphs.
pub const PARAGRAPH_DATA_KEY: &str = "paragraphs";

/// Tags whose boundaries are kept as literal markers in table text.
pub const SUPSUB_TAGS: &[&str] = &["sup", "sub"];

/// IAO name and identifier of the document title passage.
pub const DOCUMENT_TITLE_IAO_NAME: &str = "document title";
pub const DOCUMENT_TITLE_IAO_ID: &str = "IAO:0000305";

/// BioC collection metadata.
pub const BIOC_SOURCE: &str = "IAO Harvester (full-text)";
pub const BIOC_KEY: &str = "iao_harvester_fulltext.key";

/// Environment variables used as fallbacks for reference data paths.
pub const MAPPING_ENV: &str = "IAO_MAPPING";
pub const TERM_IDS_ENV: &str = "IAO_TERM_IDS";
pub const DAG_ENV: &str = "IAO_DAG";

/// Validate that a reference resource exists and is a regular file.
///
/// # Errors
/// Returns `HarvesterError::File` with `NotFound` or `InvalidInput`.
///
/// # Examples
/// ```
/// use iao_harvester::config::validate_resource_path;
/// use std::path::Path;
///
/// assert!(validate_resource_path(Path::new("/nonexistent/DAG_model.graphml")).is_err());
/// ```
pub fn validate_resource_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(HarvesterError::file(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "resource does not exist"),
        ));
    }
    if !path.is_file() {
        return Err(HarvesterError::file(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "resource is not a file"),
        ));
    }
    Ok(())
}

/// Validate that an output path is an existing directory.
///
/// # Errors
/// Returns `HarvesterError::File` with `NotFound` or `InvalidInput`.
pub fn validate_output_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(HarvesterError::file(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "output directory does not exist"),
        ));
    }
    if !path.is_dir() {
        return Err(HarvesterError::file(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "output path is not a directory"),
        ));
    }
    Ok(())
}
