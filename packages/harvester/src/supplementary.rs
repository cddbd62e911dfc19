//! Routing of supplementary files to text extractors.
//!
//! Extraction itself is pluggable through [`SupplementaryExtractor`]; this
//! module decides which backend a file goes to and collects the results.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

/// Word-processor extensions.
pub const WORD_EXTENSIONS: &[&str] = &["doc", "docx"];

/// Spreadsheet extensions.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["csv", "xls", "xlsx"];

pub const PDF_EXTENSION: &str = "pdf";

/// Kind of supplementary file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplementaryKind {
    Word,
    Pdf,
    Spreadsheet,
}

impl SupplementaryKind {
    /// Kind by (case-insensitive) file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_extension(&extension)
    }

    fn from_extension(extension: &str) -> Option<Self> {
        if WORD_EXTENSIONS.contains(&extension) {
            Some(Self::Word)
        } else if extension == PDF_EXTENSION {
            Some(Self::Pdf)
        } else if SPREADSHEET_EXTENSIONS.contains(&extension) {
            Some(Self::Spreadsheet)
        } else {
            None
        }
    }
}

/// Backend that turns supplementary files into text.
pub trait SupplementaryExtractor {
    /// Extract text from a `.doc`/`.docx` file.
    fn extract_word(&self, path: &Path) -> Result<String>;

    /// Extract text from a PDF.
    fn extract_pdf(&self, path: &Path) -> Result<String>;

    /// Extract text from a `.csv`/`.xls`/`.xlsx` file.
    fn extract_spreadsheet(&self, path: &Path) -> Result<String>;
}

/// Text extracted from one supplementary file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplementaryText {
    pub path: PathBuf,
    pub kind: SupplementaryKind,
    pub text: String,
}

/// Send each file to the matching extractor.
///
/// Missing paths, directories and unsupported extensions are skipped.
/// Extraction failures are logged and skipped so one bad file does not
/// stop the rest.
pub fn process_supplementary_files(
    files: &[PathBuf],
    extractor: &impl SupplementaryExtractor,
) -> Vec<SupplementaryText> {
    let mut extracted = Vec::new();

    for path in files {
        if !path.exists() || path.is_dir() {
            tracing::debug!(path = %path.display(), "Skipping missing path or directory");
            continue;
        }
        let Some(kind) = SupplementaryKind::from_path(path) else {
            tracing::debug!(path = %path.display(), "Skipping unsupported supplementary file");
            continue;
        };

        let result = match kind {
            SupplementaryKind::Word => extractor.extract_word(path),
            SupplementaryKind::Pdf => extractor.extract_pdf(path),
            SupplementaryKind::Spreadsheet => extractor.extract_spreadsheet(path),
        };

        match result {
            Ok(text) => extracted.push(SupplementaryText {
                path: path.clone(),
                kind,
                text,
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Supplementary extraction failed");
            }
        }
    }

    extracted
}
