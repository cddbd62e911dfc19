//! JSON output files.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bioc::BiocCollection;
use crate::error::{HarvesterError, Result};
use crate::harvester::ArticleOutput;
use crate::tables::TableRecord;

/// Table output of one article.
#[derive(Debug, Serialize)]
struct TablesFile<'a> {
    inputfile: &'a str,
    tables: &'a [TableRecord],
}

/// Paths written for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub bioc: PathBuf,
    pub tables: PathBuf,
}

/// Output file stem for an input: its file name up to the first `.`.
#[must_use]
pub fn output_stem(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .and_then(|n| n.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

/// Serialize `value` as pretty JSON to `path`.
///
/// Writes a temporary file next to `path` and renames it into place.
///
/// # Errors
/// Returns an error if serialization or any file operation fails.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file).map_err(|e| HarvesterError::file(&temp_file, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| HarvesterError::file(&temp_file, e))?;
        file.sync_all().map_err(|e| HarvesterError::file(&temp_file, e))?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path).map_err(|e| HarvesterError::file(path, e))?;
    }

    fs::rename(&temp_file, path).map_err(|e| HarvesterError::file(path, e))
}

/// Write `<stem>_bioc.json` and `<stem>_tables.json` into `output_dir`.
///
/// The BioC file holds a single-document collection.
///
/// # Errors
/// Returns an error if a file cannot be written.
pub fn save_article(
    article: &ArticleOutput,
    collection: &BiocCollection,
    input: &Path,
    output_dir: &Path,
) -> Result<WrittenFiles> {
    let stem = output_stem(input);
    let bioc = output_dir.join(format!("{stem}_bioc.json"));
    let tables = output_dir.join(format!("{stem}_tables.json"));

    write_json(collection, &bioc)?;
    write_json(
        &TablesFile {
            inputfile: &article.document.inputfile,
            tables: &article.tables,
        },
        &tables,
    )?;

    tracing::debug!(bioc = %bioc.display(), tables = %tables.display(), "Wrote article output");
    Ok(WrittenFiles { bioc, tables })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bioc::{BiocDocument, MainText};
    use chrono::NaiveDate;
    use iao_sections::Resolution;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_output_stem() {
        assert_eq!(output_stem(Path::new("in/PMC42.nxml.html")), "PMC42");
        assert_eq!(output_stem(Path::new("article")), "article");
    }

    #[test]
    fn test_save_article() {
        let dir = TempDir::new().unwrap();
        let input = Path::new("PMC7.html");
        let main_text = MainText {
            title: "Title".to_string(),
            paragraphs: Vec::new(),
        };
        let document = BiocDocument::new(input, &main_text);
        let article = ArticleOutput {
            document: document.clone(),
            tables: vec![TableRecord::default()],
            resolution: Resolution::new(),
        };
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let collection = BiocCollection::new(date, vec![document]);

        let written = save_article(&article, &collection, input, dir.path()).unwrap();
        assert_eq!(written.bioc, dir.path().join("PMC7_bioc.json"));

        let bioc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written.bioc).unwrap()).unwrap();
        assert_eq!(bioc["date"], "20250102");
        assert_eq!(bioc["documents"][0]["id"], "PMC7");
        assert_eq!(bioc["documents"][0]["passages"][0]["text"], "Title");

        let tables: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written.tables).unwrap()).unwrap();
        assert_eq!(tables["inputfile"], "PMC7.html");
        assert_eq!(tables["tables"].as_array().unwrap().len(), 1);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
