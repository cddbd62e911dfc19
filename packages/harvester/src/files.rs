//! Input file discovery.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::config::SKIPPED_DIRECTORIES;
use crate::error::Result;

fn is_skipped(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRECTORIES.iter().any(|s| name.contains(s)))
}

/// Recursively collect files under `base` whose file name matches `pattern`.
///
/// A `base` that is itself a file is returned as-is. Notebook checkpoint
/// directories are not descended into. Results are sorted.
///
/// # Errors
/// Returns an error when the directory tree cannot be walked.
pub fn find_input_files(base: &Path, pattern: &Regex) -> Result<Vec<PathBuf>> {
    if base.is_file() {
        return Ok(vec![base.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(base)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| pattern.is_match(name));
        if matches {
            files.push(entry.into_path());
        }
    }

    files.sort();
    tracing::debug!(base = %base.display(), count = files.len(), "Discovered input files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_INPUT_PATTERN;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn names(files: &[PathBuf], base: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(base).unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn test_find_input_files() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("b")).unwrap();
        fs::create_dir_all(base.join(".ipynb_checkpoints")).unwrap();
        fs::write(base.join("z.html"), "").unwrap();
        fs::write(base.join("b").join("a.HTM"), "").unwrap();
        fs::write(base.join("notes.txt"), "").unwrap();
        fs::write(base.join(".ipynb_checkpoints").join("c.html"), "").unwrap();

        let pattern = Regex::new(DEFAULT_INPUT_PATTERN).unwrap();
        let files = find_input_files(base, &pattern).unwrap();

        assert_eq!(names(&files, base), vec!["b/a.HTM", "z.html"]);
    }

    #[test]
    fn test_single_file_base() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("article.xml");
        fs::write(&file, "<article/>").unwrap();

        let pattern = Regex::new(DEFAULT_INPUT_PATTERN).unwrap();
        assert_eq!(find_input_files(&file, &pattern).unwrap(), vec![file]);
    }

    #[test]
    fn test_missing_base_is_error() {
        let dir = TempDir::new().unwrap();
        let pattern = Regex::new(DEFAULT_INPUT_PATTERN).unwrap();
        assert!(find_input_files(&dir.path().join("missing"), &pattern).is_err());
    }
}
