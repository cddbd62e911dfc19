//! Heading → IAO term mapping table and IAO term → identifier table.
//!
//! Both tables are tab-delimited text resources. The mapping table has one
//! `heading<TAB>term` pair per line, where the term column may hold two terms
//! separated by a single `/` (e.g. `results/discussion`). The identifier table
//! has one `term<TAB>IAO:0000xxx` pair per line.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SectionsError};

/// An IAO category together with its identifier.
///
/// This is the record shape emitted for every resolved heading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IaoTerm {
    /// Lowercase IAO term name (e.g. "methods section").
    pub iao_name: String,

    /// IAO identifier (e.g. "IAO:0000317"), empty when unknown.
    pub iao_id: String,
}

/// Lowercase and trim a heading for dictionary lookup.
#[must_use]
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// In-memory view of the mapping and identifier tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermDictionary {
    heading_terms: HashMap<String, Vec<String>>,
    term_headings: BTreeMap<String, Vec<String>>,
    term_ids: HashMap<String, String>,
}

impl TermDictionary {
    /// Create an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load both tables from disk.
    ///
    /// # Errors
    /// Returns `SectionsError::Io` if either file cannot be read, or
    /// `SectionsError::MalformedLine` for lines without a tab separator.
    pub fn load(mapping_path: &Path, ids_path: &Path) -> Result<Self> {
        let mapping = fs::read_to_string(mapping_path)
            .map_err(|e| SectionsError::io(mapping_path, e))?;
        let ids = fs::read_to_string(ids_path).map_err(|e| SectionsError::io(ids_path, e))?;

        let dictionary = Self::from_strs(&mapping, &ids)?;
        tracing::debug!(
            headings = dictionary.heading_terms.len(),
            terms = dictionary.term_ids.len(),
            "Loaded IAO term dictionary"
        );
        Ok(dictionary)
    }

    /// Build a dictionary from the raw table contents.
    ///
    /// # Errors
    /// Returns `SectionsError::MalformedLine` for non-empty lines without a tab.
    pub fn from_strs(mapping: &str, ids: &str) -> Result<Self> {
        let mut dictionary = Self::new();

        for (index, line) in mapping.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (heading, terms) = split_columns(line).ok_or_else(|| {
                SectionsError::MalformedLine {
                    table: "heading mapping table",
                    line: index + 1,
                    content: line.to_string(),
                }
            })?;
            let heading = normalize_key(heading);
            for term in split_terms(terms) {
                dictionary.add_mapping(&heading, &term);
            }
        }

        for (index, line) in ids.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (term, id) = split_columns(line).ok_or_else(|| SectionsError::MalformedLine {
                table: "term id table",
                line: index + 1,
                content: line.to_string(),
            })?;
            dictionary.add_term_id(term, id.trim());
        }

        Ok(dictionary)
    }

    /// Record that `heading` maps to `term`.
    ///
    /// Duplicate pairs are ignored so repeated table lines are harmless.
    pub fn add_mapping(&mut self, heading: &str, term: &str) {
        let terms = self.heading_terms.entry(heading.to_string()).or_default();
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }

        let headings = self.term_headings.entry(term.to_string()).or_default();
        if !headings.iter().any(|h| h == heading) {
            headings.push(heading.to_string());
        }
    }

    /// Register an identifier for a term.
    pub fn add_term_id(&mut self, term: &str, id: &str) {
        self.term_ids.insert(normalize_key(term), id.to_string());
    }

    /// Terms mapped to a heading (case-insensitive), empty when unmapped.
    #[must_use]
    pub fn terms_for_heading(&self, heading: &str) -> &[String] {
        self.heading_terms
            .get(&normalize_key(heading))
            .map_or(&[], Vec::as_slice)
    }

    /// Headings that map to a term, in table order.
    #[must_use]
    pub fn headings_for_term(&self, term: &str) -> &[String] {
        self.term_headings
            .get(&normalize_key(term))
            .map_or(&[], Vec::as_slice)
    }

    /// Identifier of a term, or an empty string when the term is unknown.
    #[must_use]
    pub fn term_id(&self, term: &str) -> &str {
        self.term_ids
            .get(&normalize_key(term))
            .map_or("", String::as_str)
    }

    /// Build the `{iao_name, iao_id}` record for a term.
    #[must_use]
    pub fn iao_term(&self, term: &str) -> IaoTerm {
        IaoTerm {
            iao_name: term.to_string(),
            iao_id: self.term_id(term).to_string(),
        }
    }

    /// All terms that appear in the mapping table, sorted.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.term_headings.keys().map(String::as_str)
    }

    /// Number of distinct headings in the mapping table.
    #[must_use]
    pub fn heading_count(&self) -> usize {
        self.heading_terms.len()
    }
}

/// Split a table line into its first two tab-separated columns.
fn split_columns(line: &str) -> Option<(&str, &str)> {
    let mut columns = line.split('\t');
    let first = columns.next()?;
    let second = columns.next()?;
    Some((first, second))
}

/// Split a term column into one or two lowercase terms.
fn split_terms(column: &str) -> Vec<String> {
    let column = normalize_key(column);
    if column.is_empty() {
        return Vec::new();
    }

    column
        .split('/')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}
