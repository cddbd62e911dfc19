//! Table extraction.
//!
//! Cell text is flattened with `<sup>`/`<sub>` boundaries kept as literal
//! markers, NFKD-normalised and stripped of leftover inline markup.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::config::SUPSUB_TAGS;
use crate::markup::{Element, MarkupNode};
use crate::matcher::{find_in, find_matches};
use crate::selector::SectionConfig;
use crate::text::{is_mixed_data_type, is_number};

/// Inline markup that survives flattening in some publishers' tables.
#[allow(clippy::expect_used)]
static RESIDUAL_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?span[^>\n]*>?|<hr/>?").expect("valid regex"));

/// Flatten an element's content to text.
///
/// Superscripts and subscripts are wrapped in literal `<sup>`/`<sub>` tags.
#[must_use]
pub fn flatten_children(element: &Element) -> String {
    let mut out = String::new();
    for child in &element.children {
        flatten_node(child, &mut out);
    }
    out
}

fn flatten_node(node: &MarkupNode, out: &mut String) {
    match node {
        MarkupNode::Text(text) => out.extend(text.nfkd()),
        MarkupNode::Element(element) if SUPSUB_TAGS.contains(&element.name.as_str()) => {
            out.push('<');
            out.push_str(&element.name);
            out.push('>');
            for child in &element.children {
                flatten_node(child, out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
        MarkupNode::Element(element) => {
            for child in &element.children {
                flatten_node(child, out);
            }
        }
    }
}

/// Clean flattened cell text.
#[must_use]
pub fn clean_cell(text: &str) -> String {
    let value = text.trim().replace(['\u{2009}', '\u{a0}'], " ");
    let value = RESIDUAL_MARKUP.replace_all(&value, "");
    value.replace("\\n", "")
}

/// Flatten and clean an element in one step.
#[must_use]
pub fn cell_text(element: &Element) -> String {
    clean_cell(&flatten_children(element))
}

/// Coarse content type of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Number,
    Mixed,
    Text,
}

impl CellKind {
    /// Classify cell text.
    #[must_use]
    pub fn classify(text: &str) -> Self {
        if text.trim().is_empty() {
            Self::Empty
        } else if is_number(text) {
            Self::Number
        } else if is_mixed_data_type(text) {
            Self::Mixed
        } else {
            Self::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCell {
    pub text: String,
    pub kind: CellKind,

    /// Whether the cell is a `th` header cell.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub header: bool,
}

impl TableCell {
    fn from_element(element: &Element) -> Self {
        let text = cell_text(element);
        Self {
            kind: CellKind::classify(&text),
            header: element.name == "th",
            text,
        }
    }
}

/// One extracted table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableRecord {
    pub title: Vec<String>,
    pub caption: Vec<String>,
    pub footer: Vec<String>,

    /// Texts of every other `data` selector.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Vec<String>>,

    pub rows: Vec<Vec<TableCell>>,
}

impl TableRecord {
    fn text_slot(&mut self, key: &str) -> &mut Vec<String> {
        match key {
            "title" => &mut self.title,
            "caption" => &mut self.caption,
            "footer" => &mut self.footer,
            _ => self.data.entry(key.to_string()).or_default(),
        }
    }
}

/// Rows of a table node: every `tr` with its `td`/`th` cells.
#[must_use]
pub fn table_rows(table: &Element) -> Vec<Vec<TableCell>> {
    table
        .descendants()
        .filter(|e| e.name == "tr")
        .map(|row| {
            row.child_elements()
                .filter(|cell| matches!(cell.name.as_str(), "td" | "th"))
                .map(TableCell::from_element)
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

/// Extract all tables matched by a section.
///
/// `title`, `caption` and `footer` data selectors fill the matching fields;
/// other selectors land in `data`. Within one selector, texts already seen
/// are skipped.
#[must_use]
pub fn extract_tables(section: &SectionConfig, root: &Element) -> Vec<TableRecord> {
    find_matches(section, root)
        .into_iter()
        .map(|node| {
            let mut record = TableRecord {
                rows: table_rows(node),
                ..TableRecord::default()
            };

            for (key, definitions) in &section.data {
                let mut seen = HashSet::new();
                let texts: Vec<String> = find_in(definitions, node)
                    .into_iter()
                    .map(cell_text)
                    .filter(|text| seen.insert(text.clone()))
                    .collect();
                if !texts.is_empty() {
                    record.text_slot(key).extend(texts);
                }
            }

            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_html;
    use crate::selector::ArticleConfig;
    use pretty_assertions::assert_eq;

    fn tables_config() -> ArticleConfig {
        ArticleConfig::from_json_str(
            r#"{"tables": {
                "defined-by": [{"tag": "table"}],
                "data": {
                    "caption": [{"tag": "caption"}],
                    "cells": [{"tag": "td"}]
                }
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_flatten_keeps_supsub_markers() {
        let root = parse_html("<p>10<sup>-3</sup> mol and CO<sub>2</sub></p>");
        let p = root.descendants().find(|e| e.name == "p").unwrap();
        assert_eq!(flatten_children(p), "10<sup>-3</sup> mol and CO<sub>2</sub>");
    }

    #[test]
    fn test_flatten_normalizes_nfkd() {
        let p = Element::new("p").with_text("\u{fb01}le");
        assert_eq!(flatten_children(&p), "file");
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell("  1\u{2009}000 "), "1 000");
        assert_eq!(clean_cell("a\u{a0}b"), "a b");
        assert_eq!(clean_cell("<span class=\"x\">v</span>"), "v");
        assert_eq!(clean_cell("a<hr/>b\\nc"), "abc");
    }

    #[test]
    fn test_cell_kind() {
        assert_eq!(CellKind::classify("1,200"), CellKind::Number);
        assert_eq!(CellKind::classify("12 mg"), CellKind::Mixed);
        assert_eq!(CellKind::classify("control"), CellKind::Text);
        assert_eq!(CellKind::classify(" "), CellKind::Empty);
    }

    #[test]
    fn test_identical_cells_are_deduplicated() {
        let root = parse_html(
            "<table><caption>Table 1</caption><tr><td>same</td><td>same</td></tr></table>",
        );
        let config = tables_config();
        let tables = extract_tables(config.section("tables").unwrap(), &root);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].data["cells"], vec!["same"]);
        assert_eq!(tables[0].caption, vec!["Table 1"]);
    }

    #[test]
    fn test_table_rows() {
        let root = parse_html(
            "<table><tr><th>Group</th><th>n</th></tr><tr><td>A</td><td>12</td></tr></table>",
        );
        let config = tables_config();
        let tables = extract_tables(config.section("tables").unwrap(), &root);

        let rows = &tables[0].rows;
        assert_eq!(rows.len(), 2);
        assert!(rows[0][0].header);
        assert_eq!(rows[1][1].text, "12");
        assert_eq!(rows[1][1].kind, CellKind::Number);
        assert!(tables[0].title.is_empty());
    }
}
