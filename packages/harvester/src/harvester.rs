//! Article pipeline: markup in, BioC document and tables out.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use iao_sections::{
    assign_section_types, resolve_headings, Dag, HeadingRecord, IaoTerm, Resolution,
    TermDictionary,
};
use serde::Serialize;

use crate::bioc::{BiocDocument, MainText, Paragraph};
use crate::config::{
    HEADING_DATA_KEYS, PARAGRAPH_DATA_KEY, SECTIONS_SECTION, TABLES_SECTION, TITLE_SECTION,
};
use crate::error::{HarvesterError, Result};
use crate::markup::{parse_document, Element};
use crate::matcher::{extract_sections, find_matches, is_segmented, regroup_segmented, NodeMatch};
use crate::selector::{ArticleConfig, SectionConfig};
use crate::tables::{extract_tables, TableRecord};
use crate::text::{clean_whitespace, mark_subscripts, normalize_heading, pad_emphasis};

/// Reference data shared by every article in a run.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub dictionary: TermDictionary,
    pub dag: Dag,
}

impl ReferenceData {
    /// Load the mapping table, identifier table and DAG.
    ///
    /// # Errors
    /// Returns an error if any resource is missing or malformed.
    pub fn load(mapping: &Path, term_ids: &Path, dag: &Path) -> Result<Self> {
        let dictionary = TermDictionary::load(mapping, term_ids)?;
        let dag = Dag::load(dag)?;
        tracing::info!(
            headings = dictionary.heading_count(),
            nodes = dag.node_count(),
            edges = dag.edge_count(),
            "Loaded IAO reference data"
        );
        Ok(Self { dictionary, dag })
    }
}

/// Everything extracted from one article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleOutput {
    pub document: BiocDocument,
    pub tables: Vec<TableRecord>,

    /// Headings whose categories were inferred from the DAG.
    pub resolution: Resolution,
}

/// A paragraph before section categories are assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RawParagraph {
    section_heading: String,
    subsection_heading: String,
    body: String,
}

impl RawParagraph {
    fn new(section_heading: &str, subsection_heading: &str, body: String) -> Self {
        Self {
            section_heading: section_heading.to_string(),
            subsection_heading: subsection_heading.to_string(),
            body,
        }
    }
}

/// Read and process one article file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn process_file(
    path: &Path,
    config: &ArticleConfig,
    reference: &ReferenceData,
) -> Result<ArticleOutput> {
    let content = fs::read_to_string(path).map_err(|e| HarvesterError::file(path, e))?;
    process_article(path, &content, config, reference)
}

/// Process one article.
///
/// Tables are taken from the markup as-is; main text is extracted after
/// subscript marking and emphasis padding.
///
/// # Errors
/// Returns an error if the markup cannot be parsed.
pub fn process_article(
    path: &Path,
    content: &str,
    config: &ArticleConfig,
    reference: &ReferenceData,
) -> Result<ArticleOutput> {
    let root = parse_document(path, content)?;

    let tables = config
        .section(TABLES_SECTION)
        .map(|section| extract_tables(section, &root))
        .unwrap_or_default();

    let mut text_root = root;
    mark_subscripts(&mut text_root);
    pad_emphasis(&mut text_root);

    let title = config
        .section(TITLE_SECTION)
        .and_then(|section| find_matches(section, &text_root).first().copied())
        .map(|node| clean_whitespace(&node.text()))
        .unwrap_or_default();

    let raw = config
        .section(SECTIONS_SECTION)
        .map(|section| collect_paragraphs(section, &text_root))
        .unwrap_or_default();

    let (resolution, section_types) = categorize_headings(&raw, reference);

    let paragraphs = raw
        .into_iter()
        .map(|p| Paragraph {
            section_type: section_types
                .get(&p.section_heading)
                .cloned()
                .unwrap_or_default(),
            section_heading: p.section_heading,
            subsection_heading: p.subsection_heading,
            body: p.body,
        })
        .collect();

    let main_text = MainText { title, paragraphs };
    let document = BiocDocument::new(path, &main_text);

    tracing::info!(
        file = %path.display(),
        passages = document.passages.len(),
        tables = tables.len(),
        inferred = resolution.len(),
        "Processed article"
    );

    Ok(ArticleOutput {
        document,
        tables,
        resolution,
    })
}

/// Resolve the IAO categories of every distinct section heading.
fn categorize_headings(
    paragraphs: &[RawParagraph],
    reference: &ReferenceData,
) -> (Resolution, HashMap<String, Vec<IaoTerm>>) {
    let mut headings: Vec<&str> = Vec::new();
    for paragraph in paragraphs {
        let heading = paragraph.section_heading.as_str();
        if !heading.is_empty() && !headings.contains(&heading) {
            headings.push(heading);
        }
    }

    let records: Vec<HeadingRecord> = headings
        .iter()
        .map(|h| HeadingRecord::lookup(*h, &normalize_heading(h), &reference.dictionary))
        .collect();

    let resolution = resolve_headings(&records, &reference.dictionary, &reference.dag);
    let types = assign_section_types(&records, &resolution, &reference.dictionary);

    let section_types = records
        .into_iter()
        .map(|r| r.text)
        .zip(types)
        .collect();

    (resolution, section_types)
}

fn node_key(node: &Element) -> *const Element {
    std::ptr::from_ref(node)
}

fn first_text(nodes: &[&Element]) -> String {
    nodes
        .first()
        .map(|n| clean_whitespace(&n.text()))
        .unwrap_or_default()
}

/// Body texts of a match: its `paragraphs` data when configured, else the
/// node's own text.
fn match_bodies(matched: &NodeMatch<'_>, section: &SectionConfig) -> Vec<String> {
    if section.data.contains_key(PARAGRAPH_DATA_KEY) {
        matched
            .data
            .get(PARAGRAPH_DATA_KEY)
            .map(|nodes| nodes.iter().map(|n| clean_whitespace(&n.text())).collect())
            .unwrap_or_default()
    } else {
        vec![clean_whitespace(&matched.node.text())]
    }
}

/// Collect paragraphs with their headings from the `sections` matches.
fn collect_paragraphs(section: &SectionConfig, root: &Element) -> Vec<RawParagraph> {
    let matches = extract_sections(section, root);
    let positions: HashMap<*const Element, usize> = root
        .descendants()
        .enumerate()
        .map(|(i, node)| (node_key(node), i))
        .collect();
    let position = |node: &Element| positions.get(&node_key(node)).copied().unwrap_or(0);

    let mut nodes: Vec<&Element> = matches.iter().map(|m| m.node).collect();
    let paragraphs = if is_segmented(&nodes) {
        // Without a configured separator, the first definition's tag opens groups.
        let separator = section
            .separator
            .clone()
            .or_else(|| nodes.first().map(|n| n.name.clone()))
            .unwrap_or_default();
        nodes.sort_by_key(|&n| position(n));
        segmented_paragraphs(section, &separator, &matches, &nodes)
    } else {
        nested_paragraphs(section, &matches, &position)
    };

    paragraphs
        .into_iter()
        .filter(|p| !p.body.is_empty())
        .collect()
}

/// Flat sibling runs: each separator node heads the nodes after it.
fn segmented_paragraphs(
    section: &SectionConfig,
    separator: &str,
    matches: &[NodeMatch<'_>],
    nodes: &[&Element],
) -> Vec<RawParagraph> {
    tracing::debug!(separator = %separator, "Regrouping segmented layout");

    let by_node: HashMap<*const Element, &NodeMatch<'_>> =
        matches.iter().map(|m| (node_key(m.node), m)).collect();

    let mut paragraphs = Vec::new();
    for group in regroup_segmented(nodes, separator) {
        let heading = group
            .heading
            .map(|h| clean_whitespace(&h.text()))
            .unwrap_or_default();
        for node in &group.body {
            let Some(matched) = by_node.get(&node_key(node)) else {
                continue;
            };
            paragraphs.extend(
                match_bodies(matched, section)
                    .into_iter()
                    .map(|body| RawParagraph::new(&heading, "", body)),
            );
        }
    }
    paragraphs
}

/// Nested containers: each paragraph belongs to the innermost match that
/// contains it, and a match inside another match is a subsection.
fn nested_paragraphs(
    section: &SectionConfig,
    matches: &[NodeMatch<'_>],
    position: &dyn Fn(&Element) -> usize,
) -> Vec<RawParagraph> {
    // Containers have strictly more descendants than anything inside them,
    // so visiting larger matches first leaves each node owned by its
    // innermost match.
    let mut order: Vec<usize> = (0..matches.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(matches[i].node.descendants().count()));

    let mut owner: HashMap<*const Element, usize> = HashMap::new();
    let mut parent: Vec<Option<usize>> = vec![None; matches.len()];
    for &i in &order {
        parent[i] = owner.get(&node_key(matches[i].node)).copied();
        for node in matches[i].node.descendants() {
            owner.insert(node_key(node), i);
        }
    }

    let headings: Vec<String> = matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let owned: Vec<&Element> = HEADING_DATA_KEYS
                .iter()
                .filter_map(|key| m.data.get(*key))
                .flatten()
                .copied()
                .filter(|n| owner.get(&node_key(n)) == Some(&i))
                .collect();
            first_text(&owned)
        })
        .collect();

    let mut located: Vec<(usize, RawParagraph)> = Vec::new();
    for (i, matched) in matches.iter().enumerate() {
        let (section_heading, subsection_heading) = match parent[i] {
            Some(p) => (headings[p].as_str(), headings[i].as_str()),
            None => (headings[i].as_str(), ""),
        };

        if !section.data.contains_key(PARAGRAPH_DATA_KEY) {
            for body in match_bodies(matched, section) {
                let paragraph = RawParagraph::new(section_heading, subsection_heading, body);
                located.push((position(matched.node), paragraph));
            }
            continue;
        }

        let Some(nodes) = matched.data.get(PARAGRAPH_DATA_KEY) else {
            continue;
        };
        for node in nodes {
            if owner.get(&node_key(node)) != Some(&i) {
                continue;
            }
            let body = clean_whitespace(&node.text());
            let paragraph = RawParagraph::new(section_heading, subsection_heading, body);
            located.push((position(node), paragraph));
        }
    }

    located.sort_by_key(|(pos, _)| *pos);
    located.into_iter().map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference() -> ReferenceData {
        let dictionary = TermDictionary::from_strs(
            "introduction\tintroduction section\n\
             methods\tmethods section\n\
             results\tresults section\n",
            "introduction section\tIAO:0000316\n\
             methods section\tIAO:0000317\n\
             results section\tIAO:0000318\n",
        )
        .unwrap();
        let dag = Dag::from_edges([
            ("introduction section", "methods section", 1.0),
            ("methods section", "results section", 1.0),
        ]);
        ReferenceData { dictionary, dag }
    }

    fn nested_config() -> ArticleConfig {
        ArticleConfig::from_json_str(
            r#"{
                "title": {"defined-by": [{"tag": "h1"}]},
                "sections": {
                    "defined-by": [{"tag": "div", "attrs": {"class": "sec"}}],
                    "data": {"headers": [{"tag": "h[23]"}], "paragraphs": [{"tag": "p"}]}
                },
                "tables": {"defined-by": [{"tag": "table"}]}
            }"#,
        )
        .unwrap()
    }

    fn paragraph_summary(output: &ArticleOutput) -> Vec<(String, String, String)> {
        output.document.passages[1..]
            .iter()
            .map(|p| {
                (
                    p.infons.get("section_title_1").unwrap_or_default().to_string(),
                    p.infons.get("section_title_2").unwrap_or_default().to_string(),
                    p.text.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn test_nested_sections() {
        let html = r#"<html><body>
            <h1>A study</h1>
            <div class="sec"><h2>Methods</h2><p>m1</p>
              <div class="sec"><h3>Cohort</h3><p>c1</p></div>
              <p>m2</p>
            </div>
            <div class="sec"><h2>Results</h2><p>r1</p></div>
        </body></html>"#;
        let output =
            process_article(Path::new("PMC1.html"), html, &nested_config(), &reference()).unwrap();

        assert_eq!(output.document.id, "PMC1");
        assert_eq!(output.document.passages[0].text, "A study");
        assert_eq!(
            paragraph_summary(&output),
            vec![
                ("Methods".into(), String::new(), "m1".into()),
                ("Methods".into(), "Cohort".into(), "c1".into()),
                ("Methods".into(), String::new(), "m2".into()),
                ("Results".into(), String::new(), "r1".into()),
            ]
        );
        assert_eq!(
            output.document.passages[1].infons.get("iao_id_1"),
            Some("IAO:0000317")
        );
    }

    #[test]
    fn test_unmapped_heading_is_inferred() {
        let html = r#"<h1>T</h1>
            <div class="sec"><h2>Introduction</h2><p>i</p></div>
            <div class="sec"><h2>Patients</h2><p>p</p></div>
            <div class="sec"><h2>Results</h2><p>r</p></div>"#;
        let output =
            process_article(Path::new("a.html"), html, &nested_config(), &reference()).unwrap();

        let inferred = output.resolution.get("Patients").unwrap();
        assert_eq!(inferred[0].iao_name, "methods section");
        assert_eq!(
            output.document.passages[2].infons.get("iao_name_1"),
            Some("methods section")
        );
    }

    #[test]
    fn test_segmented_layout() {
        let config = ArticleConfig::from_json_str(
            r#"{"sections": {"defined-by": [{"tag": "h2"}, {"tag": "p"}], "separator": "h2"}}"#,
        )
        .unwrap();
        let html = "<p>lead</p><h2>Methods</h2><p>a</p><p>b</p><h2>Results</h2><p>c</p>";
        let output = process_article(Path::new("s.html"), html, &config, &reference()).unwrap();

        let summary = paragraph_summary(&output);
        assert_eq!(summary.len(), 4);
        assert_eq!(summary[0], (String::new(), String::new(), "lead".to_string()));
        assert_eq!(summary[2].0, "Methods");
        assert_eq!(summary[3], ("Results".into(), String::new(), "c".into()));
    }

    #[test]
    fn test_segmented_layout_defaults_to_first_definition_tag() {
        let config = ArticleConfig::from_json_str(
            r#"{"sections": {"defined-by": [{"tag": "h2"}, {"tag": "p"}]}}"#,
        )
        .unwrap();
        let html = "<p>lead</p><h2>Methods</h2><p>a</p><h2>Results</h2><p>c</p>";
        let output = process_article(Path::new("s.html"), html, &config, &reference()).unwrap();

        assert_eq!(
            paragraph_summary(&output),
            vec![
                (String::new(), String::new(), "lead".into()),
                ("Methods".into(), String::new(), "a".into()),
                ("Results".into(), String::new(), "c".into()),
            ]
        );
    }

    #[test]
    fn test_tables_and_subscripts() {
        let html = r#"<h1>CO<sub>2</sub> levels</h1>
            <table><tr><td>CO<sub>2</sub></td></tr></table>"#;
        let output =
            process_article(Path::new("t.html"), html, &nested_config(), &reference()).unwrap();

        assert_eq!(output.document.passages[0].text, "CO_2 levels");
        assert_eq!(output.tables[0].rows[0][0].text, "CO<sub>2</sub>");
    }

    #[test]
    fn test_xml_article() {
        let config = ArticleConfig::from_json_str(
            r#"{
                "title": {"defined-by": [{"xpath": "//article-title"}]},
                "sections": {
                    "defined-by": [{"tag": "sec"}],
                    "data": {"title": [{"tag": "title"}], "paragraphs": [{"tag": "p"}]}
                }
            }"#,
        )
        .unwrap();
        let xml = r#"<?xml version="1.0"?>
            <article><front><article-title>X</article-title></front>
            <body><sec><title>Methods</title><p>m</p></sec></body></article>"#;
        let output = process_article(Path::new("x.xml"), xml, &config, &reference()).unwrap();

        assert_eq!(output.document.passages[0].text, "X");
        assert_eq!(
            paragraph_summary(&output),
            vec![("Methods".into(), String::new(), "m".into())]
        );
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let result = process_article(
            Path::new("bad.xml"),
            "<article><p></article>",
            &nested_config(),
            &reference(),
        );
        assert!(matches!(result, Err(HarvesterError::XmlParse(_))));
    }
}
