//! BioC document assembly.
//!
//! A document is a title passage followed by one passage per paragraph.
//! Passage offsets are running character counts over the title, every
//! paragraph body, and each distinct heading the first time it appears.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use iao_sections::IaoTerm;
use serde::ser::{Serialize, Serializer};

use crate::config::{BIOC_KEY, BIOC_SOURCE, DOCUMENT_TITLE_IAO_ID, DOCUMENT_TITLE_IAO_NAME};

/// One paragraph of main text with its headings and section categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub section_heading: String,
    pub subsection_heading: String,
    pub body: String,
    pub section_type: Vec<IaoTerm>,
}

/// Title and paragraphs of an article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainText {
    pub title: String,
    pub paragraphs: Vec<Paragraph>,
}

/// Ordered key/value annotations, serialised as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Infons(Vec<(String, String)>);

impl Infons {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Add `iao_name_N`/`iao_id_N` pairs, numbered from 1.
    pub fn push_iao_terms<'a>(&mut self, terms: impl IntoIterator<Item = &'a IaoTerm>) {
        for (i, term) in terms.into_iter().enumerate() {
            self.push(format!("iao_name_{}", i + 1), term.iao_name.clone());
            self.push(format!("iao_id_{}", i + 1), term.iao_id.clone());
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Infons {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BiocPassage {
    pub offset: usize,
    pub infons: Infons,
    pub text: String,
    pub sentences: Vec<serde_json::Value>,
    pub annotations: Vec<serde_json::Value>,
    pub relations: Vec<serde_json::Value>,
}

impl BiocPassage {
    fn new(offset: usize, infons: Infons, text: String) -> Self {
        Self {
            offset,
            infons,
            text,
            sentences: Vec::new(),
            annotations: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// The document title passage.
    #[must_use]
    pub fn from_title(title: &str, offset: usize) -> Self {
        let mut infons = Infons::new();
        infons.push("iao_name_1", DOCUMENT_TITLE_IAO_NAME);
        infons.push("iao_id_1", DOCUMENT_TITLE_IAO_ID);
        Self::new(offset, infons, title.to_string())
    }

    /// A main-text paragraph passage.
    #[must_use]
    pub fn from_paragraph(paragraph: &Paragraph, offset: usize) -> Self {
        let mut infons = Infons::new();
        infons.push("section_title_1", paragraph.section_heading.clone());
        if !paragraph.subsection_heading.is_empty() {
            infons.push("section_title_2", paragraph.subsection_heading.clone());
        }
        infons.push_iao_terms(&paragraph.section_type);
        Self::new(offset, infons, paragraph.body.clone())
    }
}

/// Build the passages of a document, computing character offsets.
///
/// Bodies and headings are trimmed first. A heading contributes to the
/// running offset only the first time its text is seen; the title counts
/// as seen.
#[must_use]
pub fn build_passages(main_text: &MainText) -> Vec<BiocPassage> {
    let title = main_text.title.trim();
    let mut seen: HashSet<String> = HashSet::from([title.to_string()]);
    let mut offset = title.chars().count();

    let mut passages = Vec::with_capacity(main_text.paragraphs.len() + 1);
    passages.push(BiocPassage::from_title(title, 0));

    for paragraph in &main_text.paragraphs {
        let paragraph = Paragraph {
            section_heading: paragraph.section_heading.trim().to_string(),
            subsection_heading: paragraph.subsection_heading.trim().to_string(),
            body: paragraph.body.trim().to_string(),
            section_type: paragraph.section_type.clone(),
        };
        passages.push(BiocPassage::from_paragraph(&paragraph, offset));

        offset += paragraph.body.chars().count();
        for heading in [&paragraph.subsection_heading, &paragraph.section_heading] {
            if seen.insert(heading.clone()) {
                offset += heading.chars().count();
            }
        }
    }

    passages
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BiocDocument {
    pub id: String,
    pub inputfile: String,
    pub infons: Infons,
    pub passages: Vec<BiocPassage>,
    pub annotations: Vec<serde_json::Value>,
    pub relations: Vec<serde_json::Value>,
}

impl BiocDocument {
    /// Assemble a document for an input file.
    ///
    /// The id is the file name up to its first `.`.
    #[must_use]
    pub fn new(input_path: &Path, main_text: &MainText) -> Self {
        let file_name = input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = file_name.split('.').next().unwrap_or_default().to_string();

        Self {
            id,
            inputfile: input_path.display().to_string(),
            infons: Infons::new(),
            passages: build_passages(main_text),
            annotations: Vec::new(),
            relations: Vec::new(),
        }
    }
}

/// A set of documents with collection metadata.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BiocCollection {
    pub source: String,

    /// Creation date as `YYYYMMDD`.
    pub date: String,
    pub key: String,
    pub infons: Infons,
    pub documents: Vec<BiocDocument>,
}

impl BiocCollection {
    #[must_use]
    pub fn new(date: NaiveDate, documents: Vec<BiocDocument>) -> Self {
        Self {
            source: BIOC_SOURCE.to_string(),
            date: date.format("%Y%m%d").to_string(),
            key: BIOC_KEY.to_string(),
            infons: Infons::new(),
            documents,
        }
    }

    /// A collection dated today.
    #[must_use]
    pub fn today(documents: Vec<BiocDocument>) -> Self {
        Self::new(chrono::Local::now().date_naive(), documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph(section: &str, body: &str) -> Paragraph {
        Paragraph {
            section_heading: section.to_string(),
            body: body.to_string(),
            ..Paragraph::default()
        }
    }

    fn offsets(passages: &[BiocPassage]) -> Vec<usize> {
        passages.iter().map(|p| p.offset).collect()
    }

    #[test]
    fn test_title_heading_counted_once() {
        let main_text = MainText {
            title: "Intro".to_string(),
            paragraphs: vec![paragraph("Intro", "Hello"), paragraph("Intro", "World")],
        };
        assert_eq!(offsets(&build_passages(&main_text)), vec![0, 5, 10]);
    }

    #[test]
    fn test_new_headings_add_to_offset() {
        let main_text = MainText {
            title: "T".to_string(),
            paragraphs: vec![
                Paragraph {
                    subsection_heading: "Sub".to_string(),
                    ..paragraph("Methods", "abc")
                },
                paragraph("Methods", "de"),
                paragraph("Results", "f"),
            ],
        };
        // 1 + 3 + "Sub" + "Methods" = 14, then + 2 = 16
        assert_eq!(offsets(&build_passages(&main_text)), vec![0, 1, 14, 16]);
    }

    #[test]
    fn test_offsets_count_chars_not_bytes() {
        let main_text = MainText {
            title: "Über".to_string(),
            paragraphs: vec![paragraph("Über", "ßß"), paragraph("Über", "x")],
        };
        assert_eq!(offsets(&build_passages(&main_text)), vec![0, 4, 6]);
    }

    #[test]
    fn test_text_is_trimmed() {
        let main_text = MainText {
            title: "  Title ".to_string(),
            paragraphs: vec![paragraph(" Intro ", " body ")],
        };
        let passages = build_passages(&main_text);
        assert_eq!(passages[0].text, "Title");
        assert_eq!(passages[1].offset, 5);
        assert_eq!(passages[1].text, "body");
        assert_eq!(passages[1].infons.get("section_title_1"), Some("Intro"));
    }

    #[test]
    fn test_passage_infons() {
        let p = Paragraph {
            subsection_heading: "Cohort".to_string(),
            section_type: vec![IaoTerm {
                iao_name: "methods section".to_string(),
                iao_id: "IAO:0000317".to_string(),
            }],
            ..paragraph("Methods", "text")
        };
        let json = serde_json::to_value(BiocPassage::from_paragraph(&p, 7)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "offset": 7,
                "infons": {
                    "section_title_1": "Methods",
                    "section_title_2": "Cohort",
                    "iao_name_1": "methods section",
                    "iao_id_1": "IAO:0000317"
                },
                "text": "text",
                "sentences": [],
                "annotations": [],
                "relations": []
            })
        );
    }

    #[test]
    fn test_title_passage() {
        let passage = BiocPassage::from_title("A title", 0);
        assert_eq!(passage.infons.get("iao_name_1"), Some("document title"));
        assert_eq!(passage.infons.get("iao_id_1"), Some("IAO:0000305"));
    }

    #[test]
    fn test_document_id() {
        let doc = BiocDocument::new(Path::new("/data/PMC123.v2.html"), &MainText::default());
        assert_eq!(doc.id, "PMC123");
        assert_eq!(doc.inputfile, "/data/PMC123.v2.html");
        assert_eq!(doc.passages.len(), 1);
    }

    #[test]
    fn test_collection_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let collection = BiocCollection::new(date, Vec::new());
        assert_eq!(collection.date, "20240307");
        assert_eq!(collection.source, BIOC_SOURCE);
    }
}
