//! Parser-independent markup tree.
//!
//! Articles arrive as HTML (parsed with scraper) or XML (parsed with
//! roxmltree). Both are converted into the same owned tree of
//! [`MarkupNode`]s so selectors and text flattening only deal with two
//! node variants: text and element.

mod html;
pub mod path;
mod xml;

use std::path::Path;

pub use html::parse_html;
pub use path::PathQuery;
pub use xml::parse_xml;

use crate::error::Result;

/// Name of the synthetic element wrapping a parsed document.
pub const DOCUMENT_NODE: &str = "#document";

/// A node in the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    Element(Element),
}

impl MarkupNode {
    /// Concatenated text of this node and all its descendants.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element(element) => {
                for child in &element.children {
                    child.push_text(out);
                }
            }
        }
    }

    /// The element behind this node, if any.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }
}

/// An element with its attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local tag name; lowercase for HTML input.
    pub name: String,

    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,

    pub children: Vec<MarkupNode>,
}

impl Element {
    /// Create an element without attributes or children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Add a text child.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(MarkupNode::Text(text.into()));
        self
    }

    /// Add an element child.
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(MarkupNode::Element(child));
        self
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_text(&mut out);
        }
        out
    }

    /// Direct element children.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(MarkupNode::as_element)
    }

    /// All descendant elements in document order, excluding `self`.
    #[must_use]
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&Element> = self.child_elements().collect();
        stack.reverse();
        Descendants { stack }
    }
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(next.child_elements());
        self.stack[start..].reverse();
        Some(next)
    }
}

/// Kind of article file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Xml,
}

impl DocumentKind {
    /// Detect the document kind from the file extension, falling back to
    /// sniffing the content.
    #[must_use]
    pub fn detect(path: &Path, content: &str) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("html" | "htm" | "xhtml") => Self::Html,
            Some("xml" | "nxml") => Self::Xml,
            _ => Self::sniff(content),
        }
    }

    fn sniff(content: &str) -> Self {
        let head: String = content.chars().take(1024).collect::<String>().to_lowercase();
        let head = head.trim_start();
        if head.starts_with("<?xml") && !head.contains("<html") {
            Self::Xml
        } else {
            Self::Html
        }
    }
}

/// Parse an article file into a markup tree rooted at a [`DOCUMENT_NODE`].
///
/// # Errors
/// Returns an XML parse error for malformed XML input. HTML parsing is
/// lenient and never fails.
pub fn parse_document(path: &Path, content: &str) -> Result<Element> {
    match DocumentKind::detect(path, content) {
        DocumentKind::Html => Ok(parse_html(content)),
        DocumentKind::Xml => parse_xml(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Element {
        Element::new(DOCUMENT_NODE).with_child(
            Element::new("body")
                .with_child(Element::new("h2").with_text("Methods"))
                .with_child(
                    Element::new("p")
                        .with_text("Cells were ")
                        .with_child(Element::new("em").with_text("grown"))
                        .with_text("."),
                ),
        )
    }

    #[test]
    fn test_text_concatenates_descendants() {
        let doc = sample();
        assert_eq!(doc.text(), "MethodsCells were grown.");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = sample();
        let names: Vec<&str> = doc.descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["body", "h2", "p", "em"]);
    }

    #[test]
    fn test_attribute() {
        let element = Element::new("div").with_attr("class", "tsec sec");
        assert_eq!(element.attribute("class"), Some("tsec sec"));
        assert_eq!(element.attribute("id"), None);
    }

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(
            DocumentKind::detect(Path::new("PMC123.html"), ""),
            DocumentKind::Html
        );
        assert_eq!(
            DocumentKind::detect(Path::new("PMC123.NXML"), ""),
            DocumentKind::Xml
        );
    }

    #[test]
    fn test_detect_by_content() {
        assert_eq!(
            DocumentKind::detect(Path::new("article"), "<?xml version=\"1.0\"?><article/>"),
            DocumentKind::Xml
        );
        assert_eq!(
            DocumentKind::detect(Path::new("article"), "<!DOCTYPE html><html></html>"),
            DocumentKind::Html
        );
    }
}
