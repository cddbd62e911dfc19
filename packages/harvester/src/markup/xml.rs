//! XML input via roxmltree.

use roxmltree::{Document, Node, ParsingOptions};

use super::{Element, MarkupNode, DOCUMENT_NODE};
use crate::error::Result;

/// Parse an XML document (e.g. JATS) into a markup tree.
///
/// DTD declarations are allowed since publisher XML commonly carries them.
/// Tag names are local names without namespace prefix.
///
/// # Errors
/// Returns `HarvesterError::XmlParse` for malformed XML.
pub fn parse_xml(xml: &str) -> Result<Element> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)?;

    let mut root = Element::new(DOCUMENT_NODE);
    root.children
        .push(MarkupNode::Element(convert(doc.root_element())));
    Ok(root)
}

fn convert(node: Node<'_, '_>) -> Element {
    let mut out = Element::new(node.tag_name().name());
    out.attrs = node
        .attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect();

    for child in node.children() {
        if child.is_element() {
            out.children.push(MarkupNode::Element(convert(child)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                out.children.push(MarkupNode::Text(text.to_string()));
            }
        }
    }

    out
}
