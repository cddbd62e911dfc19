//! HTML input via scraper.

use scraper::{ElementRef, Html, Node};

use super::{Element, MarkupNode, DOCUMENT_NODE};

/// Parse an HTML document into a markup tree.
///
/// Comments, doctypes and processing instructions are dropped.
#[must_use]
pub fn parse_html(html: &str) -> Element {
    let document = Html::parse_document(html);
    let mut root = Element::new(DOCUMENT_NODE);
    root.children
        .push(MarkupNode::Element(convert(document.root_element())));
    root
}

fn convert(element: ElementRef<'_>) -> Element {
    let value = element.value();
    let mut out = Element::new(value.name());
    out.attrs = value
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.children.push(MarkupNode::Text(String::from(&*text.text))),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    out.children.push(MarkupNode::Element(convert(child)));
                }
            }
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_html_wraps_document() {
        let root = parse_html("<html><body><h1 class=\"title\">A title</h1></body></html>");
        assert_eq!(root.name, DOCUMENT_NODE);

        let h1 = root.descendants().find(|e| e.name == "h1").unwrap();
        assert_eq!(h1.attribute("class"), Some("title"));
        assert_eq!(h1.text(), "A title");
    }

    #[test]
    fn test_parse_html_is_lenient() {
        let root = parse_html("<p>unclosed <b>bold");
        let p = root.descendants().find(|e| e.name == "p").unwrap();
        assert_eq!(p.text(), "unclosed bold");
    }

    #[test]
    fn test_comments_are_dropped() {
        let root = parse_html("<p>a<!-- hidden -->b</p>");
        let p = root.descendants().find(|e| e.name == "p").unwrap();
        assert_eq!(p.text(), "ab");
    }

    #[test]
    fn test_tag_names_are_lowercase() {
        let root = parse_html("<DIV><SUP>2</SUP></DIV>");
        assert!(root.descendants().any(|e| e.name == "sup"));
    }
}
