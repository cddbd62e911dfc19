//! Text helpers: markup preprocessing, heading normalisation and cell
//! classification.

use std::sync::LazyLock;

use regex::Regex;

use crate::markup::{Element, MarkupNode};

/// Leading section enumeration such as `2.`, `3.1.4` or `IV.`.
///
/// A bare number (`2020 cohort`, `3 months`) is part of the heading.
#[allow(clippy::expect_used)]
static ENUMERATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)*\.|\d+(?:\.\d+)+|[ivxlc]+\.)\s+").expect("valid regex")
});

/// Trailing punctuation left over from headings like `Methods:`.
#[allow(clippy::expect_used)]
static TRAILING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s.:;,]+$").expect("valid regex"));

#[allow(clippy::expect_used)]
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Text of an element whose only child is a single text node.
fn single_string(element: &Element) -> Option<&str> {
    match element.children.as_slice() {
        [MarkupNode::Text(text)] => Some(text),
        _ => None,
    }
}

/// Rewrite every element named `tag` below `element` with `rewrite`.
///
/// Elements without a single text child are dropped from the tree.
fn rewrite_single_strings(element: &mut Element, tag: &str, rewrite: &dyn Fn(&str) -> String) {
    element.children.retain_mut(|child| match child {
        MarkupNode::Text(_) => true,
        MarkupNode::Element(inner) if inner.name == tag => {
            let Some(replaced) = single_string(inner).map(|text| rewrite(text)) else {
                return false;
            };
            inner.children = vec![MarkupNode::Text(replaced)];
            true
        }
        MarkupNode::Element(inner) => {
            rewrite_single_strings(inner, tag, rewrite);
            true
        }
    });
}

/// Prefix subscript text with an underscore and pad it with a space.
///
/// Text already starting with `_` or `-` only gets the padding. Subscripts
/// with nested markup are removed.
pub fn mark_subscripts(root: &mut Element) {
    rewrite_single_strings(root, "sub", &|text| {
        if text.starts_with(['_', '-']) {
            format!("{text} ")
        } else {
            format!("_{text} ")
        }
    });
}

/// Pad emphasised text with a trailing space so it does not run into the
/// following word. Emphasis with nested markup is removed.
pub fn pad_emphasis(root: &mut Element) {
    rewrite_single_strings(root, "em", &|text| format!("{text} "));
}

/// Collapse runs of whitespace into single spaces and trim.
#[must_use]
pub fn clean_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Normalise a heading for dictionary lookup.
///
/// # Examples
/// ```
/// use iao_harvester::text::normalize_heading;
///
/// assert_eq!(normalize_heading("2.1 Statistical Analysis"), "statistical analysis");
/// assert_eq!(normalize_heading("IV. Results:"), "results");
/// ```
#[must_use]
pub fn normalize_heading(heading: &str) -> String {
    let lowered = clean_whitespace(heading).to_lowercase();
    let stripped = ENUMERATION.replace(&lowered, "");
    TRAILING_PUNCTUATION.replace(&stripped, "").into_owned()
}

/// Whether the string parses as a number once thousands separators are removed.
#[must_use]
pub fn is_number(s: &str) -> bool {
    s.replace(',', "").trim().parse::<f64>().is_ok()
}

/// Whether the string contains digits as well as other characters.
#[must_use]
pub fn is_mixed_data_type(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit()) && s.chars().any(|c| !c.is_ascii_digit())
}

/// Whether the string contains no digits at all.
#[must_use]
pub fn is_text(s: &str) -> bool {
    !s.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_html;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mark_subscripts() {
        let mut root = parse_html("<p>H<sub>2</sub>O and x<sub>-1</sub></p>");
        mark_subscripts(&mut root);
        assert_eq!(root.text(), "H_2 O and x-1 ");
    }

    #[test]
    fn test_mark_subscripts_drops_nested_markup() {
        let mut root = parse_html("<p>a<sub><i>b</i>c</sub>d</p>");
        mark_subscripts(&mut root);
        assert_eq!(root.text(), "ad");
    }

    #[test]
    fn test_pad_emphasis() {
        let mut root = parse_html("<p><em>in vitro</em>assay</p>");
        pad_emphasis(&mut root);
        assert_eq!(root.text(), "in vitro assay");
    }

    #[test]
    fn test_clean_whitespace() {
        assert_eq!(clean_whitespace("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading("Methods"), "methods");
        assert_eq!(normalize_heading("3.2.1. Data  Collection"), "data collection");
        assert_eq!(normalize_heading("ii. Background."), "background");
        assert_eq!(normalize_heading("2020 cohort"), "2020 cohort");
        assert_eq!(normalize_heading("3 months follow-up"), "3 months follow-up");
        assert_eq!(normalize_heading("4 Discussion"), "4 discussion");
        assert_eq!(normalize_heading("Results and Discussion"), "results and discussion");
    }

    #[test]
    fn test_is_number() {
        assert!(is_number("12"));
        assert!(is_number("1,234.5"));
        assert!(is_number("-0.3"));
        assert!(!is_number("12 mg"));
        assert!(!is_number(""));
    }

    #[test]
    fn test_is_mixed_data_type() {
        assert!(is_mixed_data_type("12 mg"));
        assert!(!is_mixed_data_type("12"));
        assert!(!is_mixed_data_type("mg"));
    }

    #[test]
    fn test_is_text() {
        assert!(is_text("control group"));
        assert!(!is_text("group 2"));
    }
}
