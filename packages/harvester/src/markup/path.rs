//! Path queries over the markup tree.
//!
//! Supports the XPath subset used by article configurations:
//!
//! - child steps `a/b` and descendant steps `a//b` (leading `//` searches
//!   all descendants of the scope),
//! - name tests and the `*` wildcard,
//! - predicates `[@attr]`, `[@attr='value']` and positional `[n]`.
//!
//! Queries are always evaluated relative to the element they are applied
//! to, so a leading `/` or `//` addresses the scope's subtree.

use std::fmt;

use super::Element;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    HasAttr(String),
    AttrEquals(String, String),
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    name: Option<String>,
    predicates: Vec<Predicate>,
}

/// A compiled path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    source: String,
    steps: Vec<Step>,
}

impl PathQuery {
    /// Compile a path query.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidPath` for syntax outside the supported
    /// subset.
    pub fn parse(query: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPath {
            query: query.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = query.trim();
        let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(invalid("empty query"));
        }

        let mut steps = Vec::new();
        let mut rest = trimmed;
        let mut axis = Axis::Child;

        loop {
            if let Some(r) = rest.strip_prefix("//") {
                axis = Axis::Descendant;
                rest = r;
            } else if let Some(r) = rest.strip_prefix('/') {
                rest = r;
            }

            let end = step_end(rest).ok_or_else(|| invalid("unbalanced '['"))?;
            let (raw_step, tail) = rest.split_at(end);
            if raw_step.is_empty() {
                return Err(invalid("empty step"));
            }
            steps.push(parse_step(raw_step, axis).map_err(|reason| invalid(&reason))?);

            if tail.is_empty() {
                break;
            }
            rest = tail;
            axis = Axis::Child;
        }

        Ok(Self {
            source: query.to_string(),
            steps,
        })
    }

    /// Evaluate the query below `scope`, returning elements in document order.
    #[must_use]
    pub fn select<'a>(&self, scope: &'a Element) -> Vec<&'a Element> {
        let mut current: Vec<&'a Element> = vec![scope];

        for step in &self.steps {
            let mut next: Vec<&'a Element> = Vec::new();
            for context in &current {
                let candidates: Vec<&'a Element> = match step.axis {
                    Axis::Child => context.child_elements().collect(),
                    Axis::Descendant => context.descendants().collect(),
                };
                let candidates = candidates
                    .into_iter()
                    .filter(|e| step.name.as_deref().is_none_or(|name| e.name == name));
                for element in apply_predicates(candidates.collect(), &step.predicates) {
                    if !next.iter().any(|seen| std::ptr::eq(*seen, element)) {
                        next.push(element);
                    }
                }
            }
            current = next;
        }

        current
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn apply_predicates<'a>(mut elements: Vec<&'a Element>, predicates: &[Predicate]) -> Vec<&'a Element> {
    for predicate in predicates {
        elements = match predicate {
            Predicate::HasAttr(name) => elements
                .into_iter()
                .filter(|e| e.attribute(name).is_some())
                .collect(),
            Predicate::AttrEquals(name, value) => elements
                .into_iter()
                .filter(|e| e.attribute(name) == Some(value.as_str()))
                .collect(),
            Predicate::Position(position) => elements
                .into_iter()
                .nth(position.saturating_sub(1))
                .into_iter()
                .collect(),
        };
    }
    elements
}

/// Byte offset where the current step ends (next unbracketed `/`).
fn step_end(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in input.char_indices() {
        match (c, quote) {
            ('\'' | '"', None) => quote = Some(c),
            (q, Some(open)) if q == open => quote = None,
            (_, Some(_)) => {}
            ('[', None) => depth += 1,
            (']', None) => depth = depth.checked_sub(1)?,
            ('/', None) if depth == 0 => return Some(i),
            _ => {}
        }
    }

    (depth == 0 && quote.is_none()).then_some(input.len())
}

fn parse_step(raw: &str, axis: Axis) -> Result<Step, String> {
    let (name, mut rest) = match raw.find('[') {
        Some(i) => raw.split_at(i),
        None => (raw, ""),
    };

    let name = name.trim();
    if name.is_empty() {
        return Err("missing name test".to_string());
    }
    if !name
        .chars()
        .all(|c| c == '*' || c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
    {
        return Err(format!("unsupported name test '{name}'"));
    }
    let name = match name {
        "*" => None,
        // Prefixed names match on their local part, like the tree itself.
        other => Some(other.rsplit(':').next().unwrap_or(other).to_string()),
    };

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let body_start = rest.strip_prefix('[').ok_or("expected '['")?;
        let close = body_start.find(']').ok_or("unbalanced '['")?;
        predicates.push(parse_predicate(body_start[..close].trim())?);
        rest = &body_start[close + 1..];
    }

    Ok(Step {
        axis,
        name,
        predicates,
    })
}

fn parse_predicate(body: &str) -> Result<Predicate, String> {
    if let Some(attr) = body.strip_prefix('@') {
        return match attr.split_once('=') {
            Some((name, value)) => {
                let value = value.trim();
                let unquoted = value
                    .strip_prefix('\'')
                    .and_then(|v| v.strip_suffix('\''))
                    .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                    .ok_or_else(|| format!("attribute value must be quoted in '{body}'"))?;
                Ok(Predicate::AttrEquals(
                    name.trim().to_string(),
                    unquoted.to_string(),
                ))
            }
            None => Ok(Predicate::HasAttr(attr.trim().to_string())),
        };
    }

    match body.parse::<usize>() {
        Ok(position) if position > 0 => Ok(Predicate::Position(position)),
        _ => Err(format!("unsupported predicate '[{body}]'")),
    }
}
