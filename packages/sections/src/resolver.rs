//! Heading-to-IAO assignment for headings the mapping table does not know.
//!
//! Headings are processed in reading order. Every heading that already has
//! terms is an anchor. For an unmapped heading the nearest anchor before it
//! and the nearest anchor after it are located, and the heading is assigned
//! the categories found on the cheapest DAG path between them:
//!
//! - a direct edge (or identical terms) gives the previous anchor's term,
//! - a longer path gives its interior terms,
//! - no following anchor continues the previous anchor's last term.
//!
//! Headings before the first anchor are left unresolved.

use std::collections::HashSet;

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

use crate::config::{END_OF_ARTICLE, START_OF_ARTICLE};
use crate::dag::Dag;
use crate::dictionary::{IaoTerm, TermDictionary};

/// One document heading and the IAO terms already known for it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct HeadingRecord {
    /// Heading text as it appears in the document.
    pub text: String,

    /// Known IAO term names, in mapping table order.
    pub terms: Vec<String>,
}

impl HeadingRecord {
    /// Create a record with known terms.
    #[must_use]
    pub fn new(text: impl Into<String>, terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            text: text.into(),
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a record without terms.
    #[must_use]
    pub fn unmapped(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            terms: Vec::new(),
        }
    }

    /// Create a record using the mapping table.
    ///
    /// `key` is the normalised lookup form of `text`; the lookup itself is
    /// case-insensitive.
    #[must_use]
    pub fn lookup(text: impl Into<String>, key: &str, dictionary: &TermDictionary) -> Self {
        Self {
            text: text.into(),
            terms: dictionary.terms_for_heading(key).to_vec(),
        }
    }

    /// Whether this heading already carries at least one term.
    #[must_use]
    pub fn is_anchor(&self) -> bool {
        !self.terms.is_empty()
    }
}

/// A heading whose categories were inferred from the DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeading {
    pub heading: String,
    pub terms: Vec<IaoTerm>,
}

/// Inferred categories for previously unmapped headings, in reading order.
///
/// Serializes as a `{heading: [{iao_name, iao_id}]}` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    entries: Vec<ResolvedHeading>,
}

impl Resolution {
    /// Create an empty resolution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the terms for a heading.
    ///
    /// A replaced heading keeps its original position.
    pub fn insert(&mut self, heading: impl Into<String>, terms: Vec<IaoTerm>) {
        let heading = heading.into();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.heading == heading) {
            entry.terms = terms;
        } else {
            self.entries.push(ResolvedHeading { heading, terms });
        }
    }

    /// Terms inferred for a heading, `None` when it was not resolved.
    #[must_use]
    pub fn get(&self, heading: &str) -> Option<&[IaoTerm]> {
        self.entries
            .iter()
            .find(|e| e.heading == heading)
            .map(|e| e.terms.as_slice())
    }

    /// Whether a heading was resolved.
    #[must_use]
    pub fn contains(&self, heading: &str) -> bool {
        self.get(heading).is_some()
    }

    /// Number of resolved headings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over resolved headings in reading order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedHeading> {
        self.entries.iter()
    }
}

impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|e| (&e.heading, &e.terms)))
    }
}

/// Infer IAO terms for every unmapped heading.
///
/// Anchors are never part of the result, and a heading text that is an
/// anchor anywhere in the document is never reported either. Headings that
/// cannot be placed (no previous anchor, or no DAG path even after the
/// fallback) are absent from the result.
#[must_use]
pub fn resolve_headings(
    headings: &[HeadingRecord],
    dictionary: &TermDictionary,
    dag: &Dag,
) -> Resolution {
    let anchor_texts: HashSet<&str> = headings
        .iter()
        .filter(|h| h.is_anchor())
        .map(|h| h.text.as_str())
        .collect();

    let mut resolution = Resolution::new();

    for (position, heading) in headings.iter().enumerate() {
        if heading.is_anchor() || anchor_texts.contains(heading.text.as_str()) {
            continue;
        }

        match infer_terms(headings, position, dag) {
            Some(terms) => {
                tracing::debug!(heading = %heading.text, ?terms, "Resolved heading via DAG");
                let records = terms.iter().map(|t| dictionary.iao_term(t)).collect();
                resolution.insert(heading.text.clone(), records);
            }
            None => {
                tracing::debug!(heading = %heading.text, "Heading left unresolved");
            }
        }
    }

    resolution
}

/// IAO terms for every heading: mapped terms for anchors, inferred terms
/// for resolved headings, and an empty list otherwise.
#[must_use]
pub fn assign_section_types(
    headings: &[HeadingRecord],
    resolution: &Resolution,
    dictionary: &TermDictionary,
) -> Vec<Vec<IaoTerm>> {
    headings
        .iter()
        .map(|heading| {
            if heading.is_anchor() {
                heading.terms.iter().map(|t| dictionary.iao_term(t)).collect()
            } else {
                resolution.get(&heading.text).map(<[IaoTerm]>::to_vec).unwrap_or_default()
            }
        })
        .collect()
}

fn infer_terms(headings: &[HeadingRecord], position: usize, dag: &Dag) -> Option<Vec<String>> {
    let previous = previous_anchor(headings, position);
    let next = next_anchor(headings, position);

    match (previous, next) {
        (Some((_, previous)), Some((next_position, next))) => {
            let from = previous.terms.last()?;
            let to = next.terms.first()?;

            if dag.path_exists(from, to) {
                return cheapest_path_terms(dag, from, to);
            }

            // The DAG may not connect categories around a noisy heading; try
            // the anchor after the next one instead.
            let Some((_, later)) = next_anchor(headings, next_position) else {
                tracing::debug!(from = %from, to = %to, "No DAG path and no later anchor");
                return None;
            };
            let later_term = later.terms.first()?;
            tracing::debug!(
                from = %from,
                to = %to,
                retry = %later_term,
                "No DAG path between anchors, retrying with later anchor"
            );
            cheapest_path_terms(dag, from, later_term)
        }
        (Some((_, previous)), None) => {
            tracing::trace!(boundary = END_OF_ARTICLE, "Continuing previous category");
            previous.terms.last().map(|t| vec![t.clone()])
        }
        (None, _) => {
            tracing::trace!(boundary = START_OF_ARTICLE, "No previous anchor");
            None
        }
    }
}

/// Terms for the first (tie-break winning) shortest path.
fn cheapest_path_terms(dag: &Dag, from: &str, to: &str) -> Option<Vec<String>> {
    let path = dag.shortest_paths(from, to).next()?;
    let len = path.len();

    if len <= 2 {
        Some(path.into_iter().take(1).collect())
    } else {
        Some(path.into_iter().skip(1).take(len - 2).collect())
    }
}

fn previous_anchor(headings: &[HeadingRecord], position: usize) -> Option<(usize, &HeadingRecord)> {
    headings[..position]
        .iter()
        .enumerate()
        .rev()
        .find(|(_, h)| h.is_anchor())
}

fn next_anchor(headings: &[HeadingRecord], position: usize) -> Option<(usize, &HeadingRecord)> {
    headings
        .iter()
        .enumerate()
        .skip(position + 1)
        .find(|(_, h)| h.is_anchor())
}
