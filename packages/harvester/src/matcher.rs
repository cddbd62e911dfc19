//! Node matching against selector configurations.
//!
//! Matches are deduplicated by their flattened text: when two nodes carry
//! the same text only the first one in document order is kept.

use std::collections::{BTreeMap, HashSet};

use crate::markup::Element;
use crate::selector::{Definition, SectionConfig};

/// A node matched by a section's `defined-by` block plus its `data` lookups.
#[derive(Debug, Clone)]
pub struct NodeMatch<'a> {
    pub node: &'a Element,

    /// Results of each `data` selector inside `node`. A key is only present
    /// when its selector found something.
    pub data: BTreeMap<String, Vec<&'a Element>>,
}

impl<'a> NodeMatch<'a> {
    /// Flattened texts found for a data key.
    #[must_use]
    pub fn data_texts(&self, key: &str) -> Vec<String> {
        self.data
            .get(key)
            .map(|nodes| nodes.iter().map(|n| n.text()).collect())
            .unwrap_or_default()
    }
}

/// Evaluate definitions inside `scope` in order, dropping nodes whose text
/// was already seen.
#[must_use]
pub fn find_in<'a>(definitions: &[Definition], scope: &'a Element) -> Vec<&'a Element> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for definition in definitions {
        for node in definition.find_all(scope) {
            if seen.insert(node.text()) {
                found.push(node);
            }
        }
    }

    found
}

/// All nodes matching a section's `defined-by` block.
#[must_use]
pub fn find_matches<'a>(section: &SectionConfig, root: &'a Element) -> Vec<&'a Element> {
    let matches = find_in(&section.defined_by, root);
    tracing::debug!(section = %section.name, count = matches.len(), "Matched section nodes");
    matches
}

/// Matches of a section together with their `data` lookups.
#[must_use]
pub fn extract_sections<'a>(section: &SectionConfig, root: &'a Element) -> Vec<NodeMatch<'a>> {
    find_matches(section, root)
        .into_iter()
        .map(|node| {
            let data = section
                .data
                .iter()
                .filter_map(|(key, definitions)| {
                    let found = find_in(definitions, node);
                    (!found.is_empty()).then(|| (key.clone(), found))
                })
                .collect();
            NodeMatch { node, data }
        })
        .collect()
}

/// Whether matches are flat sibling runs rather than nested containers,
/// i.e. they span more than one distinct tag name.
#[must_use]
pub fn is_segmented(nodes: &[&Element]) -> bool {
    let mut names = nodes.iter().map(|n| n.name.as_str());
    match names.next() {
        Some(first) => names.any(|name| name != first),
        None => false,
    }
}

/// A synthetic section built from a flat run of nodes.
#[derive(Debug, Clone, Default)]
pub struct SectionGroup<'a> {
    /// The separator node opening the group; `None` for nodes preceding the
    /// first separator.
    pub heading: Option<&'a Element>,

    pub body: Vec<&'a Element>,
}

impl<'a> SectionGroup<'a> {
    /// Heading and body nodes in order.
    pub fn nodes(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.heading.into_iter().chain(self.body.iter().copied())
    }
}

/// Regroup a flat node list: every `separator` node opens a new group and
/// the following nodes attach to it.
///
/// # Examples
/// ```
/// use iao_harvester::markup::Element;
/// use iao_harvester::matcher::regroup_segmented;
///
/// let nodes = [Element::new("h2"), Element::new("p"), Element::new("h2")];
/// let refs: Vec<&Element> = nodes.iter().collect();
/// assert_eq!(regroup_segmented(&refs, "h2").len(), 2);
/// ```
#[must_use]
pub fn regroup_segmented<'a>(nodes: &[&'a Element], separator: &str) -> Vec<SectionGroup<'a>> {
    let mut groups: Vec<SectionGroup<'a>> = Vec::new();

    for &node in nodes {
        if node.name == separator {
            groups.push(SectionGroup {
                heading: Some(node),
                body: Vec::new(),
            });
            continue;
        }
        match groups.last_mut() {
            Some(group) => group.body.push(node),
            None => groups.push(SectionGroup {
                heading: None,
                body: vec![node],
            }),
        }
    }

    groups
}
