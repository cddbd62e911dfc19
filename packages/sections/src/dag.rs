//! Weighted DAG of IAO term transitions.
//!
//! Nodes are IAO term names, edges are permitted transitions between
//! consecutive section categories with a `cost` weight. The graph is loaded
//! once from GraphML and shared read-only between documents.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use petgraph::algo::{dijkstra, has_path_connecting};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use roxmltree::{Document, Node};

use crate::config::{COST_ATTRIBUTE, COST_TOLERANCE, DEFAULT_EDGE_COST};
use crate::error::{Result, SectionsError};

/// Directed graph of IAO terms weighted by transition cost.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    graph: DiGraph<String, f64>,
    index: HashMap<String, NodeIndex>,
}

impl Dag {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a GraphML file from disk.
    ///
    /// # Errors
    /// A missing or unreadable file is fatal: the resolver cannot run
    /// without its graph.
    pub fn load(path: &Path) -> Result<Self> {
        let xml = fs::read_to_string(path).map_err(|e| SectionsError::io(path, e))?;
        let dag = Self::from_graphml_str(&xml)?;
        tracing::debug!(
            path = %path.display(),
            nodes = dag.node_count(),
            edges = dag.edge_count(),
            "Loaded IAO DAG"
        );
        Ok(dag)
    }

    /// Parse a GraphML document.
    ///
    /// The `cost` edge attribute is located through its `<key>` declaration;
    /// edges without it fall back to the key's `<default>` or to 1.0.
    ///
    /// # Errors
    /// Returns an error for malformed XML, edges without endpoints, or costs
    /// that are not finite non-negative numbers.
    pub fn from_graphml_str(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();

        let (cost_key, default_cost) = find_cost_key(root);
        let graph_node = root
            .children()
            .find(|n| has_tag(*n, "graph"))
            .ok_or_else(|| SectionsError::MissingElement {
                element: "graph".to_string(),
                context: "graphml".to_string(),
            })?;
        let undirected = graph_node.attribute("edgedefault") == Some("undirected");

        let mut dag = Self::new();

        for node in graph_node.children().filter(|n| has_tag(*n, "node")) {
            let id = node.attribute("id").ok_or_else(|| SectionsError::MissingElement {
                element: "id".to_string(),
                context: "node".to_string(),
            })?;
            dag.add_node(id);
        }

        for edge in graph_node.children().filter(|n| has_tag(*n, "edge")) {
            let (Some(source), Some(target)) = (edge.attribute("source"), edge.attribute("target"))
            else {
                return Err(SectionsError::MissingElement {
                    element: "source/target".to_string(),
                    context: "edge".to_string(),
                });
            };

            let cost = match cost_key.as_deref().and_then(|key| edge_data(edge, key)) {
                Some(raw) => parse_cost(source, target, raw)?,
                None => default_cost,
            };

            dag.add_edge(source, target, cost);

            let directed = match edge.attribute("directed") {
                Some(flag) => flag == "true",
                None => !undirected,
            };
            if !directed {
                dag.add_edge(target, source, cost);
            }
        }

        Ok(dag)
    }

    /// Build a graph from `(source, target, cost)` triples.
    #[must_use]
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = (&'a str, &'a str, f64)>) -> Self {
        let mut dag = Self::new();
        for (source, target, cost) in edges {
            dag.add_edge(source, target, cost);
        }
        dag
    }

    /// Add a node if it does not exist yet and return its index.
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Add a directed edge, creating missing endpoints.
    pub fn add_edge(&mut self, source: &str, target: &str, cost: f64) {
        let from = self.add_node(source);
        let to = self.add_node(target);
        self.graph.add_edge(from, to, cost);
    }

    /// Whether the graph has a node with this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `target` is reachable from `source`.
    ///
    /// Unknown nodes are unreachable rather than an error.
    #[must_use]
    pub fn path_exists(&self, source: &str, target: &str) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    /// All minimum-cost paths from `source` to `target`.
    ///
    /// Paths are produced lazily in lexicographic order of their node names,
    /// so the first path is the deterministic tie-break winner. The iterator
    /// is empty when no path exists.
    #[must_use]
    pub fn shortest_paths(&self, source: &str, target: &str) -> ShortestPaths<'_> {
        let (Some(&from), Some(&to)) = (self.index.get(source), self.index.get(target)) else {
            return ShortestPaths::empty(self);
        };

        let distances = dijkstra(&self.graph, from, None, |edge| *edge.weight());
        let Some(&target_distance) = distances.get(&to) else {
            return ShortestPaths::empty(self);
        };

        // Nodes that lie on at least one minimum-cost path into the target.
        let mut on_path: HashSet<NodeIndex> = HashSet::from([to]);
        let mut pending = vec![to];
        while let Some(node) = pending.pop() {
            let Some(&node_distance) = distances.get(&node) else {
                continue;
            };
            for edge in self.graph.edges_directed(node, Direction::Incoming) {
                let pred = edge.source();
                let Some(&pred_distance) = distances.get(&pred) else {
                    continue;
                };
                if is_tight(pred_distance, *edge.weight(), node_distance) && on_path.insert(pred) {
                    pending.push(pred);
                }
            }
        }

        let mut successors: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        for &node in &on_path {
            let node_distance = distances[&node];
            let mut next: Vec<NodeIndex> = self
                .graph
                .edges_directed(node, Direction::Outgoing)
                .filter(|edge| on_path.contains(&edge.target()))
                .filter(|edge| is_tight(node_distance, *edge.weight(), distances[&edge.target()]))
                .map(|edge| edge.target())
                .collect();
            next.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
            next.dedup();
            successors.insert(node, next);
        }

        tracing::trace!(
            source,
            target,
            cost = target_distance,
            "Enumerating shortest paths"
        );

        ShortestPaths {
            dag: self,
            target: to,
            successors,
            stack: vec![(from, 0)],
        }
    }

    fn name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }
}

/// Lazy iterator over all minimum-cost paths between two nodes.
///
/// Created by [`Dag::shortest_paths`].
pub struct ShortestPaths<'a> {
    dag: &'a Dag,
    target: NodeIndex,
    successors: HashMap<NodeIndex, Vec<NodeIndex>>,
    /// Current DFS branch: node and the position of its next successor.
    stack: Vec<(NodeIndex, usize)>,
}

impl<'a> ShortestPaths<'a> {
    fn empty(dag: &'a Dag) -> Self {
        Self {
            dag,
            target: NodeIndex::end(),
            successors: HashMap::new(),
            stack: Vec::new(),
        }
    }
}

impl Iterator for ShortestPaths<'_> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let &(node, cursor) = self.stack.last()?;

            if node == self.target {
                let path = self
                    .stack
                    .iter()
                    .map(|(idx, _)| self.dag.name(*idx).to_string())
                    .collect();
                self.stack.pop();
                return Some(path);
            }

            let child = self
                .successors
                .get(&node)
                .and_then(|next| next.get(cursor))
                .copied();

            match child {
                Some(child) => {
                    if let Some(top) = self.stack.last_mut() {
                        top.1 += 1;
                    }
                    // Zero-cost cycles would otherwise loop forever.
                    if !self.stack.iter().any(|(idx, _)| *idx == child) {
                        self.stack.push((child, 0));
                    }
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

fn is_tight(from_distance: f64, cost: f64, to_distance: f64) -> bool {
    (from_distance + cost - to_distance).abs() <= COST_TOLERANCE
}

fn parse_cost(source: &str, target: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|cost| cost.is_finite() && *cost >= 0.0)
        .ok_or_else(|| SectionsError::InvalidCost {
            source_node: source.to_string(),
            target_node: target.to_string(),
            value: raw.to_string(),
        })
}

/// Find the `<key>` id declaring the edge cost attribute and its default.
fn find_cost_key(root: Node<'_, '_>) -> (Option<String>, f64) {
    let Some(key) = root.children().find(|n| {
        has_tag(*n, "key")
            && n.attribute("attr.name") == Some(COST_ATTRIBUTE)
            && matches!(n.attribute("for"), Some("edge" | "all") | None)
    }) else {
        return (None, DEFAULT_EDGE_COST);
    };

    let default = key
        .children()
        .find(|n| has_tag(*n, "default"))
        .and_then(|n| n.text())
        .and_then(|t| t.trim().parse::<f64>().ok())
        .unwrap_or(DEFAULT_EDGE_COST);

    (key.attribute("id").map(str::to_string), default)
}

fn edge_data<'a>(edge: Node<'a, '_>, key: &str) -> Option<&'a str> {
    edge.children()
        .find(|n| has_tag(*n, "data") && n.attribute("key") == Some(key))
        .and_then(|n| n.text())
}

/// Namespace-agnostic tag check, GraphML files declare a default namespace.
fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && node.tag_name().name() == tag
}
