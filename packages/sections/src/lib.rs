//! IAO section typing for scientific articles.
//!
//! Maps free-text section headings onto Information Artifact Ontology (IAO)
//! categories. Headings found in the mapping table are anchors; the
//! categories of the remaining headings are inferred from the cheapest path
//! between neighbouring anchors in a weighted DAG of term transitions.
//!
//! # Example
//!
//! ```
//! use iao_sections::{resolve_headings, Dag, HeadingRecord, TermDictionary};
//!
//! let dictionary = TermDictionary::from_strs(
//!     "Methods\tmethods section\nResults\tresults section\n",
//!     "methods section\tIAO:0000317\n",
//! )
//! .unwrap();
//! let dag = Dag::from_edges([("methods section", "results section", 1.0)]);
//!
//! let headings: Vec<HeadingRecord> = ["Methods", "Sample collection", "Results"]
//!     .into_iter()
//!     .map(|text| HeadingRecord::lookup(text, text, &dictionary))
//!     .collect();
//!
//! let resolution = resolve_headings(&headings, &dictionary, &dag);
//! let terms = resolution.get("Sample collection").unwrap();
//! assert_eq!(terms[0].iao_name, "methods section");
//! assert_eq!(terms[0].iao_id, "IAO:0000317");
//! ```
//!
//! # Architecture
//!
//! - [`dictionary`]: heading → term and term → identifier tables
//! - [`dag`]: GraphML loader and shortest-path queries
//! - [`resolver`]: anchor search and path-based inference
//! - [`config`]: shared constants
//! - [`error`]: error types and Result alias

pub mod config;
pub mod dag;
pub mod dictionary;
pub mod error;
pub mod resolver;

pub use dag::{Dag, ShortestPaths};
pub use dictionary::{normalize_key, IaoTerm, TermDictionary};
pub use error::{Result, SectionsError};
pub use resolver::{
    assign_section_types, resolve_headings, HeadingRecord, Resolution, ResolvedHeading,
};
