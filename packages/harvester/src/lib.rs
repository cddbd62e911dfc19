//! IAO Harvester - Extract sectioned full text and tables from articles.
//!
//! This crate reads HTML or XML articles, locates their title, sections and
//! tables through a declarative selector configuration, categorises section
//! headings with IAO terms and writes BioC JSON.
//!
//! # Example
//!
//! ```
//! use iao_harvester::markup::parse_html;
//! use iao_harvester::matcher::find_matches;
//! use iao_harvester::selector::ArticleConfig;
//!
//! let config = ArticleConfig::from_json_str(
//!     r#"{"title": {"defined-by": [{"tag": "h1"}]}}"#,
//! ).unwrap();
//! let root = parse_html("<h1>On sections</h1><p>body</p>");
//!
//! let titles = find_matches(config.section("title").unwrap(), &root);
//! assert_eq!(titles[0].text(), "On sections");
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration constants and validation
//! - [`error`]: Error types and Result alias
//! - [`markup`]: Parser-independent markup tree, HTML/XML parsing and path queries
//! - [`selector`]: Selector configuration parsing
//! - [`matcher`]: Node matching and segmented-layout regrouping
//! - [`tables`]: Table extraction and cell cleaning
//! - [`text`]: Markup preprocessing and text helpers
//! - [`bioc`]: BioC document assembly
//! - [`supplementary`]: Supplementary file routing
//! - [`files`]: Input discovery
//! - [`output`]: JSON output files
//! - [`harvester`]: Article pipeline
//! - [`cli`]: Command-line interface
//!
//! Heading categorisation lives in the `iao_sections` crate.
//!
//! # Supplementary files
//!
//! The binary does not read supplementary files. Library callers that do
//! implement [`supplementary::SupplementaryExtractor`] for their PDF, word
//! and spreadsheet backends and pass it to
//! [`supplementary::process_supplementary_files`], which routes each file by
//! extension and collects the extracted text.

pub mod bioc;
pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod harvester;
pub mod markup;
pub mod matcher;
pub mod output;
pub mod selector;
pub mod supplementary;
pub mod tables;
pub mod text;

// Re-export main functions
pub use harvester::{process_article, process_file, ArticleOutput, ReferenceData};

// Re-export commonly used items
pub use error::{ConfigError, HarvesterError, Result};
pub use selector::ArticleConfig;
