//! Declarative article selector configuration.
//!
//! A configuration names sections of an article (`title`, `sections`,
//! `tables`, ...) and says how to find them:
//!
//! ```json
//! {
//!   "config": {
//!     "sections": {
//!       "defined-by": [{"tag": "div", "attrs": {"class": "tsec.*"}}],
//!       "data": {
//!         "headers": [{"tag": "h[2-4]"}],
//!         "paragraphs": [{"tag": "p"}]
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Tag names and attribute values are regular expressions anchored to the
//! whole string. `xpath` narrows a definition to the results of a path query.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde_json::Value;

use crate::error::{ConfigError, HarvesterError, Result};
use crate::markup::{Element, PathQuery};

/// Anchor a pattern so it must match the whole string.
///
/// The pattern is grouped so alternations are anchored as a whole.
///
/// # Examples
/// ```
/// use iao_harvester::selector::anchor_pattern;
///
/// assert_eq!(anchor_pattern("h2"), "^(?:h2)$");
/// assert_eq!(anchor_pattern("^h[1-6]$"), "^(?:h[1-6])$");
/// assert_eq!(anchor_pattern("td|th"), "^(?:td|th)$");
/// ```
#[must_use]
pub fn anchor_pattern(value: &str) -> String {
    let inner = value.strip_prefix('^').unwrap_or(value);
    let inner = match inner.strip_suffix('$') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => inner,
    };
    format!("^(?:{inner})$")
}

fn compile(value: &str) -> std::result::Result<Regex, ConfigError> {
    let pattern = anchor_pattern(value);
    Regex::new(&pattern).map_err(|source| ConfigError::InvalidPattern { pattern, source })
}

/// Compile a string or list of strings into anchored patterns.
fn compile_patterns(context: &str, value: &Value) -> std::result::Result<Vec<Regex>, ConfigError> {
    let invalid = || ConfigError::InvalidPatterns {
        context: context.to_string(),
        found: value.to_string(),
    };

    match value {
        Value::String(s) => Ok(vec![compile(s)?]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().ok_or_else(invalid).and_then(compile))
            .collect(),
        _ => Err(invalid()),
    }
}

/// Accept a single mapping or a list of mappings.
fn mappings<'v>(
    context: &str,
    value: &'v Value,
) -> std::result::Result<Vec<&'v serde_json::Map<String, Value>>, ConfigError> {
    let not_a_mapping = || ConfigError::NotAMapping {
        context: context.to_string(),
        found: value.to_string(),
    };

    match value {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_object().ok_or_else(not_a_mapping))
            .collect(),
        _ => Err(not_a_mapping()),
    }
}

/// Attribute constraints that must all hold for an element to match.
#[derive(Debug, Clone)]
pub struct AttrBlock {
    /// Attribute name and accepted value patterns; no patterns means the
    /// attribute only has to be present.
    constraints: Vec<(String, Vec<Regex>)>,
}

impl AttrBlock {
    fn from_map(
        context: &str,
        map: &serde_json::Map<String, Value>,
    ) -> std::result::Result<Self, ConfigError> {
        let mut constraints = Vec::with_capacity(map.len());
        for (name, value) in map {
            let patterns = match value {
                Value::Bool(true) => Vec::new(),
                other => compile_patterns(&format!("{context}.{name}"), other)?,
            };
            constraints.push((name.clone(), patterns));
        }
        Ok(Self { constraints })
    }

    /// Whether the element satisfies every constraint.
    ///
    /// `class` values also match against each individual class name.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        self.constraints.iter().all(|(name, patterns)| {
            let Some(value) = element.attribute(name) else {
                return false;
            };
            patterns.is_empty()
                || patterns.iter().any(|re| {
                    re.is_match(value)
                        || (name == "class" && value.split_whitespace().any(|c| re.is_match(c)))
                })
        })
    }
}

/// One way of locating nodes: tag patterns, attribute blocks and an
/// optional path query.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    /// Accepted tag names; empty accepts every tag.
    pub tags: Vec<Regex>,

    /// Alternative attribute blocks; empty applies no attribute filter.
    pub attrs: Vec<AttrBlock>,

    pub xpath: Option<PathQuery>,
}

impl Definition {
    /// Parse a single definition mapping.
    ///
    /// # Errors
    /// Returns a `ConfigError` for malformed tags, attrs, patterns or paths.
    pub fn from_value(context: &str, value: &Value) -> std::result::Result<Self, ConfigError> {
        let map = value.as_object().ok_or_else(|| ConfigError::NotAMapping {
            context: context.to_string(),
            found: value.to_string(),
        })?;

        let tags = match map.get("tag") {
            Some(tag) => compile_patterns(&format!("tag of {context}"), tag)?,
            None => Vec::new(),
        };

        let attrs = match map.get("attrs") {
            Some(attrs) => {
                let attrs_context = format!("attrs of {context}");
                mappings(&attrs_context, attrs)?
                    .into_iter()
                    .map(|block| AttrBlock::from_map(&attrs_context, block))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => Vec::new(),
        };

        let xpath = match map.get("xpath") {
            Some(Value::String(query)) => Some(PathQuery::parse(query)?),
            Some(other) => {
                return Err(ConfigError::InvalidPatterns {
                    context: format!("xpath of {context}"),
                    found: other.to_string(),
                })
            }
            None => None,
        };

        Ok(Self { tags, attrs, xpath })
    }

    /// Whether an element passes the tag and attribute filters.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        (self.tags.is_empty() || self.tags.iter().any(|re| re.is_match(&element.name)))
            && (self.attrs.is_empty() || self.attrs.iter().any(|block| block.matches(element)))
    }

    /// All matching elements below `scope`, in document order.
    #[must_use]
    pub fn find_all<'a>(&self, scope: &'a Element) -> Vec<&'a Element> {
        match &self.xpath {
            Some(query) => query
                .select(scope)
                .into_iter()
                .filter(|e| self.matches(e))
                .collect(),
            None => scope.descendants().filter(|e| self.matches(e)).collect(),
        }
    }
}

fn definitions(context: &str, value: &Value) -> std::result::Result<Vec<Definition>, ConfigError> {
    mappings(context, value)?
        .into_iter()
        .map(|map| Definition::from_value(context, &Value::Object(map.clone())))
        .collect()
}

/// How to find one named part of an article.
#[derive(Debug, Clone)]
pub struct SectionConfig {
    pub name: String,

    /// Definitions locating the section's nodes, tried in order.
    pub defined_by: Vec<Definition>,

    /// Named sub-selectors evaluated inside every match.
    pub data: BTreeMap<String, Vec<Definition>>,

    /// Tag that starts a new group in a segmented layout.
    pub separator: Option<String>,
}

impl SectionConfig {
    /// Parse a section block.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingDefinedBy` when `defined-by` is absent and
    /// `ConfigError::NotAMapping` for blocks of the wrong shape.
    pub fn from_value(name: &str, value: &Value) -> std::result::Result<Self, ConfigError> {
        let map = value.as_object().ok_or_else(|| ConfigError::NotAMapping {
            context: name.to_string(),
            found: value.to_string(),
        })?;

        let defined_by = map
            .get("defined-by")
            .ok_or_else(|| ConfigError::MissingDefinedBy {
                section: name.to_string(),
            })?;
        let defined_by = definitions(&format!("defined-by of {name}"), defined_by)?;

        let mut data = BTreeMap::new();
        if let Some(data_value) = map.get("data") {
            let data_map = data_value.as_object().ok_or_else(|| ConfigError::NotAMapping {
                context: format!("data of {name}"),
                found: data_value.to_string(),
            })?;
            for (key, value) in data_map {
                data.insert(key.clone(), definitions(&format!("data.{key} of {name}"), value)?);
            }
        }

        let separator = map
            .get("separator")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            defined_by,
            data,
            separator,
        })
    }
}

/// Complete selector configuration for one article layout.
#[derive(Debug, Clone, Default)]
pub struct ArticleConfig {
    sections: BTreeMap<String, SectionConfig>,
}

impl ArticleConfig {
    /// Load a configuration file; `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON.
    ///
    /// # Errors
    /// Returns an IO error for unreadable files and a `ConfigError` for
    /// malformed content.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| HarvesterError::file(path, e))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );

        let config = if is_yaml {
            Self::from_yaml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };
        tracing::debug!(path = %path.display(), sections = config.sections.len(), "Loaded selector config");
        Ok(config)
    }

    /// Parse a JSON configuration.
    ///
    /// # Errors
    /// Returns a `ConfigError` for invalid JSON or malformed sections.
    pub fn from_json_str(json: &str) -> std::result::Result<Self, ConfigError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ConfigError::Syntax(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Parse a YAML configuration.
    ///
    /// # Errors
    /// Returns a `ConfigError` for invalid YAML or malformed sections.
    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, ConfigError> {
        let value: Value =
            serde_yaml_ng::from_str(yaml).map_err(|e| ConfigError::Syntax(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Build a configuration from a parsed document.
    ///
    /// The sections may be wrapped in a top-level `config` key.
    ///
    /// # Errors
    /// Returns a `ConfigError` for malformed sections.
    pub fn from_value(value: &Value) -> std::result::Result<Self, ConfigError> {
        let root = value.get("config").unwrap_or(value);
        let map = root.as_object().ok_or_else(|| ConfigError::NotAMapping {
            context: "config".to_string(),
            found: root.to_string(),
        })?;

        let sections = map
            .iter()
            .map(|(name, section)| Ok((name.clone(), SectionConfig::from_value(name, section)?)))
            .collect::<std::result::Result<BTreeMap<_, _>, ConfigError>>()?;

        Ok(Self { sections })
    }

    /// A section by name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&SectionConfig> {
        self.sections.get(name)
    }

    /// Names of all configured sections, sorted.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}
