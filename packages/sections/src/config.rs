//! Constants shared by the DAG loader and the heading resolver.

/// Label used for the position before the first heading of an article.
pub const START_OF_ARTICLE: &str = "Start of the article";

/// Label used for the position after the last heading of an article.
pub const END_OF_ARTICLE: &str = "End of the article";

/// Name of the GraphML edge attribute holding the traversal cost.
pub const COST_ATTRIBUTE: &str = "cost";

/// Cost used for edges that carry no `cost` attribute and no key default.
pub const DEFAULT_EDGE_COST: f64 = 1.0;

/// Two path costs closer than this are treated as tied.
pub const COST_TOLERANCE: f64 = 1e-9;
