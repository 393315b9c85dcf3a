//! Unified filter expressions for search and DSL
//!
//! This module provides a unified FilterExpr type that can be used across
//! both the API layer (for search queries) and the DSL layer (for policy filters).

use serde::{Deserialize, Serialize};

/// Filter operator for field comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal to
    Eq,
    /// Not equal to
    Ne,
    /// Greater than
    Gt,
    /// Less than
    Lt,
    /// Greater than or equal
    Gte,
    /// Less than or equal
    Lte,
    /// Contains substring (for strings)
    Contains,
    /// In list of values
    In,
    /// Matches regular expression
    Regex,
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// Logical NOT
    Not,
}

/// Unified filter expression for queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FilterExpr {
    /// Field to filter on
    pub field: String,
    /// Operator to apply
    pub operator: FilterOperator,
    /// Value to compare against (JSON value for flexibility)
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub value: serde_json::Value,
}

impl FilterExpr {
    /// Create a new filter expression.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: serde_json::Value,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Create a contains filter.
    pub fn contains(field: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(field, FilterOperator::Contains, value)
    }
}

// ============================================================================
// GRAPH PATTERN (property graph structural queries, spec §4.2)
// ============================================================================

/// A node reference in a `GraphPattern`: a label (`Buyer`, `Material`,
/// `Geography`, `Certification`, `Hyperedge_BCP`, ...) plus optional
/// attribute filters narrowing which nodes of that label match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NodePattern {
    pub label: String,
    pub filters: Vec<FilterExpr>,
}

impl NodePattern {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }
}

/// A directed relationship step between two node patterns, identified by
/// stable relationship type names (`HAS_BCP`, `FOR_MATERIAL`,
/// `IN_GEOGRAPHY`, `REQUIRES_CERT`), as named in spec §4.2/§6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RelationshipStep {
    pub relationship_type: String,
    pub to: NodePattern,
}

/// A structural query over the property graph projection: an anchor node
/// followed by an ordered chain of relationship steps, e.g. "buyers with
/// BCPs for polymer X in region Y with certifications Z" (spec §4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GraphPattern {
    pub anchor: NodePattern,
    pub steps: Vec<RelationshipStep>,
    pub limit: usize,
}

impl GraphPattern {
    pub fn new(anchor: NodePattern) -> Self {
        Self {
            anchor,
            steps: Vec::new(),
            limit: 100,
        }
    }

    pub fn then(mut self, relationship_type: impl Into<String>, to: NodePattern) -> Self {
        self.steps.push(RelationshipStep {
            relationship_type: relationship_type.into(),
            to,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A single matched binding returned by `query_graph_pattern`: the node IDs
/// (hyperedge keys) bound to each step of the pattern, anchor first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GraphMatch {
    pub bound_keys: Vec<String>,
}

#[cfg(test)]
mod graph_pattern_tests {
    use super::*;

    #[test]
    fn graph_pattern_builder_chains_steps() {
        let pattern = GraphPattern::new(NodePattern::new("Buyer"))
            .then(
                "HAS_BCP",
                NodePattern::new("Hyperedge_BCP").with_filter(FilterExpr::eq(
                    "polymer",
                    serde_json::json!("HDPE"),
                )),
            )
            .then("FOR_MATERIAL", NodePattern::new("Material"))
            .limit(10);

        assert_eq!(pattern.steps.len(), 2);
        assert_eq!(pattern.limit, 10);
        assert_eq!(pattern.steps[0].relationship_type, "HAS_BCP");
    }
}
