//! The clause chain.

use std::sync::Arc;

use crate::ast::{JoinType, OrderDirection, SetOperator};
use crate::expr::ExprNode;
use crate::symbolic::{Projected, ScopeId};

/// A base table in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    /// Table name.
    pub name: String,
    /// Alias given with `from_as`.
    pub alias: Option<String>,
}

impl TableSource {
    /// The name column references are qualified with.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// An ordering key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    /// Key expression.
    pub expr: ExprNode,
    /// Direction.
    pub direction: OrderDirection,
}

/// How the two sides of a join are matched.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    /// Pairwise equality of key rows.
    Keys {
        /// Left keys.
        left: Vec<Projected>,
        /// Right keys.
        right: Vec<Projected>,
    },
    /// Arbitrary predicate.
    Predicate(ExprNode),
}

/// One clause of a query.
///
/// Each node owns an `Arc` to its source, so pipelines share structure and
/// are cheap to extend. Nodes are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Root: a base table.
    From {
        /// The table.
        table: TableSource,
        /// All table columns.
        items: Vec<Projected>,
    },
    /// Filter.
    Where {
        /// Source clause.
        source: Arc<QueryNode>,
        /// Predicate.
        predicate: ExprNode,
    },
    /// Projection.
    Select {
        /// Source clause.
        source: Arc<QueryNode>,
        /// Projected columns.
        items: Vec<Projected>,
    },
    /// Ordering; replaces earlier keys.
    OrderBy {
        /// Source clause.
        source: Arc<QueryNode>,
        /// Keys.
        keys: Vec<OrderKey>,
    },
    /// Secondary ordering; appends to earlier keys.
    ThenBy {
        /// Source clause.
        source: Arc<QueryNode>,
        /// Keys.
        keys: Vec<OrderKey>,
    },
    /// Grouping.
    GroupBy {
        /// Source clause.
        source: Arc<QueryNode>,
        /// Grouping keys.
        keys: Vec<Projected>,
    },
    /// Filter over groups.
    Having {
        /// Source clause.
        source: Arc<QueryNode>,
        /// Predicate.
        predicate: ExprNode,
    },
    /// Join of two queries.
    Join {
        /// Left operand.
        left: Arc<QueryNode>,
        /// Right operand: a table chain or a boundary.
        right: Arc<QueryNode>,
        /// Join type.
        join_type: JoinType,
        /// Match condition.
        condition: JoinCondition,
        /// Result columns.
        items: Vec<Projected>,
    },
    /// Duplicate elimination.
    Distinct {
        /// Source clause.
        source: Arc<QueryNode>,
        /// Scope of the rows after this clause.
        scope: ScopeId,
    },
    /// Row window.
    LimitOffset {
        /// Source clause.
        source: Arc<QueryNode>,
        /// Maximum number of rows.
        limit: Option<u64>,
        /// Rows skipped.
        offset: Option<u64>,
        /// Scope of the rows after this clause.
        scope: ScopeId,
    },
    /// Set operation.
    SetOp {
        /// Left operand.
        left: Arc<QueryNode>,
        /// Right operand.
        right: Arc<QueryNode>,
        /// Operator.
        op: SetOperator,
        /// Scope of the rows after this clause.
        scope: ScopeId,
    },
    /// Explicit subquery boundary.
    Derived {
        /// Source clause.
        source: Arc<QueryNode>,
        /// Scope of the rows after this clause.
        scope: ScopeId,
    },
}

impl QueryNode {
    /// Returns true for From optionally followed by Wheres.
    #[must_use]
    pub fn is_table_chain(&self) -> bool {
        match self {
            Self::From { .. } => true,
            Self::Where { source, .. } => source.is_table_chain(),
            _ => false,
        }
    }

    /// The scope rows are rebound to after this clause, if it is a boundary.
    #[must_use]
    pub const fn boundary(&self) -> Option<ScopeId> {
        match self {
            Self::Distinct { scope, .. }
            | Self::LimitOffset { scope, .. }
            | Self::SetOp { scope, .. }
            | Self::Derived { scope, .. } => Some(*scope),
            _ => None,
        }
    }

    /// The qualifier of the base table of a table chain.
    #[must_use]
    pub fn table_qualifier(&self) -> Option<&str> {
        match self {
            Self::From { table, .. } => Some(table.qualifier()),
            Self::Where { source, .. } => source.table_qualifier(),
            _ => None,
        }
    }

    /// Returns true if this clause's FROM level binds `scope`. Boundaries
    /// hide whatever they enclose.
    #[must_use]
    pub fn binds_scope(&self, scope: ScopeId) -> bool {
        match self.boundary() {
            Some(own) => own == scope,
            None => self.visible_sources().iter().any(|s| s.binds_scope(scope)),
        }
    }

    /// Returns true if this clause's FROM level binds a base table
    /// qualified by `qualifier`.
    #[must_use]
    pub fn binds_qualifier(&self, qualifier: &str) -> bool {
        match self {
            Self::From { table, .. } => table.qualifier() == qualifier,
            _ => self
                .visible_sources()
                .iter()
                .any(|s| s.binds_qualifier(qualifier)),
        }
    }

    fn visible_sources(&self) -> Vec<&Arc<Self>> {
        match self {
            Self::Where { source, .. }
            | Self::Select { source, .. }
            | Self::OrderBy { source, .. }
            | Self::ThenBy { source, .. }
            | Self::GroupBy { source, .. }
            | Self::Having { source, .. } => vec![source],
            Self::Join { left, right, .. } => vec![left, right],
            Self::From { .. }
            | Self::Distinct { .. }
            | Self::LimitOffset { .. }
            | Self::SetOp { .. }
            | Self::Derived { .. } => Vec::new(),
        }
    }

    /// Returns true if a GROUP BY is in effect at this clause.
    #[must_use]
    pub fn is_grouped(&self) -> bool {
        match self {
            Self::GroupBy { .. } => true,
            Self::Where { source, .. }
            | Self::Select { source, .. }
            | Self::OrderBy { source, .. }
            | Self::ThenBy { source, .. }
            | Self::Having { source, .. } => source.is_grouped(),
            Self::From { .. }
            | Self::Join { .. }
            | Self::Distinct { .. }
            | Self::LimitOffset { .. }
            | Self::SetOp { .. }
            | Self::Derived { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from() -> Arc<QueryNode> {
        Arc::new(QueryNode::From {
            table: TableSource {
                name: String::from("customers"),
                alias: None,
            },
            items: Vec::new(),
        })
    }

    #[test]
    fn test_table_chain() {
        let filtered = QueryNode::Where {
            source: from(),
            predicate: ExprNode::Literal(crate::value::SqlValue::Bool(true)),
        };
        assert!(filtered.is_table_chain());
        let selected = QueryNode::Select {
            source: from(),
            items: Vec::new(),
        };
        assert!(!selected.is_table_chain());
    }

    #[test]
    fn test_grouping_stops_at_boundaries() {
        let grouped = Arc::new(QueryNode::GroupBy {
            source: from(),
            keys: Vec::new(),
        });
        let selected = QueryNode::Select {
            source: grouped.clone(),
            items: Vec::new(),
        };
        assert!(selected.is_grouped());
        let derived = QueryNode::Derived {
            source: grouped,
            scope: ScopeId::fresh(),
        };
        assert!(!derived.is_grouped());
        assert!(derived.boundary().is_some());
    }

    #[test]
    fn test_boundaries_hide_enclosed_tables() {
        let scope = ScopeId::fresh();
        let distinct = Arc::new(QueryNode::Distinct {
            source: from(),
            scope,
        });
        let filtered = QueryNode::Where {
            source: distinct,
            predicate: ExprNode::Literal(crate::value::SqlValue::Bool(true)),
        };
        assert!(filtered.binds_scope(scope));
        assert!(!filtered.binds_scope(ScopeId::fresh()));
        assert!(!filtered.binds_qualifier("customers"));
        assert_eq!(filtered.table_qualifier(), None);
        assert_eq!(from().table_qualifier(), Some("customers"));
    }

    #[test]
    fn test_qualifier_prefers_alias() {
        let source = TableSource {
            name: String::from("customers"),
            alias: Some(String::from("c")),
        };
        assert_eq!(source.qualifier(), "c");
    }
}
