//! GROUP BY / HAVING.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::{Query, QueryNode, Unordered};
use crate::expr::{AggregateFunction, Expr, ExprNode};
use crate::symbolic::{capture_predicate, capture_projection, Row};
use crate::types::{Numeric, SqlKind, SqlType};

/// A grouped query, awaiting `having` filters and a `select`.
#[derive(Debug, Clone)]
pub struct Grouped<R, K> {
    node: Arc<QueryNode>,
    group: Group<R, K>,
}

impl<R: Row, K: Row> Grouped<R, K> {
    pub(super) const fn new(node: Arc<QueryNode>, row: R, key: K) -> Self {
        Self {
            node,
            group: Group { row, key },
        }
    }

    /// `HAVING predicate`. Consecutive filters are ANDed together.
    #[must_use]
    pub fn having<F>(self, predicate: F) -> Self
    where
        F: FnOnce(&Group<R, K>) -> Expr<bool>,
    {
        let predicate = capture_predicate(&self.group, predicate);
        let node = QueryNode::Having {
            source: self.node,
            predicate,
        };
        Self {
            node: Arc::new(node),
            group: self.group,
        }
    }

    /// Projects each group. Filters on the result render as HAVING.
    #[must_use]
    pub fn select<S, F>(self, selector: F) -> Query<S, Unordered>
    where
        S: Row,
        F: FnOnce(&Group<R, K>) -> S,
    {
        let (row, items) = capture_projection(&self.group, selector);
        let node = QueryNode::Select {
            source: self.node,
            items,
        };
        Query::with_row(Arc::new(node), row)
    }
}

/// One group: its key and aggregates over its rows.
#[derive(Debug, Clone)]
pub struct Group<R, K> {
    row: R,
    key: K,
}

impl<R, K> Group<R, K> {
    /// The grouping key.
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// `COUNT(*)`.
    #[must_use]
    pub fn count(&self) -> Expr<i64> {
        aggregate(AggregateFunction::Count, None, false)
    }

    /// `COUNT(DISTINCT selector)`.
    #[must_use]
    pub fn count_distinct<T, F>(&self, selector: F) -> Expr<i64>
    where
        T: SqlType,
        F: FnOnce(&R) -> Expr<T>,
    {
        let arg = selector(&self.row).into_node();
        aggregate(AggregateFunction::Count, Some(arg), true)
    }

    /// `SUM(selector)`.
    #[must_use]
    pub fn sum<T, F>(&self, selector: F) -> Expr<T>
    where
        T: Numeric,
        F: FnOnce(&R) -> Expr<T>,
    {
        let arg = selector(&self.row).into_node();
        aggregate(AggregateFunction::Sum, Some(arg), false)
    }

    /// `AVG(selector)` as a decimal. Integer arguments are cast first so
    /// every dialect averages without truncation.
    #[must_use]
    pub fn avg<T, F>(&self, selector: F) -> Expr<Decimal>
    where
        T: Numeric,
        F: FnOnce(&R) -> Expr<T>,
    {
        let arg = avg_argument(&selector(&self.row));
        aggregate(AggregateFunction::Avg, Some(arg), false)
    }

    /// `MIN(selector)`.
    #[must_use]
    pub fn min<T, F>(&self, selector: F) -> Expr<T>
    where
        T: SqlType,
        F: FnOnce(&R) -> Expr<T>,
    {
        let arg = selector(&self.row).into_node();
        aggregate(AggregateFunction::Min, Some(arg), false)
    }

    /// `MAX(selector)`.
    #[must_use]
    pub fn max<T, F>(&self, selector: F) -> Expr<T>
    where
        T: SqlType,
        F: FnOnce(&R) -> Expr<T>,
    {
        let arg = selector(&self.row).into_node();
        aggregate(AggregateFunction::Max, Some(arg), false)
    }
}

fn aggregate<T>(func: AggregateFunction, arg: Option<ExprNode>, distinct: bool) -> Expr<T> {
    Expr::from_node(ExprNode::Aggregate {
        func,
        arg: arg.map(Box::new),
        distinct,
    })
}

pub(super) fn avg_argument<T: SqlType>(expr: &Expr<T>) -> ExprNode {
    if T::KIND == SqlKind::Int {
        ExprNode::Cast {
            expr: Box::new(expr.node().clone()),
            target: SqlKind::Decimal,
        }
    } else {
        expr.node().clone()
    }
}
