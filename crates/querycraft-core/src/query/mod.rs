//! Composable query pipelines.
//!
//! A [`Query<R, O>`] pairs a clause chain with the row `R` that the next
//! selector or predicate receives. Every method returns a new query; the
//! chain is shared through `Arc`s and never mutated.
//!
//! # Example
//!
//! ```
//! use querycraft_core::prelude::*;
//!
//! let customers = TableDef::<(i64, i64, String)>::new("customers", ["Id", "Age", "Name"]);
//!
//! let adults = Query::from(&customers)
//!     .filter(|c| c.1.gt(18))
//!     .order_by(|c| c.2.clone())
//!     .select(|c| (c.0.clone(), c.2.clone()));
//!
//! let sql = adults.to_postgres().unwrap();
//! assert_eq!(
//!     sql.sql,
//!     "SELECT customers.Id, customers.Name FROM customers WHERE customers.Age > :p0 ORDER BY customers.Name ASC"
//! );
//! ```

mod group;
mod join;
mod node;

use std::marker::PhantomData;
use std::sync::Arc;

use rust_decimal::Decimal;

pub use group::{Group, Grouped};
pub use node::{JoinCondition, OrderKey, QueryNode, TableSource};

use crate::ast::{OrderDirection, SetOperator};
use crate::error::Shape;
use crate::expr::{AggregateFunction, Expr, ExprNode};
use crate::schema::Table;
use crate::symbolic::{capture_predicate, capture_projection, Projected, Row, ScopeId};
use crate::types::{Numeric, SqlType};

/// Marker: the query has no ordering that `then_by` could extend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unordered;

/// Marker: the query ends with an ordering clause.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ordered;

/// A query over rows of type `R`.
#[derive(Debug, Clone)]
pub struct Query<R, O = Unordered> {
    node: Arc<QueryNode>,
    row: R,
    _order: PhantomData<O>,
}

impl<R: Row> Query<R, Unordered> {
    /// `FROM table`.
    pub fn from<T: Table<Row = R>>(table: &T) -> Self {
        Self::from_source(table, None)
    }

    /// `FROM table AS alias`, for self-joins.
    pub fn from_as<T: Table<Row = R>>(table: &T, alias: &str) -> Self {
        Self::from_source(table, Some(String::from(alias)))
    }

    fn from_source<T: Table<Row = R>>(table: &T, alias: Option<String>) -> Self {
        let source = TableSource {
            name: String::from(table.name()),
            alias,
        };
        let row = table.row(source.qualifier());
        let items = row.items();
        Self::with_row(Arc::new(QueryNode::From { table: source, items }), row)
    }
}

impl<R: Row, O> Query<R, O> {
    pub(crate) const fn with_row(node: Arc<QueryNode>, row: R) -> Self {
        Self {
            node,
            row,
            _order: PhantomData,
        }
    }

    /// The clause chain.
    #[must_use]
    pub const fn node(&self) -> &Arc<QueryNode> {
        &self.node
    }

    /// The row the next clause receives.
    #[must_use]
    pub const fn row(&self) -> &R {
        &self.row
    }

    /// Column kinds of the result.
    #[must_use]
    pub fn shape(&self) -> Shape {
        Shape(self.row.items().iter().map(|p| p.kind).collect())
    }

    /// Result columns with kind and nullability.
    #[must_use]
    pub fn columns(&self) -> Vec<Projected> {
        self.row.items()
    }

    /// `WHERE predicate`. Consecutive filters are ANDed together.
    #[must_use]
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: FnOnce(&R) -> Expr<bool>,
    {
        let predicate = capture_predicate(&self.row, predicate);
        let node = QueryNode::Where {
            source: self.node,
            predicate,
        };
        Self::with_row(Arc::new(node), self.row)
    }

    /// Projects each row through `selector`.
    ///
    /// The selected expressions are substituted into later clauses, so
    /// filtering or ordering after a `select` stays in the same SELECT.
    #[must_use]
    pub fn select<S, F>(self, selector: F) -> Query<S, O>
    where
        S: Row,
        F: FnOnce(&R) -> S,
    {
        let (row, items) = capture_projection(&self.row, selector);
        let node = QueryNode::Select {
            source: self.node,
            items,
        };
        Query::with_row(Arc::new(node), row)
    }

    fn ordered<K, F>(self, key: F, direction: OrderDirection) -> Query<R, Ordered>
    where
        K: Row,
        F: FnOnce(&R) -> K,
    {
        let keys = order_keys(&self.row, key, direction);
        let node = QueryNode::OrderBy {
            source: self.node,
            keys,
        };
        Query::with_row(Arc::new(node), self.row)
    }

    /// `ORDER BY key ASC`. Replaces any earlier ordering.
    #[must_use]
    pub fn order_by<K, F>(self, key: F) -> Query<R, Ordered>
    where
        K: Row,
        F: FnOnce(&R) -> K,
    {
        self.ordered(key, OrderDirection::Asc)
    }

    /// `ORDER BY key DESC`. Replaces any earlier ordering.
    #[must_use]
    pub fn order_by_desc<K, F>(self, key: F) -> Query<R, Ordered>
    where
        K: Row,
        F: FnOnce(&R) -> K,
    {
        self.ordered(key, OrderDirection::Desc)
    }

    /// `GROUP BY key`.
    ///
    /// Regrouping an already grouped query groups its result as a subquery.
    #[must_use]
    pub fn group_by<K, F>(self, key: F) -> Grouped<R, K>
    where
        K: Row,
        F: FnOnce(&R) -> K,
    {
        let (node, row) = self.ungrouped();
        let (key, keys) = capture_projection(&row, key);
        let node = QueryNode::GroupBy { source: node, keys };
        Grouped::new(Arc::new(node), row, key)
    }

    /// `SELECT DISTINCT`.
    #[must_use]
    pub fn distinct(self) -> Query<R, Unordered> {
        let scope = ScopeId::fresh();
        let row = self.row.rebind(scope);
        let node = QueryNode::Distinct {
            source: self.node,
            scope,
        };
        Query::with_row(Arc::new(node), row)
    }

    /// Restricts the result to a row window.
    #[must_use]
    pub fn limit_offset(self, limit: Option<u64>, offset: Option<u64>) -> Query<R, Unordered> {
        let scope = ScopeId::fresh();
        let row = self.row.rebind(scope);
        let node = QueryNode::LimitOffset {
            source: self.node,
            limit,
            offset,
            scope,
        };
        Query::with_row(Arc::new(node), row)
    }

    /// At most `n` rows.
    #[must_use]
    pub fn take(self, n: u64) -> Query<R, Unordered> {
        self.limit_offset(Some(n), None)
    }

    /// Skips the first `n` rows.
    #[must_use]
    pub fn skip(self, n: u64) -> Query<R, Unordered> {
        self.limit_offset(None, Some(n))
    }

    fn set_op<O2>(self, other: Query<R, O2>, op: SetOperator) -> Query<R, Unordered> {
        let scope = ScopeId::fresh();
        let row = self.row.rebind(scope);
        let node = QueryNode::SetOp {
            left: self.node,
            right: other.node,
            op,
            scope,
        };
        Query::with_row(Arc::new(node), row)
    }

    /// `UNION` (distinct rows).
    #[must_use]
    pub fn union<O2>(self, other: Query<R, O2>) -> Query<R, Unordered> {
        self.set_op(other, SetOperator::Union)
    }

    /// `UNION ALL`.
    #[must_use]
    pub fn union_all<O2>(self, other: Query<R, O2>) -> Query<R, Unordered> {
        self.set_op(other, SetOperator::UnionAll)
    }

    /// `INTERSECT`.
    #[must_use]
    pub fn intersect<O2>(self, other: Query<R, O2>) -> Query<R, Unordered> {
        self.set_op(other, SetOperator::Intersect)
    }

    /// `EXCEPT`.
    #[must_use]
    pub fn except<O2>(self, other: Query<R, O2>) -> Query<R, Unordered> {
        self.set_op(other, SetOperator::Except)
    }

    /// Forces a subquery boundary: later clauses apply to this query's
    /// result as a derived table.
    #[must_use]
    pub fn as_subquery(self) -> Query<R, Unordered> {
        let (node, row) = derive(self.node, &self.row);
        Query::with_row(node, row)
    }

    /// `(SELECT COUNT(*) FROM ...)`.
    #[must_use]
    pub fn count(&self) -> Expr<i64> {
        let (source, _) = self.ungrouped();
        query_aggregate(AggregateFunction::Count, source, None)
    }

    /// `(SELECT SUM(selector) FROM ...)`; NULL over no rows.
    #[must_use]
    pub fn sum_by<T, F>(&self, selector: F) -> Expr<T::Nullable>
    where
        T: Numeric,
        F: FnOnce(&R) -> Expr<T>,
    {
        self.aggregate_by(AggregateFunction::Sum, selector)
    }

    /// `(SELECT AVG(selector) FROM ...)` as a decimal; NULL over no rows.
    #[must_use]
    pub fn avg_by<T, F>(&self, selector: F) -> Expr<Option<Decimal>>
    where
        T: Numeric,
        F: FnOnce(&R) -> Expr<T>,
    {
        let (source, row) = self.ungrouped();
        let arg = group::avg_argument(&selector(&row));
        query_aggregate(AggregateFunction::Avg, source, Some(arg))
    }

    /// `(SELECT MIN(selector) FROM ...)`; NULL over no rows.
    #[must_use]
    pub fn min_by<T, F>(&self, selector: F) -> Expr<T::Nullable>
    where
        T: SqlType,
        F: FnOnce(&R) -> Expr<T>,
    {
        self.aggregate_by(AggregateFunction::Min, selector)
    }

    /// `(SELECT MAX(selector) FROM ...)`; NULL over no rows.
    #[must_use]
    pub fn max_by<T, F>(&self, selector: F) -> Expr<T::Nullable>
    where
        T: SqlType,
        F: FnOnce(&R) -> Expr<T>,
    {
        self.aggregate_by(AggregateFunction::Max, selector)
    }

    fn aggregate_by<T, F, U>(&self, func: AggregateFunction, selector: F) -> Expr<U>
    where
        T: SqlType,
        U: SqlType,
        F: FnOnce(&R) -> Expr<T>,
    {
        let (source, row) = self.ungrouped();
        let arg = selector(&row).into_node();
        query_aggregate(func, source, Some(arg))
    }

    /// `EXISTS (SELECT ...)`.
    #[must_use]
    pub fn any(&self) -> Expr<bool> {
        Expr::from_node(ExprNode::Exists {
            query: self.node.clone(),
            negated: false,
        })
    }

    /// `NOT EXISTS (SELECT ...)`.
    #[must_use]
    pub fn none(&self) -> Expr<bool> {
        Expr::from_node(ExprNode::Exists {
            query: self.node.clone(),
            negated: true,
        })
    }

    /// The chain and row, behind a derived table if the query is grouped.
    fn ungrouped(&self) -> (Arc<QueryNode>, R) {
        if self.node.is_grouped() {
            derive(self.node.clone(), &self.row)
        } else {
            (self.node.clone(), self.row.clone())
        }
    }
}

impl<R: Row> Query<R, Ordered> {
    fn then_ordered<K, F>(self, key: F, direction: OrderDirection) -> Self
    where
        K: Row,
        F: FnOnce(&R) -> K,
    {
        let keys = order_keys(&self.row, key, direction);
        let node = QueryNode::ThenBy {
            source: self.node,
            keys,
        };
        Self::with_row(Arc::new(node), self.row)
    }

    /// Appends an ascending key to the ordering.
    #[must_use]
    pub fn then_by<K, F>(self, key: F) -> Self
    where
        K: Row,
        F: FnOnce(&R) -> K,
    {
        self.then_ordered(key, OrderDirection::Asc)
    }

    /// Appends a descending key to the ordering.
    #[must_use]
    pub fn then_by_desc<K, F>(self, key: F) -> Self
    where
        K: Row,
        F: FnOnce(&R) -> K,
    {
        self.then_ordered(key, OrderDirection::Desc)
    }
}

impl<T: SqlType, O> Query<Expr<T>, O> {
    /// `(SELECT SUM(column) FROM ...)` over the single projected column.
    #[must_use]
    pub fn sum(&self) -> Expr<T::Nullable>
    where
        T: Numeric,
    {
        self.whole_column(AggregateFunction::Sum)
    }

    /// `(SELECT AVG(column) FROM ...)` as a decimal.
    #[must_use]
    pub fn avg(&self) -> Expr<Option<Decimal>>
    where
        T: Numeric,
    {
        let (source, row) = self.ungrouped();
        let arg = group::avg_argument(&row);
        query_aggregate(AggregateFunction::Avg, source, Some(arg))
    }

    /// `(SELECT MIN(column) FROM ...)`.
    #[must_use]
    pub fn min(&self) -> Expr<T::Nullable> {
        self.whole_column(AggregateFunction::Min)
    }

    /// `(SELECT MAX(column) FROM ...)`.
    #[must_use]
    pub fn max(&self) -> Expr<T::Nullable> {
        self.whole_column(AggregateFunction::Max)
    }

    fn whole_column<U: SqlType>(&self, func: AggregateFunction) -> Expr<U> {
        let (source, _) = self.ungrouped();
        query_aggregate(func, source, None)
    }

    /// The query as a scalar subquery: `(SELECT column FROM ...)`.
    #[must_use]
    pub fn as_scalar(&self) -> Expr<T::Nullable> {
        Expr::from_node(ExprNode::Subquery(self.node.clone()))
    }
}

fn order_keys<R, K, F>(row: &R, key: F, direction: OrderDirection) -> Vec<OrderKey>
where
    K: Row,
    F: FnOnce(&R) -> K,
{
    let (_, items) = capture_projection(row, key);
    items
        .into_iter()
        .map(|p| OrderKey {
            expr: p.expr,
            direction,
        })
        .collect()
}

fn query_aggregate<U: SqlType>(
    func: AggregateFunction,
    source: Arc<QueryNode>,
    arg: Option<ExprNode>,
) -> Expr<U> {
    Expr::from_node(ExprNode::QueryAggregate {
        func,
        kind: U::KIND,
        source,
        arg: arg.map(Box::new),
    })
}

/// Wraps `node` in a derived-table boundary and rebinds `row` into it.
pub(crate) fn derive<R: Row>(node: Arc<QueryNode>, row: &R) -> (Arc<QueryNode>, R) {
    let scope = ScopeId::fresh();
    let row = row.rebind(scope);
    (Arc::new(QueryNode::Derived { source: node, scope }), row)
}
