//! Joins.
//!
//! The right operand of a join must render as a table reference. Plain
//! table queries (FROM plus filters) join directly, with their filters moved
//! into ON; boundaries join as derived tables; anything else is wrapped in
//! one first. A right operand that would bind the same table or scope as
//! the left is wrapped as well, so each side keeps its own alias.

use std::sync::Arc;

use super::{derive, JoinCondition, Query, QueryNode, Unordered};
use crate::ast::JoinType;
use crate::expr::Expr;
use crate::symbolic::{capture_projection, Row};

impl<L: Row, O> Query<L, O> {
    /// `INNER JOIN right ON left_key = right_key`.
    ///
    /// Key rows are compared pairwise, so tuple keys join on several
    /// columns. `result` shapes the joined row.
    #[must_use]
    pub fn join<R, O2, K, S, LK, RK, F>(
        self,
        right: Query<R, O2>,
        left_key: LK,
        right_key: RK,
        result: F,
    ) -> Query<S, Unordered>
    where
        R: Row,
        K: Row,
        S: Row,
        LK: FnOnce(&L) -> K,
        RK: FnOnce(&R) -> K,
        F: FnOnce(&L, &R) -> S,
    {
        self.join_keys(right, JoinType::Inner, left_key, right_key, result)
    }

    /// `LEFT JOIN right ON left_key = right_key`.
    ///
    /// The right row handed to `result` is null-extended: columns built
    /// from it are nullable in the query shape.
    #[must_use]
    pub fn left_join<R, O2, K, S, LK, RK, F>(
        self,
        right: Query<R, O2>,
        left_key: LK,
        right_key: RK,
        result: F,
    ) -> Query<S, Unordered>
    where
        R: Row,
        K: Row,
        S: Row,
        LK: FnOnce(&L) -> K,
        RK: FnOnce(&R) -> K,
        F: FnOnce(&L, &R) -> S,
    {
        self.join_keys(right, JoinType::Left, left_key, right_key, result)
    }

    /// `INNER JOIN right ON predicate`.
    #[must_use]
    pub fn join_on<R, O2, S, P, F>(self, right: Query<R, O2>, on: P, result: F) -> Query<S, Unordered>
    where
        R: Row,
        S: Row,
        P: FnOnce(&L, &R) -> Expr<bool>,
        F: FnOnce(&L, &R) -> S,
    {
        self.join_predicate(right, JoinType::Inner, on, result)
    }

    /// `LEFT JOIN right ON predicate`.
    #[must_use]
    pub fn left_join_on<R, O2, S, P, F>(
        self,
        right: Query<R, O2>,
        on: P,
        result: F,
    ) -> Query<S, Unordered>
    where
        R: Row,
        S: Row,
        P: FnOnce(&L, &R) -> Expr<bool>,
        F: FnOnce(&L, &R) -> S,
    {
        self.join_predicate(right, JoinType::Left, on, result)
    }

    fn join_keys<R, O2, K, S, LK, RK, F>(
        self,
        right: Query<R, O2>,
        join_type: JoinType,
        left_key: LK,
        right_key: RK,
        result: F,
    ) -> Query<S, Unordered>
    where
        R: Row,
        K: Row,
        S: Row,
        LK: FnOnce(&L) -> K,
        RK: FnOnce(&R) -> K,
        F: FnOnce(&L, &R) -> S,
    {
        let (left, left_row) = self.join_left();
        let (right, right_row) = join_right(&left, right);
        let (_, left_keys) = capture_projection(&left_row, left_key);
        let (_, right_keys) = capture_projection(&right_row, right_key);
        let condition = JoinCondition::Keys {
            left: left_keys,
            right: right_keys,
        };
        finish(left, right, join_type, condition, &left_row, &right_row, result)
    }

    fn join_predicate<R, O2, S, P, F>(
        self,
        right: Query<R, O2>,
        join_type: JoinType,
        on: P,
        result: F,
    ) -> Query<S, Unordered>
    where
        R: Row,
        S: Row,
        P: FnOnce(&L, &R) -> Expr<bool>,
        F: FnOnce(&L, &R) -> S,
    {
        let (left, left_row) = self.join_left();
        let (right, right_row) = join_right(&left, right);
        let condition = JoinCondition::Predicate(on(&left_row, &right_row).into_node());
        finish(left, right, join_type, condition, &left_row, &right_row, result)
    }

    fn join_left(self) -> (Arc<QueryNode>, L) {
        if self.node.is_grouped() {
            derive(self.node, &self.row)
        } else {
            (self.node, self.row)
        }
    }
}

fn join_right<R: Row, O>(left: &QueryNode, right: Query<R, O>) -> (Arc<QueryNode>, R) {
    let direct = match (right.node.table_qualifier(), right.node.boundary()) {
        (Some(qualifier), _) => !left.binds_qualifier(qualifier),
        (None, Some(scope)) => !left.binds_scope(scope),
        (None, None) => false,
    };
    if direct {
        (right.node, right.row)
    } else {
        derive(right.node, &right.row)
    }
}

fn finish<L, R, S, F>(
    left: Arc<QueryNode>,
    right: Arc<QueryNode>,
    join_type: JoinType,
    condition: JoinCondition,
    left_row: &L,
    right_row: &R,
    result: F,
) -> Query<S, Unordered>
where
    R: Row,
    S: Row,
    F: FnOnce(&L, &R) -> S,
{
    let right_row = match join_type {
        JoinType::Inner => right_row.clone(),
        JoinType::Left => right_row.null_extend(),
    };
    let (row, items) = capture_projection(&right_row, |r| result(left_row, r));
    let node = QueryNode::Join {
        left,
        right,
        join_type,
        condition,
        items,
    };
    Query::with_row(Arc::new(node), row)
}
