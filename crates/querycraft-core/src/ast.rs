//! Lowered SQL statement AST.
//!
//! The optimizer flattens a clause chain into these types; the compiler
//! renders them. Expressions are the untyped [`ExprNode`]s of the query.

use crate::expr::ExprNode;
use crate::symbolic::ScopeId;
use crate::types::SqlKind;

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ORDER BY clause entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// The expression to order by.
    pub expr: ExprNode,
    /// The direction (ASC or DESC).
    pub direction: OrderDirection,
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
}

impl JoinType {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// Set operators combining two queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    /// UNION (distinct rows).
    Union,
    /// UNION ALL.
    UnionAll,
    /// INTERSECT.
    Intersect,
    /// EXCEPT.
    Except,
}

impl SetOperator {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// The type of join.
    pub join_type: JoinType,
    /// The joined table.
    pub table: TableRef,
    /// The join condition.
    pub on: ExprNode,
}

/// Alias of a derived table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedAlias {
    /// Generated alias, rendered `t0`, `t1`, ...
    Generated(ScopeId),
    /// Fixed name (unfused filters re-alias to the table name).
    Named(String),
}

/// A table reference in the FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// A base table.
    Table {
        /// Table name.
        name: String,
        /// Alias.
        alias: Option<String>,
    },
    /// A derived table.
    Derived {
        /// The subquery.
        query: Box<QueryExpr>,
        /// Alias (required for derived tables).
        alias: DerivedAlias,
    },
    /// A joined table.
    Join {
        /// Left side of the join.
        left: Box<TableRef>,
        /// Join clause.
        join: Box<JoinClause>,
    },
}

/// A column in the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    /// The expression.
    pub expr: ExprNode,
    /// Result family.
    pub kind: SqlKind,
    /// Whether the column may be NULL.
    pub nullable: bool,
    /// Column alias (`AS c0`).
    pub alias: Option<String>,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    /// DISTINCT flag.
    pub distinct: bool,
    /// Selected columns.
    pub columns: Vec<SelectColumn>,
    /// FROM clause.
    pub from: Option<TableRef>,
    /// WHERE clause.
    pub where_clause: Option<ExprNode>,
    /// GROUP BY clause.
    pub group_by: Vec<ExprNode>,
    /// HAVING clause.
    pub having: Option<ExprNode>,
    /// ORDER BY clause.
    pub order_by: Vec<OrderBy>,
    /// Row limit.
    pub limit: Option<u64>,
    /// Rows skipped.
    pub offset: Option<u64>,
}

impl SelectStatement {
    /// Returns true if the statement has a GROUP BY clause.
    #[must_use]
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }

    /// Returns true if LIMIT or OFFSET is set.
    #[must_use]
    pub const fn is_limited(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }
}

/// A query expression: a SELECT or a compound of two query expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    /// A single SELECT.
    Select(Box<SelectStatement>),
    /// `left op right`.
    Compound {
        /// Left operand.
        left: Box<QueryExpr>,
        /// Set operator.
        op: SetOperator,
        /// Right operand.
        right: Box<QueryExpr>,
    },
}

impl QueryExpr {
    /// The result columns, taken from the leftmost SELECT.
    #[must_use]
    pub fn columns(&self) -> &[SelectColumn] {
        match self {
            Self::Select(stmt) => &stmt.columns,
            Self::Compound { left, .. } => left.columns(),
        }
    }

    /// Applies `f` to every SELECT member.
    pub fn for_each_select(&mut self, f: &mut dyn FnMut(&mut SelectStatement)) {
        match self {
            Self::Select(stmt) => f(stmt),
            Self::Compound { left, right, .. } => {
                left.for_each_select(f);
                right.for_each_select(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_spelling() {
        assert_eq!(SetOperator::UnionAll.as_str(), "UNION ALL");
        assert_eq!(JoinType::Left.as_str(), "LEFT JOIN");
        assert_eq!(OrderDirection::default().as_str(), "ASC");
    }

    #[test]
    fn test_compound_columns_come_from_left() {
        let column = |kind| SelectColumn {
            expr: ExprNode::Literal(crate::value::SqlValue::Null),
            kind,
            nullable: true,
            alias: None,
        };
        let left = SelectStatement {
            columns: vec![column(SqlKind::Int)],
            ..SelectStatement::default()
        };
        let right = SelectStatement {
            columns: vec![column(SqlKind::Text)],
            ..SelectStatement::default()
        };
        let compound = QueryExpr::Compound {
            left: Box::new(QueryExpr::Select(Box::new(left))),
            op: SetOperator::Union,
            right: Box::new(QueryExpr::Select(Box::new(right))),
        };
        assert_eq!(compound.columns()[0].kind, SqlKind::Int);
    }
}
