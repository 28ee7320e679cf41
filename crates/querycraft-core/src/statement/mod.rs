//! Mutating statements: INSERT, UPDATE and DELETE.
//!
//! Builders follow the typestate pattern: a statement can only be compiled
//! once it is complete (an INSERT needs values or a source query, an UPDATE
//! needs at least one assignment). Targets are chosen with selectors over
//! the table row, values are ordinary typed expressions.

mod delete;
mod insert;
mod update;

use std::sync::Arc;

pub use delete::Delete;
pub use insert::{HasQuery, HasValues, Insert, NoValues};
pub use update::{HasSet, NoSet, Update};

use crate::expr::ExprNode;
use crate::query::QueryNode;
use crate::schema::Table;
use crate::symbolic::Projected;

/// A lowered mutating statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// INSERT.
    Insert(InsertStatement),
    /// UPDATE.
    Update(UpdateStatement),
    /// DELETE.
    Delete(DeleteStatement),
}

/// The target table of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTable {
    /// Table name.
    pub name: String,
    /// Names of the table's columns.
    pub columns: Vec<String>,
}

impl TargetTable {
    fn of<T: Table>(table: &T) -> Self {
        Self {
            name: String::from(table.name()),
            columns: table.columns().into_iter().map(|c| c.name).collect(),
        }
    }
}

/// Rows inserted by an INSERT.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// `VALUES (...)`, one expression per target column.
    Values(Vec<ExprNode>),
    /// `SELECT ...` producing one column per target column.
    Query(Arc<QueryNode>),
}

/// `INSERT INTO table (targets) source`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table.
    pub table: TargetTable,
    /// Target columns, with their kinds.
    pub targets: Vec<Projected>,
    /// Inserted rows.
    pub source: InsertSource,
}

/// One `SET target = value` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Column reference selected from the table row.
    pub target: ExprNode,
    /// New value.
    pub value: ExprNode,
}

/// `UPDATE table SET ... [WHERE ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table.
    pub table: TargetTable,
    /// Assignments in call order.
    pub assignments: Vec<Assignment>,
    /// Filters, ANDed in call order.
    pub predicates: Vec<ExprNode>,
}

/// `DELETE FROM table [WHERE ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table.
    pub table: TargetTable,
    /// Filters, ANDed in call order.
    pub predicates: Vec<ExprNode>,
}
