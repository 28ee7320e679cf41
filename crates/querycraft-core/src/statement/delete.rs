//! DELETE builder.

use super::{DeleteStatement, Statement, TargetTable};
use crate::expr::{Expr, ExprNode};
use crate::schema::Table;
use crate::symbolic::capture_predicate;

/// A DELETE statement. Without filters it deletes every row.
pub struct Delete<T: Table> {
    table: TargetTable,
    row: T::Row,
    predicates: Vec<ExprNode>,
}

impl<T: Table> Delete<T> {
    /// Starts a DELETE from `table`.
    #[must_use]
    pub fn from(table: &T) -> Self {
        Self {
            table: TargetTable::of(table),
            row: table.row(table.name()),
            predicates: Vec::new(),
        }
    }

    /// `WHERE predicate`. Consecutive filters are ANDed together.
    #[must_use]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: FnOnce(&T::Row) -> Expr<bool>,
    {
        self.predicates.push(capture_predicate(&self.row, predicate));
        self
    }

    pub(crate) fn to_statement(&self) -> Statement {
        Statement::Delete(DeleteStatement {
            table: self.table.clone(),
            predicates: self.predicates.clone(),
        })
    }
}
