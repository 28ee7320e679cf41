//! Type-safe UPDATE builder.

use std::marker::PhantomData;

use super::{Assignment, Statement, TargetTable, UpdateStatement};
use crate::expr::{Expr, ExprNode, IntoExpr};
use crate::schema::Table;
use crate::symbolic::capture_predicate;
use crate::types::SqlType;

// Typestate markers

/// Marker: no SET clause yet.
pub struct NoSet;
/// Marker: at least one assignment.
pub struct HasSet;

/// An UPDATE statement under construction.
///
/// ```
/// use querycraft_core::prelude::*;
///
/// let customers = TableDef::<(i64, i64, String)>::new("customers", ["Id", "Age", "Name"]);
/// let update = Update::table(&customers)
///     .set(|c| &c.1, |c| &c.1 + 1)
///     .filter(|c| c.1.gt_eq(18) & c.2.not_eq("Admin"));
///
/// let sql = update.to_postgres().unwrap();
/// assert_eq!(
///     sql.sql,
///     "UPDATE customers SET customers.Age = (customers.Age + :p0) \
///      WHERE (customers.Age >= :p1) AND (customers.Name != :p2)"
/// );
/// ```
pub struct Update<T: Table, S = NoSet> {
    table: TargetTable,
    row: T::Row,
    assignments: Vec<Assignment>,
    predicates: Vec<ExprNode>,
    _state: PhantomData<S>,
}

impl<T: Table> Update<T, NoSet> {
    /// Starts an UPDATE of `table`.
    #[must_use]
    pub fn table(table: &T) -> Self {
        Self {
            table: TargetTable::of(table),
            row: table.row(table.name()),
            assignments: Vec::new(),
            predicates: Vec::new(),
            _state: PhantomData,
        }
    }
}

impl<T: Table, S> Update<T, S> {
    /// `WHERE predicate`. Consecutive filters are ANDed together.
    #[must_use]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: FnOnce(&T::Row) -> Expr<bool>,
    {
        self.predicates.push(capture_predicate(&self.row, predicate));
        self
    }

    /// `SET column = value(row)`. The value may refer to the row's current
    /// columns.
    #[must_use]
    pub fn set<U, C, V, E>(mut self, column: C, value: V) -> Update<T, HasSet>
    where
        U: SqlType,
        C: FnOnce(&T::Row) -> &Expr<U>,
        V: FnOnce(&T::Row) -> E,
        E: IntoExpr<U>,
    {
        let target = column(&self.row).node().clone();
        let value = value(&self.row).into_expr().into_node();
        self.assignments.push(Assignment { target, value });
        Update {
            table: self.table,
            row: self.row,
            assignments: self.assignments,
            predicates: self.predicates,
            _state: PhantomData,
        }
    }

    /// `SET column = value` with a constant value.
    #[must_use]
    pub fn set_value<U, C, V>(self, column: C, value: V) -> Update<T, HasSet>
    where
        U: SqlType,
        C: FnOnce(&T::Row) -> &Expr<U>,
        V: IntoExpr<U>,
    {
        self.set(column, |_| value)
    }
}

impl<T: Table> Update<T, HasSet> {
    pub(crate) fn to_statement(&self) -> Statement {
        Statement::Update(UpdateStatement {
            table: self.table.clone(),
            assignments: self.assignments.clone(),
            predicates: self.predicates.clone(),
        })
    }
}
