//! Type-safe INSERT builder.

use std::sync::Arc;

use super::{InsertSource, InsertStatement, Statement, TargetTable};
use crate::expr::{Expr, ExprNode, IntoExpr};
use crate::query::{Query, QueryNode};
use crate::schema::Table;
use crate::symbolic::{capture_projection, Projected, Row};
use crate::types::SqlType;

// Typestate markers

/// Marker: no values yet.
pub struct NoValues;
/// Marker: at least one column value.
pub struct HasValues(Vec<ExprNode>);
/// Marker: rows come from a query.
pub struct HasQuery(Arc<QueryNode>);

/// An INSERT statement under construction.
///
/// ```
/// use querycraft_core::prelude::*;
///
/// let customers = TableDef::<(i64, i64, String)>::new("customers", ["Id", "Age", "Name"]);
/// let insert = Insert::into(&customers)
///     .value(|c| &c.0, 1)
///     .value(|c| &c.1, 25)
///     .value(|c| &c.2, "John Doe");
///
/// let sql = insert.to_sqlite().unwrap();
/// assert_eq!(sql.sql, "INSERT INTO customers (Id, Age, Name) VALUES (:p0, :p1, :p2)");
/// ```
pub struct Insert<T: Table, S = NoValues> {
    table: TargetTable,
    row: T::Row,
    targets: Vec<Projected>,
    state: S,
}

impl<T: Table> Insert<T, NoValues> {
    /// Starts an INSERT into `table`.
    #[must_use]
    pub fn into(table: &T) -> Self {
        Self {
            table: TargetTable::of(table),
            row: table.row(table.name()),
            targets: Vec::new(),
            state: NoValues,
        }
    }

    /// `INSERT INTO table (columns) SELECT ...`.
    ///
    /// `columns` selects the target columns; the query must produce a row of
    /// the same shape, which is checked when the statement is compiled.
    #[must_use]
    pub fn select<K, F, R, O>(self, columns: F, query: &Query<R, O>) -> Insert<T, HasQuery>
    where
        K: Row,
        F: FnOnce(&T::Row) -> K,
        R: Row,
    {
        let (_, targets) = capture_projection(&self.row, columns);
        Insert {
            table: self.table,
            row: self.row,
            targets,
            state: HasQuery(query.node().clone()),
        }
    }
}

// Transition: NoValues -> HasValues
impl<T: Table> Insert<T, NoValues> {
    /// Sets the value of one column.
    #[must_use]
    pub fn value<U, F, V>(self, column: F, value: V) -> Insert<T, HasValues>
    where
        U: SqlType,
        F: FnOnce(&T::Row) -> &Expr<U>,
        V: IntoExpr<U>,
    {
        Insert {
            table: self.table,
            row: self.row,
            targets: self.targets,
            state: HasValues(Vec::new()),
        }
        .value(column, value)
    }
}

impl<T: Table> Insert<T, HasValues> {
    /// Sets the value of another column.
    #[must_use]
    pub fn value<U, F, V>(mut self, column: F, value: V) -> Self
    where
        U: SqlType,
        F: FnOnce(&T::Row) -> &Expr<U>,
        V: IntoExpr<U>,
    {
        let target = Projected::of(column(&self.row));
        self.targets.push(target);
        self.state.0.push(value.into_expr().into_node());
        self
    }

    pub(crate) fn to_statement(&self) -> Statement {
        Statement::Insert(InsertStatement {
            table: self.table.clone(),
            targets: self.targets.clone(),
            source: InsertSource::Values(self.state.0.clone()),
        })
    }
}

impl<T: Table> Insert<T, HasQuery> {
    pub(crate) fn to_statement(&self) -> Statement {
        Statement::Insert(InsertStatement {
            table: self.table.clone(),
            targets: self.targets.clone(),
            source: InsertSource::Query(self.state.0.clone()),
        })
    }
}
