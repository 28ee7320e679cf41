//! Table and column definitions.
//!
//! A [`Table`] knows its name, its ordered column descriptors, and how to
//! build the synthetic [`Row`] that selectors and predicates receive. Tables
//! are defined either with `#[derive(Table)]` on a struct (named row fields)
//! or with a [`TableDef`] over a tuple schema (positional row fields).

use std::marker::PhantomData;

use crate::expr::Expr;
use crate::symbolic::Row;
use crate::types::{SqlKind, SqlType};

/// Describes one column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Zero-based position in the table.
    pub position: usize,
    /// SQL column name.
    pub name: String,
    /// Type family.
    pub kind: SqlKind,
    /// Whether the column accepts NULL.
    pub nullable: bool,
}

impl ColumnDef {
    /// Describes a column whose Rust type is `T`.
    #[must_use]
    pub fn of<T: SqlType>(position: usize, name: &str) -> Self {
        Self {
            position,
            name: String::from(name),
            kind: T::KIND,
            nullable: T::NULLABLE,
        }
    }
}

/// Trait for table metadata.
///
/// Implemented by the types generated from `#[derive(Table)]` and by
/// [`TableDef`].
pub trait Table {
    /// The row of column references handed to selectors.
    type Row: Row;

    /// The SQL table name.
    fn name(&self) -> &str;

    /// Column descriptors in declaration order.
    fn columns(&self) -> Vec<ColumnDef>;

    /// Builds a row whose columns are qualified by `qualifier` (the table
    /// name, or an alias for self-joins).
    fn row(&self, qualifier: &str) -> Self::Row;
}

/// A tuple of column types usable as a [`TableDef`] schema.
pub trait Schema {
    /// Tuple of typed column expressions.
    type Row: Row;
    /// Fixed-size array of column names; its length is the tuple's arity.
    type Names: AsRef<[&'static str]> + Clone;

    /// Builds the row for `names` qualified by `qualifier`.
    fn row(qualifier: &str, names: &Self::Names) -> Self::Row;

    /// Column descriptors for `names`.
    fn columns(names: &Self::Names) -> Vec<ColumnDef>;
}

macro_rules! impl_schema_tuple {
    ($len:literal; $($idx:tt: $t:ident),+) => {
        impl<$($t: SqlType),+> Schema for ($($t,)+) {
            type Row = ($(Expr<$t>,)+);
            type Names = [&'static str; $len];

            fn row(qualifier: &str, names: &Self::Names) -> Self::Row {
                ($(Expr::<$t>::column(qualifier, names[$idx]),)+)
            }

            fn columns(names: &Self::Names) -> Vec<ColumnDef> {
                vec![$(ColumnDef::of::<$t>($idx, names[$idx])),+]
            }
        }
    };
}

impl_schema_tuple!(1; 0: A);
impl_schema_tuple!(2; 0: A, 1: B);
impl_schema_tuple!(3; 0: A, 1: B, 2: C);
impl_schema_tuple!(4; 0: A, 1: B, 2: C, 3: D);
impl_schema_tuple!(5; 0: A, 1: B, 2: C, 3: D, 4: E);
impl_schema_tuple!(6; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F);
impl_schema_tuple!(7; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G);
impl_schema_tuple!(8; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H);
impl_schema_tuple!(9; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I);
impl_schema_tuple!(10; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I, 9: J);
impl_schema_tuple!(11; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I, 9: J, 10: K);
impl_schema_tuple!(12; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I, 9: J, 10: K, 11: L);

/// A table defined at run time over a tuple schema.
///
/// The arity is fixed by the schema type: a `TableDef<(i64, String)>` takes
/// exactly two column names and its rows are `(Expr<i64>, Expr<String>)`.
///
/// ```
/// use querycraft_core::schema::{Table, TableDef};
///
/// let customers = TableDef::<(i64, i64, String)>::new("customers", ["Id", "Age", "Name"]);
/// let row = customers.row("customers");
/// let adult = row.1.gt_eq(18);
/// # let _ = adult;
/// ```
#[derive(Debug, Clone)]
pub struct TableDef<S: Schema> {
    name: String,
    names: S::Names,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> TableDef<S> {
    /// Defines a table with one name per schema column.
    #[must_use]
    pub fn new(name: &str, columns: S::Names) -> Self {
        Self {
            name: String::from(name),
            names: columns,
            _schema: PhantomData,
        }
    }
}

impl<S: Schema> Table for TableDef<S> {
    type Row = S::Row;

    fn name(&self) -> &str {
        &self.name
    }

    fn columns(&self) -> Vec<ColumnDef> {
        S::columns(&self.names)
    }

    fn row(&self, qualifier: &str) -> Self::Row {
        S::row(qualifier, &self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprNode;

    #[test]
    fn test_table_def_columns() {
        let orders = TableDef::<(i64, i64, Option<String>)>::new(
            "orders",
            ["Id", "CustomerId", "Note"],
        );
        let columns = orders.columns();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[2].name, "Note");
        assert_eq!(columns[2].kind, SqlKind::Text);
        assert!(columns[2].nullable);
        assert_eq!(columns[1].position, 1);
    }

    #[test]
    fn test_table_def_row_is_qualified() {
        let orders = TableDef::<(i64, i64)>::new("orders", ["Id", "CustomerId"]);
        let row = orders.row("o");
        assert_eq!(
            row.1.node(),
            &ExprNode::Column {
                table: Some(String::from("o")),
                name: String::from("CustomerId"),
                null_extended: false,
            }
        );
    }
}
