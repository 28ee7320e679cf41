//! Symbolic evaluation of selectors and predicates.
//!
//! Query builders never inspect closures. They call them once, at build
//! time, with a synthetic [`Row`] whose leaves are column references; the
//! operators in [`crate::expr`] turn the call into an expression tree.
//!
//! When a query crosses a subquery boundary, its row is *rebound*: every leaf
//! is replaced with a reference into the derived table that boundary
//! introduces. Boundaries are identified by [`ScopeId`]s minted from a
//! process-wide counter; the compiler renames them `t0`, `t1`, ... in the
//! order it meets them, so the counter never shows up in SQL.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::expr::{AnyExpr, Expr, ExprNode};
use crate::types::{SqlKind, SqlType};

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(0);

/// Identity of a derived table introduced by the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Mints a new, process-unique scope.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_SCOPE.fetch_add(1, Ordering::Relaxed))
    }
}

/// One column of a row: the expression with its kind and nullability.
#[derive(Debug, Clone, PartialEq)]
pub struct Projected {
    /// Column expression.
    pub expr: ExprNode,
    /// Result family.
    pub kind: SqlKind,
    /// Whether the column may be NULL.
    pub nullable: bool,
}

impl Projected {
    /// Describes a typed expression.
    #[must_use]
    pub fn of<T: SqlType>(expr: &Expr<T>) -> Self {
        Self {
            expr: expr.node().clone(),
            kind: T::KIND,
            nullable: T::NULLABLE || expr.node().is_null_extended(),
        }
    }
}

/// A row of typed expressions handed to selectors and predicates.
///
/// Implemented for [`Expr<T>`], [`AnyExpr`], `()`, tuples of rows up to
/// twelve elements, `Vec<R>`, and the row structs generated by
/// `#[derive(Table)]`.
pub trait Row: Clone {
    /// Appends this row's columns in projection order.
    fn collect(&self, out: &mut Vec<Projected>);

    /// Rebuilds the row with every column replaced by `f`'s result.
    ///
    /// Calls `f` once per column in projection order; the result keeps the
    /// row's shape and types.
    #[must_use]
    fn map_columns(&self, f: &mut dyn FnMut(&Projected) -> ExprNode) -> Self;

    /// The columns as a vector.
    fn items(&self) -> Vec<Projected> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    /// Rebinds the row into the derived table `scope`.
    #[must_use]
    fn rebind(&self, scope: ScopeId) -> Self {
        let mut binder = Rebinder::new(scope);
        self.map_columns(&mut |p| binder.next(p))
    }

    /// Marks every column as possibly null-extended by an outer join.
    #[must_use]
    fn null_extend(&self) -> Self {
        self.map_columns(&mut |p| p.expr.null_extend())
    }
}

/// Produces `scope.c0`, `scope.c1`, ... references in order.
#[derive(Debug)]
pub struct Rebinder {
    scope: ScopeId,
    next: usize,
}

impl Rebinder {
    /// Starts numbering columns of `scope` from zero.
    #[must_use]
    pub const fn new(scope: ScopeId) -> Self {
        Self { scope, next: 0 }
    }

    /// Column alias for position `index` inside a derived table.
    #[must_use]
    pub fn column_name(index: usize) -> String {
        format!("c{index}")
    }

    /// Reference to the next column.
    pub fn next(&mut self, column: &Projected) -> ExprNode {
        let name = Self::column_name(self.next);
        self.next += 1;
        ExprNode::Projection {
            scope: self.scope,
            name,
            null_extended: column.nullable,
        }
    }
}

impl<T: SqlType> Row for Expr<T> {
    fn collect(&self, out: &mut Vec<Projected>) {
        out.push(Projected::of(self));
    }

    fn map_columns(&self, f: &mut dyn FnMut(&Projected) -> ExprNode) -> Self {
        Self::from_node(f(&Projected::of(self)))
    }
}

fn any_column(expr: &AnyExpr) -> Projected {
    Projected {
        expr: expr.node.clone(),
        kind: expr.kind,
        nullable: expr.nullable || expr.node.is_null_extended(),
    }
}

impl Row for AnyExpr {
    fn collect(&self, out: &mut Vec<Projected>) {
        out.push(any_column(self));
    }

    fn map_columns(&self, f: &mut dyn FnMut(&Projected) -> ExprNode) -> Self {
        let column = any_column(self);
        Self {
            node: f(&column),
            kind: self.kind,
            nullable: column.nullable,
        }
    }
}

impl Row for () {
    fn collect(&self, _out: &mut Vec<Projected>) {}

    fn map_columns(&self, _f: &mut dyn FnMut(&Projected) -> ExprNode) -> Self {}
}

impl<R: Row> Row for Vec<R> {
    fn collect(&self, out: &mut Vec<Projected>) {
        for row in self {
            row.collect(out);
        }
    }

    fn map_columns(&self, f: &mut dyn FnMut(&Projected) -> ExprNode) -> Self {
        self.iter().map(|row| row.map_columns(f)).collect()
    }
}

macro_rules! impl_row_tuple {
    ($($idx:tt: $r:ident),+) => {
        impl<$($r: Row),+> Row for ($($r,)+) {
            fn collect(&self, out: &mut Vec<Projected>) {
                $(self.$idx.collect(out);)+
            }

            fn map_columns(&self, f: &mut dyn FnMut(&Projected) -> ExprNode) -> Self {
                ($(self.$idx.map_columns(f),)+)
            }
        }
    };
}

impl_row_tuple!(0: R0);
impl_row_tuple!(0: R0, 1: R1);
impl_row_tuple!(0: R0, 1: R1, 2: R2);
impl_row_tuple!(0: R0, 1: R1, 2: R2, 3: R3);
impl_row_tuple!(0: R0, 1: R1, 2: R2, 3: R3, 4: R4);
impl_row_tuple!(0: R0, 1: R1, 2: R2, 3: R3, 4: R4, 5: R5);
impl_row_tuple!(0: R0, 1: R1, 2: R2, 3: R3, 4: R4, 5: R5, 6: R6);
impl_row_tuple!(0: R0, 1: R1, 2: R2, 3: R3, 4: R4, 5: R5, 6: R6, 7: R7);
impl_row_tuple!(0: R0, 1: R1, 2: R2, 3: R3, 4: R4, 5: R5, 6: R6, 7: R7, 8: R8);
impl_row_tuple!(0: R0, 1: R1, 2: R2, 3: R3, 4: R4, 5: R5, 6: R6, 7: R7, 8: R8, 9: R9);
impl_row_tuple!(0: R0, 1: R1, 2: R2, 3: R3, 4: R4, 5: R5, 6: R6, 7: R7, 8: R8, 9: R9, 10: R10);
impl_row_tuple!(0: R0, 1: R1, 2: R2, 3: R3, 4: R4, 5: R5, 6: R6, 7: R7, 8: R8, 9: R9, 10: R10, 11: R11);

/// Evaluates a predicate closure against `row`.
pub(crate) fn capture_predicate<R, F>(row: &R, predicate: F) -> ExprNode
where
    F: FnOnce(&R) -> Expr<bool>,
{
    predicate(row).into_node()
}

/// Evaluates a selector closure against `row`.
pub(crate) fn capture_projection<R, S, F>(row: &R, selector: F) -> (S, Vec<Projected>)
where
    S: Row,
    F: FnOnce(&R) -> S,
{
    let selected = selector(row);
    let items = selected.items();
    (selected, items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_are_unique() {
        assert_ne!(ScopeId::fresh(), ScopeId::fresh());
    }

    #[test]
    fn test_tuple_row_collects_in_order() {
        let row = (
            Expr::<i64>::column("customers", "Id"),
            Expr::<String>::column("customers", "Name"),
        );
        let items = row.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, SqlKind::Int);
        assert_eq!(items[1].kind, SqlKind::Text);
    }

    #[test]
    fn test_rebind_numbers_columns() {
        let scope = ScopeId::fresh();
        let row = (
            Expr::<i64>::column("customers", "Id"),
            (Expr::<Option<String>>::column("customers", "Note"),),
        );
        let rebound = row.rebind(scope);
        assert_eq!(
            rebound.1 .0.node(),
            &ExprNode::Projection {
                scope,
                name: String::from("c1"),
                null_extended: true,
            }
        );
        assert_eq!(
            rebound.0.node(),
            &ExprNode::Projection {
                scope,
                name: String::from("c0"),
                null_extended: false,
            }
        );
    }

    #[test]
    fn test_null_extend_marks_columns_nullable() {
        let row = Expr::<i64>::column("orders", "Id").null_extend();
        assert!(row.items()[0].nullable);
    }

    #[test]
    fn test_unit_row_is_empty() {
        assert!(().items().is_empty());
    }
}
