//! Typed scalar expressions.
//!
//! An [`Expr<T>`] is a node of the expression tree tagged with its result
//! type. Operators and comparison methods build new nodes instead of
//! computing values, so an ordinary closure such as
//! `|c| c.age.gt_eq(18) & c.name.not_eq("Admin")` evaluates to a predicate
//! tree the compiler can render.
//!
//! # Example
//!
//! ```
//! use querycraft_core::expr::Expr;
//!
//! let age: Expr<i64> = Expr::column("customers", "Age");
//! let adult = age.gt_eq(18);
//! let next_year = &age + 1;
//! # let _ = (adult, next_year);
//! ```

mod functions;
mod node;
mod ops;

use std::fmt;
use std::marker::PhantomData;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

pub use functions::{new_guid, now};
pub use node::{AggregateFunction, BinaryOp, ExprNode, ScalarFunction, UnaryOp};

use crate::query::Query;
use crate::types::{NotNull, SqlKind, SqlType};
use crate::value::{SqlValue, ToSqlValue};

/// A typed scalar expression.
pub struct Expr<T> {
    node: ExprNode,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.node).finish()
    }
}

impl<T> Expr<T> {
    pub(crate) const fn from_node(node: ExprNode) -> Self {
        Self {
            node,
            _type: PhantomData,
        }
    }

    /// Returns the untyped node.
    #[must_use]
    pub const fn node(&self) -> &ExprNode {
        &self.node
    }

    /// Consumes the expression, returning the untyped node.
    #[must_use]
    pub fn into_node(self) -> ExprNode {
        self.node
    }
}

impl<T: SqlType> Expr<T> {
    /// A qualified column reference.
    #[must_use]
    pub fn column(table: &str, name: &str) -> Self {
        Self::from_node(ExprNode::Column {
            table: Some(String::from(table)),
            name: String::from(name),
            null_extended: false,
        })
    }

    /// A literal value.
    #[must_use]
    pub fn literal<V: IntoExpr<T>>(value: V) -> Self {
        value.into_expr()
    }

    /// A named placeholder. It binds under the dialect prefix plus `name`
    /// with `default` as its value, which can be replaced on the compiled
    /// output with [`CompiledSql::with_parameter`].
    ///
    /// [`CompiledSql::with_parameter`]: crate::compiler::CompiledSql::with_parameter
    #[must_use]
    pub fn param(name: &str, default: impl ToSqlValue) -> Self {
        Self::from_node(ExprNode::Parameter {
            name: String::from(name),
            default: default.to_sql_value(),
        })
    }

    fn compare<V: IntoExpr<T>>(&self, op: BinaryOp, other: V) -> Expr<bool> {
        Expr::from_node(ExprNode::binary(
            self.node.clone(),
            op,
            other.into_expr().node,
        ))
    }

    /// `self = other`. Comparing with a NULL literal yields `IS NULL`.
    #[must_use]
    pub fn eq<V: IntoExpr<T>>(&self, other: V) -> Expr<bool> {
        let other = other.into_expr();
        if matches!(other.node, ExprNode::Literal(SqlValue::Null)) {
            return self.is_null();
        }
        self.compare(BinaryOp::Eq, other)
    }

    /// `self != other`. Comparing with a NULL literal yields `IS NOT NULL`.
    #[must_use]
    pub fn not_eq<V: IntoExpr<T>>(&self, other: V) -> Expr<bool> {
        let other = other.into_expr();
        if matches!(other.node, ExprNode::Literal(SqlValue::Null)) {
            return self.is_not_null();
        }
        self.compare(BinaryOp::NotEq, other)
    }

    /// `self < other`.
    #[must_use]
    pub fn lt<V: IntoExpr<T>>(&self, other: V) -> Expr<bool> {
        self.compare(BinaryOp::Lt, other)
    }

    /// `self <= other`.
    #[must_use]
    pub fn lt_eq<V: IntoExpr<T>>(&self, other: V) -> Expr<bool> {
        self.compare(BinaryOp::LtEq, other)
    }

    /// `self > other`.
    #[must_use]
    pub fn gt<V: IntoExpr<T>>(&self, other: V) -> Expr<bool> {
        self.compare(BinaryOp::Gt, other)
    }

    /// `self >= other`.
    #[must_use]
    pub fn gt_eq<V: IntoExpr<T>>(&self, other: V) -> Expr<bool> {
        self.compare(BinaryOp::GtEq, other)
    }

    /// `self IS NULL`.
    #[must_use]
    pub fn is_null(&self) -> Expr<bool> {
        Expr::from_node(ExprNode::IsNull {
            expr: Box::new(self.node.clone()),
            negated: false,
        })
    }

    /// `self IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(&self) -> Expr<bool> {
        Expr::from_node(ExprNode::IsNull {
            expr: Box::new(self.node.clone()),
            negated: true,
        })
    }

    fn list<I, V>(&self, values: I, negated: bool) -> Expr<bool>
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr<T>,
    {
        Expr::from_node(ExprNode::InList {
            expr: Box::new(self.node.clone()),
            list: values.into_iter().map(|v| v.into_expr().node).collect(),
            negated,
        })
    }

    /// `self IN (values)`. An empty list is never satisfied.
    #[must_use]
    pub fn in_list<I, V>(&self, values: I) -> Expr<bool>
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr<T>,
    {
        self.list(values, false)
    }

    /// `self NOT IN (values)`. An empty list is always satisfied.
    #[must_use]
    pub fn not_in_list<I, V>(&self, values: I) -> Expr<bool>
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr<T>,
    {
        self.list(values, true)
    }

    /// `self IN (SELECT ...)` over a single-column query.
    #[must_use]
    pub fn in_query<O>(&self, query: &Query<Self, O>) -> Expr<bool> {
        Expr::from_node(ExprNode::InQuery {
            expr: Box::new(self.node.clone()),
            query: query.node().clone(),
            negated: false,
        })
    }

    /// `self NOT IN (SELECT ...)` over a single-column query.
    #[must_use]
    pub fn not_in_query<O>(&self, query: &Query<Self, O>) -> Expr<bool> {
        Expr::from_node(ExprNode::InQuery {
            expr: Box::new(self.node.clone()),
            query: query.node().clone(),
            negated: true,
        })
    }

    /// `self BETWEEN low AND high`.
    #[must_use]
    pub fn between<L: IntoExpr<T>, H: IntoExpr<T>>(&self, low: L, high: H) -> Expr<bool> {
        Expr::from_node(ExprNode::Between {
            expr: Box::new(self.node.clone()),
            low: Box::new(low.into_expr().node),
            high: Box::new(high.into_expr().node),
            negated: false,
        })
    }

    /// Views the expression as nullable.
    #[must_use]
    pub fn nullable(&self) -> Expr<T::Nullable> {
        Expr::from_node(self.node.clone())
    }

    /// `CAST(self AS U)`.
    #[must_use]
    pub fn cast<U: SqlType>(&self) -> Expr<U> {
        Expr::from_node(ExprNode::Cast {
            expr: Box::new(self.node.clone()),
            target: U::KIND,
        })
    }

    /// Drops the static type, keeping the kind for dynamic-arity rows.
    #[must_use]
    pub fn erase(&self) -> AnyExpr {
        AnyExpr {
            node: self.node.clone(),
            kind: T::KIND,
            nullable: T::NULLABLE,
        }
    }
}

impl<T: NotNull> Expr<Option<T>> {
    /// `COALESCE(self, fallback)`.
    #[must_use]
    pub fn coalesce<V: IntoExpr<T>>(&self, fallback: V) -> Expr<T> {
        Expr::from_node(ExprNode::Function {
            func: ScalarFunction::Coalesce,
            args: vec![self.node.clone(), fallback.into_expr().node],
        })
    }
}

impl Expr<bool> {
    /// Logical AND.
    #[must_use]
    pub fn and<V: IntoExpr<bool>>(&self, other: V) -> Self {
        self.clone() & other
    }

    /// Logical OR.
    #[must_use]
    pub fn or<V: IntoExpr<bool>>(&self, other: V) -> Self {
        self.clone() | other
    }
}

/// Starts a searched CASE expression.
///
/// ```
/// use querycraft_core::expr::{case_when, Expr};
///
/// let age: Expr<i64> = Expr::column("customers", "Age");
/// let band: Expr<String> = case_when(age.lt(18), "minor").otherwise("adult");
/// # let _ = band;
/// ```
#[must_use]
pub fn case_when<T: SqlType, V: IntoExpr<T>>(condition: Expr<bool>, value: V) -> Case<T> {
    Case {
        branches: vec![(condition.node, value.into_expr().node)],
        _type: PhantomData,
    }
}

/// A CASE expression under construction.
pub struct Case<T> {
    branches: Vec<(ExprNode, ExprNode)>,
    _type: PhantomData<fn() -> T>,
}

impl<T: SqlType> Case<T> {
    /// Adds a `WHEN condition THEN value` branch.
    #[must_use]
    pub fn when<V: IntoExpr<T>>(mut self, condition: Expr<bool>, value: V) -> Self {
        self.branches.push((condition.node, value.into_expr().node));
        self
    }

    /// Finishes with an ELSE value.
    #[must_use]
    pub fn otherwise<V: IntoExpr<T>>(self, value: V) -> Expr<T> {
        Expr::from_node(ExprNode::Case {
            branches: self.branches,
            otherwise: Some(Box::new(value.into_expr().node)),
        })
    }

    /// Finishes without ELSE; unmatched rows yield NULL.
    #[must_use]
    pub fn end(self) -> Expr<T::Nullable> {
        Expr::from_node(ExprNode::Case {
            branches: self.branches,
            otherwise: None,
        })
    }
}

/// An expression whose type is only known at run time.
///
/// Used in `Vec<AnyExpr>` rows whose arity is not fixed by the type.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyExpr {
    /// Expression.
    pub node: ExprNode,
    /// Result family.
    pub kind: SqlKind,
    /// Whether the result may be NULL.
    pub nullable: bool,
}

/// Conversion into a typed expression.
///
/// Implemented for expressions themselves and for Rust literals of the
/// matching family, so comparison and arithmetic methods accept both
/// `c.age.gt(18)` and `c.age.gt(&other.age)`.
pub trait IntoExpr<T> {
    /// Performs the conversion.
    fn into_expr(self) -> Expr<T>;
}

impl<T> IntoExpr<T> for Expr<T> {
    fn into_expr(self) -> Expr<T> {
        self
    }
}

impl<T> IntoExpr<T> for &Expr<T> {
    fn into_expr(self) -> Expr<T> {
        self.clone()
    }
}

fn literal<T>(value: SqlValue) -> Expr<T> {
    Expr::from_node(ExprNode::Literal(value))
}

macro_rules! impl_literal {
    ($target:ty, $($src:ty),+) => {
        $(
            impl IntoExpr<$target> for $src {
                fn into_expr(self) -> Expr<$target> {
                    literal(<$target as From<$src>>::from(self).to_sql_value())
                }
            }

            impl IntoExpr<Option<$target>> for $src {
                fn into_expr(self) -> Expr<Option<$target>> {
                    literal(<$target as From<$src>>::from(self).to_sql_value())
                }
            }

            impl IntoExpr<Option<$target>> for Option<$src> {
                fn into_expr(self) -> Expr<Option<$target>> {
                    literal(self.map(<$target as From<$src>>::from).to_sql_value())
                }
            }
        )+
    };
}

impl_literal!(bool, bool);
impl_literal!(i64, i64, i32, i16, u32);
impl_literal!(String, String, &str);
impl_literal!(Decimal, Decimal, i64, i32);
impl_literal!(NaiveDateTime, NaiveDateTime);
impl_literal!(Uuid, Uuid);

impl<T> IntoExpr<T> for SqlValue {
    fn into_expr(self) -> Expr<T> {
        literal(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age() -> Expr<i64> {
        Expr::column("customers", "Age")
    }

    #[test]
    fn test_comparison_builds_binary_node() {
        let pred = age().gt_eq(18);
        assert_eq!(
            pred.node(),
            &ExprNode::binary(
                age().into_node(),
                BinaryOp::GtEq,
                ExprNode::Literal(SqlValue::Int(18)),
            )
        );
    }

    #[test]
    fn test_eq_null_becomes_is_null() {
        let note: Expr<Option<String>> = Expr::column("orders", "Note");
        let pred = note.eq(None::<&str>);
        assert!(matches!(
            pred.node(),
            ExprNode::IsNull { negated: false, .. }
        ));
    }

    #[test]
    fn test_decimal_accepts_integer_literals() {
        let total: Expr<Decimal> = Expr::column("orders", "Total");
        let pred = total.gt(100);
        let ExprNode::Binary { right, .. } = pred.node() else {
            panic!("expected binary node");
        };
        assert_eq!(
            **right,
            ExprNode::Literal(SqlValue::Decimal(Decimal::from(100)))
        );
    }

    #[test]
    fn test_case_without_else_is_nullable() {
        let band = case_when::<String, _>(age().lt(18), "minor").end();
        let erased = band.erase();
        assert!(erased.nullable);
        assert_eq!(erased.kind, SqlKind::Text);
    }

    #[test]
    fn test_erase_keeps_kind() {
        let erased = age().erase();
        assert_eq!(erased.kind, SqlKind::Int);
        assert!(!erased.nullable);
    }
}
