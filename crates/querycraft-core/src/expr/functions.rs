//! String, numeric and date/time functions.

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::{Expr, ExprNode, IntoExpr, ScalarFunction};
use crate::types::Numeric;

fn call<T>(func: ScalarFunction, args: Vec<ExprNode>) -> Expr<T> {
    Expr::from_node(ExprNode::Function { func, args })
}

/// The current timestamp.
#[must_use]
pub fn now() -> Expr<NaiveDateTime> {
    call(ScalarFunction::Now, Vec::new())
}

/// A freshly generated UUID.
#[must_use]
pub fn new_guid() -> Expr<Uuid> {
    call(ScalarFunction::NewGuid, Vec::new())
}

macro_rules! impl_text_functions {
    ($text:ty, $int:ty, $bool:ty) => {
        impl Expr<$text> {
            /// `UPPER(self)`.
            #[must_use]
            pub fn upper(&self) -> Self {
                call(ScalarFunction::Upper, vec![self.node.clone()])
            }

            /// `LOWER(self)`.
            #[must_use]
            pub fn lower(&self) -> Self {
                call(ScalarFunction::Lower, vec![self.node.clone()])
            }

            /// Strips leading and trailing spaces.
            #[must_use]
            pub fn trim(&self) -> Self {
                call(ScalarFunction::Trim, vec![self.node.clone()])
            }

            /// Number of characters.
            #[must_use]
            pub fn length(&self) -> Expr<$int> {
                call(ScalarFunction::Length, vec![self.node.clone()])
            }

            /// Substring starting at the 1-based `start`, `len` characters long.
            #[must_use]
            pub fn substring<S: IntoExpr<i64>, L: IntoExpr<i64>>(&self, start: S, len: L) -> Self {
                call(
                    ScalarFunction::Substring,
                    vec![
                        self.node.clone(),
                        start.into_expr().node,
                        len.into_expr().node,
                    ],
                )
            }

            /// Replaces every occurrence of `from` with `to`.
            #[must_use]
            pub fn replace<F: IntoExpr<String>, R: IntoExpr<String>>(&self, from: F, to: R) -> Self {
                call(
                    ScalarFunction::Replace,
                    vec![self.node.clone(), from.into_expr().node, to.into_expr().node],
                )
            }

            /// `self LIKE pattern`.
            #[must_use]
            pub fn like<P: IntoExpr<String>>(&self, pattern: P) -> Expr<bool> {
                Expr::from_node(ExprNode::binary(
                    self.node.clone(),
                    super::BinaryOp::Like,
                    pattern.into_expr().node,
                ))
            }

            /// Regular-expression match. Not every dialect supports it.
            #[must_use]
            pub fn regex_match<P: IntoExpr<String>>(&self, pattern: P) -> Expr<$bool> {
                call(
                    ScalarFunction::RegexMatch,
                    vec![self.node.clone(), pattern.into_expr().node],
                )
            }
        }
    };
}

impl_text_functions!(String, i64, bool);
impl_text_functions!(Option<String>, Option<i64>, Option<bool>);

macro_rules! impl_datetime_functions {
    ($dt:ty, $int:ty) => {
        impl Expr<$dt> {
            /// Calendar year.
            #[must_use]
            pub fn year(&self) -> Expr<$int> {
                call(ScalarFunction::Year, vec![self.node.clone()])
            }

            /// Month of the year, 1 to 12.
            #[must_use]
            pub fn month(&self) -> Expr<$int> {
                call(ScalarFunction::Month, vec![self.node.clone()])
            }

            /// Day of the month.
            #[must_use]
            pub fn day(&self) -> Expr<$int> {
                call(ScalarFunction::Day, vec![self.node.clone()])
            }

            /// Shifts the timestamp by a (possibly negative) number of days.
            #[must_use]
            pub fn add_days<D: IntoExpr<i64>>(&self, days: D) -> Self {
                call(
                    ScalarFunction::AddDays,
                    vec![self.node.clone(), days.into_expr().node],
                )
            }
        }
    };
}

impl_datetime_functions!(NaiveDateTime, i64);
impl_datetime_functions!(Option<NaiveDateTime>, Option<i64>);

impl<T: Numeric> Expr<T> {
    /// Absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        call(ScalarFunction::Abs, vec![self.node.clone()])
    }

    /// Rounds to `places` decimal places.
    #[must_use]
    pub fn round<P: IntoExpr<i64>>(&self, places: P) -> Self {
        call(
            ScalarFunction::Round,
            vec![self.node.clone(), places.into_expr().node],
        )
    }

    /// Rounds up to an integral value.
    #[must_use]
    pub fn ceiling(&self) -> Self {
        call(ScalarFunction::Ceiling, vec![self.node.clone()])
    }

    /// Rounds down to an integral value.
    #[must_use]
    pub fn floor(&self) -> Self {
        call(ScalarFunction::Floor, vec![self.node.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_arguments_in_call_order() {
        let name: Expr<String> = Expr::column("customers", "Name");
        let sub = name.substring(2, 3);
        let ExprNode::Function { func, args } = sub.node() else {
            panic!("expected function");
        };
        assert_eq!(*func, ScalarFunction::Substring);
        assert_eq!(args.len(), 3);
        assert_eq!(&args[0], name.node());
    }

    #[test]
    fn test_nullable_text_keeps_nullability() {
        let note: Expr<Option<String>> = Expr::column("orders", "Note");
        let len = note.length().erase();
        assert!(len.nullable);
    }
}
