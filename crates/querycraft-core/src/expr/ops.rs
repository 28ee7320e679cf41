//! Operator overloading for expressions.
//!
//! Arithmetic is available on numeric expressions, `+` on text expressions
//! concatenates, and `&`, `|`, `!` combine boolean expressions.

use std::ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Not, Rem, Sub};

use super::{BinaryOp, Expr, ExprNode, IntoExpr, UnaryOp};
use crate::types::Numeric;

fn binary<T>(left: ExprNode, op: BinaryOp, right: ExprNode) -> Expr<T> {
    Expr::from_node(ExprNode::binary(left, op, right))
}

macro_rules! impl_arith {
    ($trait:ident, $method:ident, $op:ident) => {
        impl<T: Numeric, V: IntoExpr<T>> $trait<V> for Expr<T> {
            type Output = Expr<T>;

            fn $method(self, rhs: V) -> Expr<T> {
                binary(self.node, BinaryOp::$op, rhs.into_expr().node)
            }
        }

        impl<T: Numeric, V: IntoExpr<T>> $trait<V> for &Expr<T> {
            type Output = Expr<T>;

            fn $method(self, rhs: V) -> Expr<T> {
                binary(self.node.clone(), BinaryOp::$op, rhs.into_expr().node)
            }
        }
    };
}

impl_arith!(Add, add, Add);
impl_arith!(Sub, sub, Sub);
impl_arith!(Mul, mul, Mul);
impl_arith!(Div, div, Div);
impl_arith!(Rem, rem, Mod);

impl<T: Numeric> Neg for Expr<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_node(ExprNode::unary(UnaryOp::Neg, self.node))
    }
}

impl<T: Numeric> Neg for &Expr<T> {
    type Output = Expr<T>;

    fn neg(self) -> Expr<T> {
        Expr::from_node(ExprNode::unary(UnaryOp::Neg, self.node.clone()))
    }
}

macro_rules! impl_concat {
    ($ty:ty) => {
        impl<V: IntoExpr<$ty>> Add<V> for Expr<$ty> {
            type Output = Self;

            fn add(self, rhs: V) -> Self {
                binary(self.node, BinaryOp::Concat, rhs.into_expr().node)
            }
        }

        impl<V: IntoExpr<$ty>> Add<V> for &Expr<$ty> {
            type Output = Expr<$ty>;

            fn add(self, rhs: V) -> Expr<$ty> {
                binary(self.node.clone(), BinaryOp::Concat, rhs.into_expr().node)
            }
        }
    };
}

impl_concat!(String);
impl_concat!(Option<String>);

macro_rules! impl_logical {
    ($trait:ident, $method:ident, $op:ident) => {
        impl<V: IntoExpr<bool>> $trait<V> for Expr<bool> {
            type Output = Self;

            fn $method(self, rhs: V) -> Self {
                binary(self.node, BinaryOp::$op, rhs.into_expr().node)
            }
        }

        impl<V: IntoExpr<bool>> $trait<V> for &Expr<bool> {
            type Output = Expr<bool>;

            fn $method(self, rhs: V) -> Expr<bool> {
                binary(self.node.clone(), BinaryOp::$op, rhs.into_expr().node)
            }
        }
    };
}

impl_logical!(BitAnd, bitand, And);
impl_logical!(BitOr, bitor, Or);

impl Not for Expr<bool> {
    type Output = Self;

    fn not(self) -> Self {
        Self::from_node(ExprNode::unary(UnaryOp::Not, self.node))
    }
}

impl Not for &Expr<bool> {
    type Output = Expr<bool>;

    fn not(self) -> Expr<bool> {
        Expr::from_node(ExprNode::unary(UnaryOp::Not, self.node.clone()))
    }
}
