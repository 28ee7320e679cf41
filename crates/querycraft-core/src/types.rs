//! SQL type families and their Rust counterparts.
//!
//! Every [`Expr<T>`](crate::expr::Expr) carries its result type `T`, one of
//! the six supported families or an `Option` of one for nullable values.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The SQL type family of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlKind {
    /// Boolean.
    Bool,
    /// 64-bit integer.
    Int,
    /// Unicode text.
    Text,
    /// Exact decimal.
    Decimal,
    /// Timestamp without time zone.
    DateTime,
    /// UUID.
    Guid,
}

impl SqlKind {
    /// Returns the family name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Text => "Text",
            Self::Decimal => "Decimal",
            Self::DateTime => "DateTime",
            Self::Guid => "Guid",
        }
    }
}

/// A Rust type that stands for a SQL type family.
pub trait SqlType: 'static {
    /// The SQL family.
    const KIND: SqlKind;

    /// Whether values of this type may be NULL.
    const NULLABLE: bool;

    /// The nullable counterpart (`Option<T>` for `T`, itself for `Option<T>`).
    type Nullable: SqlType;
}

/// Marker for the non-nullable base types.
pub trait NotNull: SqlType {}

/// Marker for types that support arithmetic.
pub trait Numeric: SqlType {}

macro_rules! impl_sql_type {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl SqlType for $ty {
                const KIND: SqlKind = SqlKind::$kind;
                const NULLABLE: bool = false;
                type Nullable = Option<$ty>;
            }

            impl NotNull for $ty {}
        )+
    };
}

impl_sql_type!(
    bool => Bool,
    i64 => Int,
    String => Text,
    Decimal => Decimal,
    NaiveDateTime => DateTime,
    Uuid => Guid,
);

impl<T: NotNull> SqlType for Option<T> {
    const KIND: SqlKind = T::KIND;
    const NULLABLE: bool = true;
    type Nullable = Self;
}

impl Numeric for i64 {}
impl Numeric for Decimal {}
impl Numeric for Option<i64> {}
impl Numeric for Option<Decimal> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_nullability() {
        assert_eq!(<i64 as SqlType>::KIND, SqlKind::Int);
        assert!(!<i64 as SqlType>::NULLABLE);
        assert_eq!(<Option<String> as SqlType>::KIND, SqlKind::Text);
        assert!(<Option<String> as SqlType>::NULLABLE);
        assert_eq!(
            <<Uuid as SqlType>::Nullable as SqlType>::KIND,
            SqlKind::Guid
        );
    }
}
