//! SQL values and the parameter table.
//!
//! Every literal captured in an expression is a [`SqlValue`]. Compilation
//! binds those values into a [`ParameterTable`] keyed by dialect-prefixed
//! placeholder names, so user input never reaches the SQL text.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CompileError, Result};

/// A SQL value that can be bound as a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
    /// Exact decimal value.
    Decimal(Decimal),
    /// Timestamp without time zone.
    DateTime(NaiveDateTime),
    /// UUID value.
    Guid(Uuid),
}

impl SqlValue {
    /// Returns true for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Guid(g) => write!(f, "{g}"),
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for Decimal {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Decimal(self)
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::DateTime(self)
    }
}

impl ToSqlValue for Uuid {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Guid(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

/// One bound parameter: placeholder name (with dialect prefix) and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Placeholder name as it appears in the SQL text, e.g. `:p0`.
    pub name: String,
    /// Bound value.
    pub value: SqlValue,
}

/// Ordered, immutable map from placeholder name to bound value.
///
/// Entries keep insertion order, which is the order their placeholders first
/// appear in the compiled SQL. Clones share storage; [`with_parameter`]
/// copies on write, so a compiled query can be specialised for execution
/// without touching the original table.
///
/// [`with_parameter`]: ParameterTable::with_parameter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTable {
    entries: Arc<Vec<Parameter>>,
}

impl ParameterTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<Parameter>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a value by placeholder name. The dialect prefix is optional.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.position(name).map(|i| &self.entries[i].value)
    }

    /// Iterates entries in placeholder order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    /// Placeholder names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }

    /// Values in placeholder order, ready for positional binding.
    #[must_use]
    pub fn values(&self) -> Vec<SqlValue> {
        self.entries.iter().map(|p| p.value.clone()).collect()
    }

    /// Returns a new table with one entry re-bound to `value`.
    ///
    /// The name may be given with its dialect prefix (`@min_age`) or without
    /// it (`min_age`). The receiver is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownParameter`] if no entry has that name.
    pub fn with_parameter(&self, name: &str, value: impl ToSqlValue) -> Result<Self> {
        let index = self
            .position(name)
            .ok_or_else(|| CompileError::UnknownParameter(String::from(name)))?;
        let mut next = self.clone();
        Arc::make_mut(&mut next.entries)[index].value = value.to_sql_value();
        Ok(next)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|p| {
            p.name == name || (p.name.len() == name.len() + 1 && p.name[1..] == *name)
        })
    }
}

impl<'a> IntoIterator for &'a ParameterTable {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
