//! SQL dialect support.
//!
//! The three supported databases differ in placeholder prefix, boolean
//! handling, string concatenation, row limiting, identifier quoting and
//! function spelling. A [`Dialect`] describes those differences; the
//! compiler asks it instead of branching on the database.

mod postgres;
mod sqlite;
mod sqlserver;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use crate::compiler::QuotePolicy;
use crate::error::{CompileError, Result};
use crate::expr::ScalarFunction;
use crate::types::SqlKind;
use crate::value::SqlValue;

/// The supported dialect families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// SQL-Server style (`@p0`, `TOP`, `[x]`).
    SqlServer,
    /// PostgreSQL style (`:p0`, `LIMIT`, `"x"`).
    Postgres,
    /// SQLite style (`:p0`, `LIMIT`, `"x"`, `||`).
    Sqlite,
}

impl DialectKind {
    /// All dialects.
    pub const ALL: [Self; 3] = [Self::SqlServer, Self::Postgres, Self::Sqlite];

    /// The dialect descriptor.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::SqlServer => &SqlServerDialect,
            Self::Postgres => &PostgresDialect,
            Self::Sqlite => &SqliteDialect,
        }
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SqlServer => "sqlserver",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlserver" | "sql-server" | "sql_server" | "mssql" | "tsql" => Ok(Self::SqlServer),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(CompileError::UnknownDialect(String::from(s))),
        }
    }
}

/// How boolean literals are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanStyle {
    /// `TRUE` / `FALSE`.
    Keyword,
    /// `1` / `0`.
    Integer,
}

/// How string concatenation is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatStyle {
    /// `CONCAT(a, b)`.
    Function,
    /// `(a || b)`.
    Operator,
}

/// How row windows are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSyntax {
    /// `SELECT TOP n` when there is no offset, otherwise
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY` after a mandatory ORDER BY.
    TopOrOffsetFetch,
    /// `LIMIT n OFFSET m`.
    LimitOffset {
        /// `LIMIT -1` must precede a lone OFFSET.
        offset_requires_limit: bool,
    },
}

/// Words quoted when used as identifiers.
const RESERVED_WORDS: &[&str] = &[
    "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CHECK", "COLUMN",
    "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP",
    "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "FULL", "GRANT",
    "GROUP", "HAVING", "IN", "INDEX", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "KEY",
    "LEFT", "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER", "PRIMARY",
    "REFERENCES", "RIGHT", "ROWS", "SELECT", "SET", "TABLE", "THEN", "TO", "TOP", "TRUE", "UNION",
    "UNIQUE", "UPDATE", "USER", "USING", "VALUES", "VIEW", "WHEN", "WHERE", "WITH",
];

/// Returns true if `name` is a reserved word (case-insensitive).
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS
        .iter()
        .any(|word| word.eq_ignore_ascii_case(name))
}

/// Returns true if `name` can appear unquoted: a letter or underscore
/// followed by letters, digits or underscores, and not a reserved word.
#[must_use]
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !is_reserved(name)
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Send + Sync {
    /// The dialect family.
    fn kind(&self) -> DialectKind;

    /// Returns the name of the dialect, for error messages.
    fn name(&self) -> &'static str;

    /// Placeholder prefix character.
    fn parameter_prefix(&self) -> char {
        ':'
    }

    /// Boolean literal spelling.
    fn boolean_style(&self) -> BooleanStyle {
        BooleanStyle::Integer
    }

    /// Whether predicates and boolean values are interchangeable. When
    /// false, boolean values used as predicates are compared to 1 and
    /// predicates used as values go through CASE.
    fn native_booleans(&self) -> bool {
        true
    }

    /// String concatenation spelling.
    fn concat_style(&self) -> ConcatStyle {
        ConcatStyle::Function
    }

    /// Row-window spelling.
    fn limit_syntax(&self) -> LimitSyntax {
        LimitSyntax::LimitOffset {
            offset_requires_limit: false,
        }
    }

    /// Opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// Quotes an identifier if the policy requires it.
    fn quote_identifier(&self, name: &str, policy: QuotePolicy) -> String {
        if policy == QuotePolicy::WhenNeeded && is_plain_identifier(name) {
            return String::from(name);
        }
        let (open, close) = self.identifier_quotes();
        let escaped = name.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    /// Type name used in CAST.
    fn type_name(&self, kind: SqlKind) -> &'static str;

    /// Call template for a scalar function. `{0}`, `{1}`, ... stand for the
    /// arguments and `{*}` for all of them, comma-separated.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnsupportedConstruct`] if the dialect has no
    /// equivalent.
    fn function_template(&self, func: ScalarFunction) -> Result<&'static str>;

    /// Renders a literal inline.
    fn render_literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Bool(b) => match (self.boolean_style(), b) {
                (BooleanStyle::Keyword, true) => String::from("TRUE"),
                (BooleanStyle::Keyword, false) => String::from("FALSE"),
                (BooleanStyle::Integer, true) => String::from("1"),
                (BooleanStyle::Integer, false) => String::from("0"),
            },
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Decimal(d) => d.to_string(),
            SqlValue::Text(s) => quote_string(s),
            SqlValue::DateTime(dt) => quote_string(&dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            SqlValue::Guid(g) => quote_string(&g.to_string()),
        }
    }

    /// Builds the error for an unsupported construct.
    fn unsupported(&self, construct: &str) -> CompileError {
        CompileError::UnsupportedConstruct {
            construct: String::from(construct),
            dialect: self.name(),
        }
    }
}

/// Single-quotes a string, doubling embedded quotes.
#[must_use]
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
