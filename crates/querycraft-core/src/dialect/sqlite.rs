//! SQLite style dialect.

use super::{ConcatStyle, Dialect, DialectKind, LimitSyntax};
use crate::error::Result;
use crate::expr::ScalarFunction;
use crate::types::SqlKind;

/// SQLite style: `:p0` placeholders, `1`/`0` booleans, `||`
/// concatenation, `LIMIT -1 OFFSET m` for a lone offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn concat_style(&self) -> ConcatStyle {
        ConcatStyle::Operator
    }

    fn limit_syntax(&self) -> LimitSyntax {
        LimitSyntax::LimitOffset {
            offset_requires_limit: true,
        }
    }

    fn type_name(&self, kind: SqlKind) -> &'static str {
        match kind {
            SqlKind::Bool | SqlKind::Int => "INTEGER",
            SqlKind::Text | SqlKind::DateTime | SqlKind::Guid => "TEXT",
            SqlKind::Decimal => "REAL",
        }
    }

    fn function_template(&self, func: ScalarFunction) -> Result<&'static str> {
        Ok(match func {
            ScalarFunction::Upper => "UPPER({0})",
            ScalarFunction::Lower => "LOWER({0})",
            ScalarFunction::Trim => "TRIM({0})",
            ScalarFunction::Length => "LENGTH({0})",
            ScalarFunction::Substring => "SUBSTR({0}, {1}, {2})",
            ScalarFunction::Replace => "REPLACE({0}, {1}, {2})",
            ScalarFunction::Abs => "ABS({0})",
            ScalarFunction::Round => "ROUND({0}, {1})",
            ScalarFunction::Ceiling => "CEIL({0})",
            ScalarFunction::Floor => "FLOOR({0})",
            ScalarFunction::Now => "DATETIME('now')",
            ScalarFunction::Year => "CAST(STRFTIME('%Y', {0}) AS INTEGER)",
            ScalarFunction::Month => "CAST(STRFTIME('%m', {0}) AS INTEGER)",
            ScalarFunction::Day => "CAST(STRFTIME('%d', {0}) AS INTEGER)",
            ScalarFunction::AddDays => "DATETIME({0}, ({1} || ' days'))",
            ScalarFunction::NewGuid => return Err(self.unsupported(func.name())),
            ScalarFunction::Coalesce => "COALESCE({*})",
            ScalarFunction::RegexMatch => "({0} REGEXP {1})",
        })
    }
}
