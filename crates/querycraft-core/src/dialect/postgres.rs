//! PostgreSQL style dialect.

use super::{BooleanStyle, Dialect, DialectKind};
use crate::error::Result;
use crate::expr::ScalarFunction;
use crate::types::SqlKind;

/// PostgreSQL style: `:p0` placeholders, `TRUE`/`FALSE`, `LIMIT`/`OFFSET`,
/// `"x"` quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn boolean_style(&self) -> BooleanStyle {
        BooleanStyle::Keyword
    }

    fn type_name(&self, kind: SqlKind) -> &'static str {
        match kind {
            SqlKind::Bool => "BOOLEAN",
            SqlKind::Int => "BIGINT",
            SqlKind::Text => "TEXT",
            SqlKind::Decimal => "NUMERIC",
            SqlKind::DateTime => "TIMESTAMP",
            SqlKind::Guid => "UUID",
        }
    }

    fn function_template(&self, func: ScalarFunction) -> Result<&'static str> {
        Ok(match func {
            ScalarFunction::Upper => "UPPER({0})",
            ScalarFunction::Lower => "LOWER({0})",
            ScalarFunction::Trim => "TRIM({0})",
            ScalarFunction::Length => "LENGTH({0})",
            ScalarFunction::Substring => "SUBSTRING({0} FROM {1} FOR {2})",
            ScalarFunction::Replace => "REPLACE({0}, {1}, {2})",
            ScalarFunction::Abs => "ABS({0})",
            ScalarFunction::Round => "ROUND({0}, {1})",
            ScalarFunction::Ceiling => "CEIL({0})",
            ScalarFunction::Floor => "FLOOR({0})",
            ScalarFunction::Now => "NOW()",
            ScalarFunction::Year => "CAST(EXTRACT(YEAR FROM {0}) AS BIGINT)",
            ScalarFunction::Month => "CAST(EXTRACT(MONTH FROM {0}) AS BIGINT)",
            ScalarFunction::Day => "CAST(EXTRACT(DAY FROM {0}) AS BIGINT)",
            ScalarFunction::AddDays => "({0} + {1} * INTERVAL '1 day')",
            ScalarFunction::NewGuid => "gen_random_uuid()",
            ScalarFunction::Coalesce => "COALESCE({*})",
            ScalarFunction::RegexMatch => "({0} ~ {1})",
        })
    }
}
