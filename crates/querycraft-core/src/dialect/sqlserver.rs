//! SQL-Server style dialect.

use super::{BooleanStyle, ConcatStyle, Dialect, DialectKind, LimitSyntax};
use crate::error::Result;
use crate::expr::ScalarFunction;
use crate::types::SqlKind;

/// SQL-Server style: `@p0` placeholders, `BIT` booleans compared to 1,
/// `TOP` / `OFFSET ... FETCH`, `[x]` quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn name(&self) -> &'static str {
        "SQL Server"
    }

    fn parameter_prefix(&self) -> char {
        '@'
    }

    fn boolean_style(&self) -> BooleanStyle {
        BooleanStyle::Integer
    }

    fn native_booleans(&self) -> bool {
        false
    }

    fn concat_style(&self) -> ConcatStyle {
        ConcatStyle::Function
    }

    fn limit_syntax(&self) -> LimitSyntax {
        LimitSyntax::TopOrOffsetFetch
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('[', ']')
    }

    fn type_name(&self, kind: SqlKind) -> &'static str {
        match kind {
            SqlKind::Bool => "BIT",
            SqlKind::Int => "BIGINT",
            SqlKind::Text => "NVARCHAR(MAX)",
            SqlKind::Decimal => "DECIMAL(38, 10)",
            SqlKind::DateTime => "DATETIME2",
            SqlKind::Guid => "UNIQUEIDENTIFIER",
        }
    }

    fn function_template(&self, func: ScalarFunction) -> Result<&'static str> {
        Ok(match func {
            ScalarFunction::Upper => "UPPER({0})",
            ScalarFunction::Lower => "LOWER({0})",
            ScalarFunction::Trim => "LTRIM(RTRIM({0}))",
            ScalarFunction::Length => "LEN({0})",
            ScalarFunction::Substring => "SUBSTRING({0}, {1}, {2})",
            ScalarFunction::Replace => "REPLACE({0}, {1}, {2})",
            ScalarFunction::Abs => "ABS({0})",
            ScalarFunction::Round => "ROUND({0}, {1})",
            ScalarFunction::Ceiling => "CEILING({0})",
            ScalarFunction::Floor => "FLOOR({0})",
            ScalarFunction::Now => "GETDATE()",
            ScalarFunction::Year => "YEAR({0})",
            ScalarFunction::Month => "MONTH({0})",
            ScalarFunction::Day => "DAY({0})",
            ScalarFunction::AddDays => "DATEADD(day, {1}, {0})",
            ScalarFunction::NewGuid => "NEWID()",
            ScalarFunction::Coalesce => "COALESCE({*})",
            ScalarFunction::RegexMatch => return Err(self.unsupported(func.name())),
        })
    }
}
