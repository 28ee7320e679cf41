//! Integration tests for dialect differences: booleans, functions, quoting
//! and unsupported constructs.

mod common;
use common::*;

use querycraft_core::prelude::*;

fn flags() -> TableDef<(i64, bool)> {
    TableDef::new("flags", ["Id", "Active"])
}

// =============================================================================
// Booleans
// =============================================================================

#[test]
fn boolean_column_as_predicate() {
    let query = Query::from(&flags())
        .filter(|f| f.1.clone())
        .select(|f| f.0.clone());

    assert_eq!(
        sql(&query, DialectKind::SqlServer).sql,
        "SELECT flags.Id FROM flags WHERE (flags.Active = 1)"
    );
    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT flags.Id FROM flags WHERE flags.Active"
    );
}

#[test]
fn predicate_as_value() {
    let query = Query::from(&flags()).select(|f| f.0.gt(10));

    assert_eq!(
        sql(&query, DialectKind::SqlServer).sql,
        "SELECT CASE WHEN (flags.Id > @p0) THEN 1 ELSE 0 END FROM flags"
    );
    assert_eq!(
        sql(&query, DialectKind::Sqlite).sql,
        "SELECT (flags.Id > :p0) FROM flags"
    );
}

#[test]
fn inline_boolean_literals() {
    let query = Query::from(&flags())
        .filter(|f| f.1.eq(true))
        .select(|f| f.0.clone());
    let options = CompileOptions::default().with_literals(LiteralMode::Inline);

    assert!(sql_with(&query, DialectKind::SqlServer, options.clone())
        .sql
        .ends_with("WHERE flags.Active = 1"));
    assert!(sql_with(&query, DialectKind::Postgres, options)
        .sql
        .ends_with("WHERE flags.Active = TRUE"));
}

// =============================================================================
// Strings
// =============================================================================

#[test]
fn concatenation() {
    let query = customers().select(|c| &c.name + " <" + "x>");

    assert_eq!(
        sql(&query, DialectKind::SqlServer).sql,
        "SELECT CONCAT(CONCAT(customers.Name, @p0), @p1) FROM customers"
    );
    assert_eq!(
        sql(&query, DialectKind::Sqlite).sql,
        "SELECT ((customers.Name || :p0) || :p1) FROM customers"
    );
}

#[test]
fn string_functions() {
    let query = customers().select(|c| (c.name.length(), c.name.trim().upper()));

    assert_eq!(
        sql(&query, DialectKind::SqlServer).sql,
        "SELECT LEN(customers.Name), UPPER(LTRIM(RTRIM(customers.Name))) FROM customers"
    );
    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT LENGTH(customers.Name), UPPER(TRIM(customers.Name)) FROM customers"
    );
}

#[test]
fn substring_per_dialect() {
    let query = customers().select(|c| c.name.substring(1, 3));

    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT SUBSTRING(customers.Name FROM :p0 FOR :p1) FROM customers"
    );
    assert_eq!(
        sql(&query, DialectKind::Sqlite).sql,
        "SELECT SUBSTR(customers.Name, :p0, :p1) FROM customers"
    );
}

#[test]
fn like_pattern() {
    let query = customers().filter(|c| c.name.like("A%"));
    assert!(sql(&query, DialectKind::SqlServer)
        .sql
        .ends_with("WHERE customers.Name LIKE @p0"));
}

// =============================================================================
// Dates
// =============================================================================

#[test]
fn add_days_per_dialect() {
    let query = orders().select(|o| o.placed_at.add_days(3));

    assert_eq!(
        sql(&query, DialectKind::SqlServer).sql,
        "SELECT DATEADD(day, @p0, orders.PlacedAt) FROM orders"
    );
    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT (orders.PlacedAt + :p0 * INTERVAL '1 day') FROM orders"
    );
}

#[test]
fn date_parts() {
    let query = orders().filter(|o| o.placed_at.year().eq(2024));

    assert!(sql(&query, DialectKind::SqlServer)
        .sql
        .ends_with("WHERE YEAR(orders.PlacedAt) = @p0"));
    assert!(sql(&query, DialectKind::Sqlite)
        .sql
        .ends_with("WHERE CAST(STRFTIME('%Y', orders.PlacedAt) AS INTEGER) = :p0"));
}

#[test]
fn current_time() {
    assert_eq!(sql(&now(), DialectKind::SqlServer).sql, "SELECT GETDATE()");
    assert_eq!(sql(&now(), DialectKind::Postgres).sql, "SELECT NOW()");
}

// =============================================================================
// Casts
// =============================================================================

#[test]
fn cast_type_names() {
    let query = customers().select(|c| c.age.cast::<String>());

    assert_eq!(
        sql(&query, DialectKind::SqlServer).sql,
        "SELECT CAST(customers.Age AS NVARCHAR(MAX)) FROM customers"
    );
    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT CAST(customers.Age AS TEXT) FROM customers"
    );
}

// =============================================================================
// Identifier quoting
// =============================================================================

#[test]
fn reserved_words_are_quoted() {
    let table = TableDef::<(i64,)>::new("order", ["Select"]);
    let query = Query::from(&table);

    assert_eq!(
        sql(&query, DialectKind::SqlServer).sql,
        "SELECT [order].[Select] FROM [order]"
    );
    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT \"order\".\"Select\" FROM \"order\""
    );
}

#[test]
fn always_quote() {
    let query = customers().select(|c| c.id.clone());
    let options = CompileOptions::default().with_quote_identifiers(QuotePolicy::Always);

    assert_eq!(
        sql_with(&query, DialectKind::SqlServer, options.clone()).sql,
        "SELECT [customers].[Id] FROM [customers]"
    );
    assert_eq!(
        sql_with(&query, DialectKind::Sqlite, options).sql,
        "SELECT \"customers\".\"Id\" FROM \"customers\""
    );
}

// =============================================================================
// Unsupported constructs
// =============================================================================

#[test]
fn regex_match_support() {
    let query = customers().filter(|c| c.name.regex_match("^A"));

    assert!(sql(&query, DialectKind::Postgres)
        .sql
        .ends_with("WHERE (customers.Name ~ :p0)"));
    assert_eq!(
        compile_err(&query, DialectKind::SqlServer),
        CompileError::UnsupportedConstruct {
            construct: String::from("regular expression match"),
            dialect: "SQL Server",
        }
    );
}

#[test]
fn new_guid_support() {
    assert_eq!(sql(&new_guid(), DialectKind::SqlServer).sql, "SELECT NEWID()");
    assert!(matches!(
        compile_err(&new_guid(), DialectKind::Sqlite),
        CompileError::UnsupportedConstruct {
            dialect: "SQLite",
            ..
        }
    ));
}
