//! Runs compiled SQL against an in-memory DuckDB database.
//!
//! Fused and nested renderings of the same filter chain must return the
//! same rows.

mod common;
use common::*;

use duckdb::Connection;
use querycraft_core::prelude::*;

fn inline() -> CompileOptions {
    CompileOptions::default().with_literals(LiteralMode::Inline)
}

fn unfused() -> CompileOptions {
    inline().with_fuse_filters(false)
}

fn database() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open DuckDB");
    conn.execute_batch(
        "CREATE TABLE customers (Id BIGINT, Age BIGINT, Name VARCHAR, Email VARCHAR)",
    )
    .expect("Failed to create table");

    let rows: [(i64, i64, &str, Option<&str>); 6] = [
        (1, 17, "Ada", None),
        (2, 34, "Admin", Some("root@example.com")),
        (3, 52, "Grace", Some("grace@example.com")),
        (4, 19, "Linus", None),
        (5, 80, "Barbara", Some("barbara@example.com")),
        (6, 41, "O'Brien", None),
    ];
    for (id, age, name, email) in rows {
        let insert = Insert::into(&Customer::table())
            .value(|c| &c.id, id)
            .value(|c| &c.age, age)
            .value(|c| &c.name, name)
            .value(|c| &c.email, email);
        let compiled = sql_with(&insert, DialectKind::Postgres, inline());
        conn.execute_batch(&compiled.sql)
            .expect("Failed to insert row");
    }
    conn
}

fn fetch(conn: &Connection, sql: &str) -> Vec<(i64, String)> {
    let mut stmt = conn.prepare(sql).expect("Failed to prepare query");
    let mut rows: Vec<(i64, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("Failed to run query")
        .collect::<Result<_, _>>()
        .expect("Failed to read rows");
    rows.sort();
    rows
}

fn names(ids: &[(i64, &str)]) -> Vec<(i64, String)> {
    ids.iter().map(|(id, name)| (*id, String::from(*name))).collect()
}

// =============================================================================
// Filter fusion
// =============================================================================

#[test]
fn fused_and_nested_filters_return_same_rows() {
    let conn = database();
    let query = customers()
        .filter(|c| c.age.gt(18))
        .filter(|c| c.name.not_eq("Admin"))
        .select(|c| (c.id.clone(), c.name.clone()));

    let fused = sql_with(&query, DialectKind::Postgres, inline());
    let nested = sql_with(&query, DialectKind::Postgres, unfused());
    assert_ne!(fused.sql, nested.sql);
    assert!(nested.sql.contains(") AS customers WHERE"));

    let expected = names(&[(3, "Grace"), (4, "Linus"), (5, "Barbara"), (6, "O'Brien")]);
    assert_eq!(fetch(&conn, &fused.sql), expected);
    assert_eq!(fetch(&conn, &nested.sql), expected);
}

#[test]
fn three_filters_with_null_test() {
    let conn = database();
    let query = customers()
        .filter(|c| c.email.is_not_null())
        .filter(|c| c.age.lt(60))
        .filter(|c| c.name.like("%a%"))
        .select(|c| (c.id.clone(), c.name.clone()));

    let fused = fetch(&conn, &sql_with(&query, DialectKind::Postgres, inline()).sql);
    let nested = fetch(&conn, &sql_with(&query, DialectKind::Postgres, unfused()).sql);
    assert_eq!(fused, names(&[(3, "Grace")]));
    assert_eq!(fused, nested);
}

#[test]
fn filter_after_select_matches_nested_form() {
    let conn = database();
    let query = customers()
        .select(|c| (c.id.clone(), c.name.clone()))
        .filter(|r| r.1.not_eq("Ada"))
        .filter(|r| r.0.lt_eq(4));

    let fused = fetch(&conn, &sql_with(&query, DialectKind::Postgres, inline()).sql);
    let nested = fetch(&conn, &sql_with(&query, DialectKind::Postgres, unfused()).sql);
    assert_eq!(fused, names(&[(2, "Admin"), (3, "Grace"), (4, "Linus")]));
    assert_eq!(fused, nested);
}
