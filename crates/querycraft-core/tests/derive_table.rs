//! Tests for the `#[derive(Table)]` macro output.
//!
//! These tests verify that the derive macro generates:
//! - `{Struct}Table` implementing the `Table` trait, with name, column and
//!   primary key constants
//! - `{Struct}Row` with one typed column expression per field
//! - `{Struct}::table()` returning the table definition

mod common;
use common::*;

use querycraft_core::expr::ExprNode;
use querycraft_core::prelude::*;
use querycraft_core::types::SqlKind;
use querycraft_derive::Table;
use rust_decimal::Decimal;

// =============================================================================
// Default names
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
pub struct LineItem {
    #[column(primary_key)]
    pub id: i64,
    pub unit_price: Decimal,
    pub note: Option<String>,
}

#[test]
fn test_default_table_name_is_snake_case() {
    assert_eq!(LineItemTable::NAME, "line_item");
    assert_eq!(LineItem::table().name(), "line_item");
}

#[test]
fn test_default_column_names_are_field_names() {
    assert_eq!(LineItemTable::COLUMNS, &["id", "unit_price", "note"]);
    assert_eq!(LineItemTable::PRIMARY_KEY, Some("id"));
}

#[test]
fn test_column_definitions() {
    let columns = LineItem::table().columns();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[1].name, "unit_price");
    assert_eq!(columns[1].kind, SqlKind::Decimal);
    assert!(!columns[1].nullable);
    assert_eq!(columns[2].kind, SqlKind::Text);
    assert!(columns[2].nullable);
}

// =============================================================================
// Renamed table and columns
// =============================================================================

#[test]
fn test_renamed_table() {
    assert_eq!(CustomerTable::NAME, "customers");
    assert_eq!(CustomerTable::COLUMNS, &["Id", "Age", "Name", "Email"]);
    assert_eq!(CustomerTable::PRIMARY_KEY, Some("Id"));
}

#[test]
fn test_no_primary_key() {
    #[allow(dead_code)]
    #[derive(Table)]
    struct AuditEntry {
        message: String,
    }

    assert_eq!(AuditEntryTable::PRIMARY_KEY, None);
}

// =============================================================================
// Rows
// =============================================================================

#[test]
fn test_row_fields_are_qualified_columns() {
    let row = Customer::table().row("c");
    assert_eq!(
        row.name.node(),
        &ExprNode::Column {
            table: Some(String::from("c")),
            name: String::from("Name"),
            null_extended: false,
        }
    );
}

#[test]
fn test_row_shape_follows_fields() {
    let query = Query::from(&LineItem::table());
    let shape: Vec<_> = query.columns().iter().map(|c| (c.kind, c.nullable)).collect();
    assert_eq!(
        shape,
        vec![
            (SqlKind::Int, false),
            (SqlKind::Decimal, false),
            (SqlKind::Text, true),
        ]
    );
}

#[test]
fn test_derived_table_in_query() {
    let query = Query::from(&LineItem::table())
        .filter(|l| l.note.is_not_null())
        .select(|l| (l.id.clone(), &l.unit_price * 2));

    assert_eq!(
        sql(&query, DialectKind::Sqlite).sql,
        "SELECT line_item.id, (line_item.unit_price * :p0) FROM line_item \
         WHERE (line_item.note IS NOT NULL)"
    );
}
