#![allow(dead_code)]

use chrono::NaiveDateTime;
use querycraft_core::prelude::*;
use querycraft_core::value::ToSqlValue;
use querycraft_derive::Table;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Table)]
#[table(name = "customers")]
pub struct Customer {
    #[column(name = "Id", primary_key)]
    pub id: i64,
    #[column(name = "Age")]
    pub age: i64,
    #[column(name = "Name")]
    pub name: String,
    #[column(name = "Email")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Table)]
#[table(name = "orders")]
pub struct Order {
    #[column(name = "Id", primary_key)]
    pub id: i64,
    #[column(name = "CustomerId")]
    pub customer_id: i64,
    #[column(name = "Total")]
    pub total: Decimal,
    #[column(name = "PlacedAt")]
    pub placed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Table)]
#[table(name = "archived_customers")]
pub struct ArchivedCustomer {
    #[column(name = "Id", primary_key)]
    pub id: i64,
    #[column(name = "Name")]
    pub name: String,
}

pub fn customers() -> Query<CustomerRow> {
    Query::from(&Customer::table())
}

pub fn orders() -> Query<OrderRow> {
    Query::from(&Order::table())
}

pub fn sql<C: Compilable + ?Sized>(target: &C, dialect: DialectKind) -> CompiledSql {
    target
        .compile(dialect)
        .unwrap_or_else(|e| panic!("Failed to compile for {dialect}\nError: {e:?}"))
}

pub fn sql_with<C: Compilable + ?Sized>(
    target: &C,
    dialect: DialectKind,
    options: CompileOptions,
) -> CompiledSql {
    Compiler::new(dialect)
        .with_options(options)
        .compile(target)
        .unwrap_or_else(|e| panic!("Failed to compile for {dialect}\nError: {e:?}"))
}

pub fn compile_err<C: Compilable + ?Sized>(target: &C, dialect: DialectKind) -> CompileError {
    target
        .compile(dialect)
        .expect_err(&format!("Expected compile error for {dialect}"))
}

pub fn params(compiled: &CompiledSql) -> Vec<(String, SqlValue)> {
    compiled
        .parameters
        .iter()
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect()
}

pub fn param(name: &str, value: impl ToSqlValue) -> (String, SqlValue) {
    (String::from(name), value.to_sql_value())
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(String::from(s))
}
