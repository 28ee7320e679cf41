//! # querycraft-core
//!
//! Statically-typed query construction with dialect-aware SQL compilation.
//!
//! Queries are built from typed expressions and composable clause
//! pipelines, never from strings. Predicates and selectors are ordinary
//! closures: they run once, at build time, against a row of column
//! references and return expression trees. The compiler lowers the pipeline
//! to a flat statement and renders it for SQL Server, PostgreSQL or SQLite,
//! with every literal bound as a parameter.
//!
//! ## Building and compiling a query
//!
//! ```rust
//! use querycraft_core::prelude::*;
//!
//! let customers = TableDef::<(i64, i64, String)>::new("customers", ["Id", "Age", "Name"]);
//!
//! let query = Query::from(&customers)
//!     .filter(|c| c.1.gt_eq(18))
//!     .order_by(|c| c.2.clone())
//!     .select(|c| (c.0.clone(), c.2.upper()));
//!
//! let compiled = query.to_sql_server().unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     "SELECT customers.Id, UPPER(customers.Name) FROM customers \
//!      WHERE customers.Age >= @p0 ORDER BY customers.Name ASC"
//! );
//! assert_eq!(compiled.parameters.get("@p0"), Some(&SqlValue::Int(18)));
//! ```
//!
//! ## Type safety
//!
//! Column types are part of the expression type, so mismatched comparisons
//! do not compile:
//!
//! ```compile_fail
//! use querycraft_core::prelude::*;
//!
//! let customers = TableDef::<(i64, i64, String)>::new("customers", ["Id", "Age", "Name"]);
//! // Age is an integer column; comparing it with text is a type error.
//! let _ = Query::from(&customers).filter(|c| c.1.eq("eighteen"));
//! ```

pub mod ast;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod expr;
mod optimizer;
pub mod query;
pub mod schema;
pub mod statement;
pub mod symbolic;
pub mod types;
pub mod value;

pub use compiler::{compile, Compilable, CompileOptions, CompiledSql, Compiler, Plan};
pub use dialect::{Dialect, DialectKind};
pub use error::{CompileError, Result};
pub use expr::{case_when, AnyExpr, Expr, IntoExpr};
pub use query::{Query, QueryNode};
pub use schema::{ColumnDef, Table, TableDef};
pub use statement::{Delete, Insert, Update};
pub use symbolic::Row;
pub use value::{ParameterTable, SqlValue};

/// Everything needed to build and compile queries.
pub mod prelude {
    pub use crate::compiler::{
        compile, Compilable, CompileOptions, CompiledSql, Compiler, LiteralMode, QuotePolicy,
    };
    pub use crate::dialect::DialectKind;
    pub use crate::error::CompileError;
    pub use crate::expr::{case_when, new_guid, now, AnyExpr, Expr, IntoExpr};
    pub use crate::query::{Ordered, Query, Unordered};
    pub use crate::schema::{Table, TableDef};
    pub use crate::statement::{Delete, Insert, Update};
    pub use crate::symbolic::Row;
    pub use crate::types::SqlType;
    pub use crate::value::SqlValue;
}
