//! Dialect-aware compilation to SQL text and parameters.
//!
//! Compilation runs in two passes: the optimizer lowers the clause chain
//! into a flat statement, then the renderer walks it once, emitting text and
//! binding parameters in the order their placeholders appear.
//!
//! # Example
//!
//! ```
//! use querycraft_core::prelude::*;
//!
//! let customers = TableDef::<(i64, i64, String)>::new("customers", ["Id", "Age", "Name"]);
//! let query = Query::from(&customers)
//!     .filter(|c| c.1.gt(18))
//!     .filter(|c| c.2.not_eq("Admin"));
//!
//! let compiled = Compiler::new(DialectKind::SqlServer).compile(&query).unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     "SELECT customers.Id, customers.Age, customers.Name FROM customers \
//!      WHERE (customers.Age > @p0) AND (customers.Name != @p1)"
//! );
//! assert_eq!(compiled.parameters.len(), 2);
//! ```

mod options;
mod params;
mod render;
mod statement;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use options::{CompileOptions, LiteralMode, QuotePolicy};

use crate::dialect::{Dialect, DialectKind};
use crate::error::Result;
use crate::expr::{Expr, ExprNode};
use crate::query::{Query, QueryNode};
use crate::schema::Table;
use crate::statement::{Delete, HasQuery, HasSet, HasValues, Insert, Statement, Update};
use crate::symbolic::Row;
use crate::value::{ParameterTable, ToSqlValue};

use render::Renderer;

/// SQL text with its parameter table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledSql {
    /// SQL text.
    pub sql: String,
    /// Parameters in placeholder order.
    pub parameters: ParameterTable,
}

impl CompiledSql {
    /// Returns a copy with one parameter re-bound. The SQL text is shared
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownParameter`](crate::error::CompileError::UnknownParameter)
    /// if no parameter has that name.
    pub fn with_parameter(&self, name: &str, value: impl ToSqlValue) -> Result<Self> {
        Ok(Self {
            sql: self.sql.clone(),
            parameters: self.parameters.with_parameter(name, value)?,
        })
    }
}

impl fmt::Display for CompiledSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// What a compilable value hands to the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// A SELECT pipeline.
    Query(Arc<QueryNode>),
    /// A standalone scalar expression, compiled as `SELECT expr` (or as the
    /// aggregate query itself for whole-query aggregates).
    Scalar(ExprNode),
    /// INSERT, UPDATE or DELETE.
    Statement(Statement),
}

/// A value that compiles to SQL.
pub trait Compilable {
    /// The plan to compile.
    fn to_plan(&self) -> Plan;

    /// Compiles with default options.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile`].
    fn compile(&self, dialect: DialectKind) -> Result<CompiledSql> {
        Compiler::new(dialect).compile(self)
    }

    /// Compiles for SQL Server.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile`].
    fn to_sql_server(&self) -> Result<CompiledSql> {
        self.compile(DialectKind::SqlServer)
    }

    /// Compiles for PostgreSQL.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile`].
    fn to_postgres(&self) -> Result<CompiledSql> {
        self.compile(DialectKind::Postgres)
    }

    /// Compiles for SQLite.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile`].
    fn to_sqlite(&self) -> Result<CompiledSql> {
        self.compile(DialectKind::Sqlite)
    }
}

/// Compiles queries and statements for one dialect.
#[derive(Clone)]
pub struct Compiler {
    dialect: &'static dyn Dialect,
    options: CompileOptions,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("dialect", &self.dialect.name())
            .field("options", &self.options)
            .finish()
    }
}

impl Compiler {
    /// Creates a compiler for a built-in dialect with default options.
    #[must_use]
    pub fn new(dialect: DialectKind) -> Self {
        Self::with_dialect(dialect.dialect())
    }

    /// Creates a compiler for a custom dialect descriptor.
    #[must_use]
    pub fn with_dialect(dialect: &'static dyn Dialect) -> Self {
        Self {
            dialect,
            options: CompileOptions::default(),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// The dialect descriptor.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compiles `target`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnsupportedConstruct`] when the dialect cannot
    /// express part of the query, [`CompileError::SymbolicEvaluation`] when a
    /// captured expression does not fit its clause, and
    /// [`CompileError::ShapeMismatch`] when combined rows disagree in shape.
    ///
    /// [`CompileError::UnsupportedConstruct`]: crate::error::CompileError::UnsupportedConstruct
    /// [`CompileError::SymbolicEvaluation`]: crate::error::CompileError::SymbolicEvaluation
    /// [`CompileError::ShapeMismatch`]: crate::error::CompileError::ShapeMismatch
    pub fn compile<C: Compilable + ?Sized>(&self, target: &C) -> Result<CompiledSql> {
        let plan = target.to_plan();
        let mut renderer = Renderer::new(self.dialect, &self.options);
        let sql = renderer.plan(&plan)?;
        let parameters = renderer.finish();
        debug!(
            dialect = self.dialect.name(),
            parameters = parameters.len(),
            "compiled {}",
            plan_kind(&plan)
        );
        Ok(CompiledSql { sql, parameters })
    }
}

/// Compiles `target` for `dialect` with default options.
///
/// # Errors
///
/// See [`Compiler::compile`].
pub fn compile<C: Compilable + ?Sized>(target: &C, dialect: DialectKind) -> Result<CompiledSql> {
    Compiler::new(dialect).compile(target)
}

const fn plan_kind(plan: &Plan) -> &'static str {
    match plan {
        Plan::Query(_) | Plan::Scalar(_) => "query",
        Plan::Statement(Statement::Insert(_)) => "insert",
        Plan::Statement(Statement::Update(_)) => "update",
        Plan::Statement(Statement::Delete(_)) => "delete",
    }
}

impl<R: Row, O> Compilable for Query<R, O> {
    fn to_plan(&self) -> Plan {
        Plan::Query(self.node().clone())
    }
}

impl<T> Compilable for Expr<T> {
    fn to_plan(&self) -> Plan {
        Plan::Scalar(self.node().clone())
    }
}

impl<T: Table> Compilable for Insert<T, HasValues> {
    fn to_plan(&self) -> Plan {
        Plan::Statement(self.to_statement())
    }
}

impl<T: Table> Compilable for Insert<T, HasQuery> {
    fn to_plan(&self) -> Plan {
        Plan::Statement(self.to_statement())
    }
}

impl<T: Table> Compilable for Update<T, HasSet> {
    fn to_plan(&self) -> Plan {
        Plan::Statement(self.to_statement())
    }
}

impl<T: Table> Compilable for Delete<T> {
    fn to_plan(&self) -> Plan {
        Plan::Statement(self.to_statement())
    }
}
