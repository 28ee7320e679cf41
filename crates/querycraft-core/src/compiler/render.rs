//! Rendering of lowered statements and expressions to SQL text.

use crate::ast::{DerivedAlias, OrderBy, QueryExpr, SelectStatement, TableRef};
use crate::dialect::{ConcatStyle, Dialect, LimitSyntax};
use crate::error::{CompileError, Result, Shape};
use crate::expr::{AggregateFunction, BinaryOp, ExprNode, ScalarFunction, UnaryOp};
use crate::optimizer::{shape_of, Optimizer};
use crate::symbolic::ScopeId;
use crate::value::ParameterTable;

use super::params::Binder;
use super::{CompileOptions, Plan};

/// A name column references may be qualified with.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    /// Table name, table alias or fixed derived-table alias.
    Qualifier(String),
    /// Generated derived-table alias.
    Scope(ScopeId),
}

/// Renders one plan. A renderer is used for exactly one compilation, so
/// parameter numbering and alias naming start from zero every time.
pub(crate) struct Renderer<'c> {
    pub(super) dialect: &'c dyn Dialect,
    pub(super) options: &'c CompileOptions,
    pub(super) optimizer: Optimizer<'c>,
    binder: Binder<'c>,
    aliases: Vec<ScopeId>,
    frames: Vec<Frame>,
}

impl<'c> Renderer<'c> {
    pub(crate) fn new(dialect: &'c dyn Dialect, options: &'c CompileOptions) -> Self {
        Self {
            dialect,
            options,
            optimizer: Optimizer::new(options),
            binder: Binder::new(dialect, options.literals),
            aliases: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub(crate) fn plan(&mut self, plan: &Plan) -> Result<String> {
        match plan {
            Plan::Query(node) => {
                let query = self.optimizer.lower_query(node)?;
                self.query(&query)
            }
            Plan::Scalar(ExprNode::QueryAggregate {
                func,
                kind,
                source,
                arg,
            }) => {
                let stmt = self
                    .optimizer
                    .lower_aggregate(*func, *kind, source, arg.as_deref())?;
                self.select(&stmt)
            }
            Plan::Scalar(node) => Ok(format!("SELECT {}", self.value(node, "SELECT")?)),
            Plan::Statement(statement) => self.statement(statement),
        }
    }

    pub(crate) fn finish(self) -> ParameterTable {
        self.binder.finish()
    }

    pub(super) fn ident(&self, name: &str) -> String {
        self.dialect
            .quote_identifier(name, self.options.quote_identifiers)
    }

    /// Makes `qualifier` resolvable for the duration of a statement.
    pub(super) fn bind_table(&mut self, qualifier: &str) {
        self.frames.push(Frame::Qualifier(String::from(qualifier)));
    }

    fn alias(&mut self, scope: ScopeId) -> String {
        let index = match self.aliases.iter().position(|s| *s == scope) {
            Some(index) => index,
            None => {
                self.aliases.push(scope);
                self.aliases.len() - 1
            }
        };
        self.ident(&format!("t{index}"))
    }

    // Queries

    pub(super) fn query(&mut self, query: &QueryExpr) -> Result<String> {
        match query {
            QueryExpr::Select(stmt) => self.select(stmt),
            QueryExpr::Compound { left, op, right } => {
                let left = self.query(left)?;
                let right = self.query(right)?;
                Ok(format!("{left} {} {right}", op.as_str()))
            }
        }
    }

    pub(super) fn select(&mut self, stmt: &SelectStatement) -> Result<String> {
        if stmt.columns.is_empty() {
            return Err(CompileError::SymbolicEvaluation {
                clause: "SELECT",
                reason: String::from("the statement projects no columns"),
            });
        }
        let depth = self.frames.len();
        if let Some(from) = &stmt.from {
            collect_frames(from, &mut self.frames);
        }

        let mut sql = String::from("SELECT ");
        if stmt.distinct {
            sql.push_str("DISTINCT ");
        }
        if let (LimitSyntax::TopOrOffsetFetch, Some(limit), None) =
            (self.dialect.limit_syntax(), stmt.limit, stmt.offset)
        {
            sql.push_str(&format!("TOP {limit} "));
        }

        let mut columns = Vec::with_capacity(stmt.columns.len());
        for column in &stmt.columns {
            let mut rendered = self.value(&column.expr, "SELECT")?;
            if let Some(alias) = &column.alias {
                rendered.push_str(" AS ");
                rendered.push_str(&self.ident(alias));
            }
            columns.push(rendered);
        }
        sql.push_str(&columns.join(", "));

        if let Some(from) = &stmt.from {
            sql.push_str(" FROM ");
            sql.push_str(&self.table_ref(from)?);
        }
        if let Some(predicate) = &stmt.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&self.condition(predicate, "WHERE")?);
        }
        if !stmt.group_by.is_empty() {
            let keys = self.list(&stmt.group_by, "GROUP BY")?;
            sql.push_str(" GROUP BY ");
            sql.push_str(&keys);
        }
        if let Some(predicate) = &stmt.having {
            sql.push_str(" HAVING ");
            sql.push_str(&self.condition(predicate, "HAVING")?);
        }
        if !stmt.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by(&stmt.order_by)?);
        }
        self.row_window(stmt, &mut sql);

        self.frames.truncate(depth);
        Ok(sql)
    }

    fn order_by(&mut self, keys: &[OrderBy]) -> Result<String> {
        let mut parts = Vec::with_capacity(keys.len());
        for key in keys {
            let expr = self.value(&key.expr, "ORDER BY")?;
            parts.push(format!("{expr} {}", key.direction.as_str()));
        }
        Ok(parts.join(", "))
    }

    fn row_window(&self, stmt: &SelectStatement, sql: &mut String) {
        match self.dialect.limit_syntax() {
            LimitSyntax::TopOrOffsetFetch => {
                let Some(offset) = stmt.offset else {
                    return;
                };
                if stmt.order_by.is_empty() {
                    sql.push_str(" ORDER BY (SELECT NULL)");
                }
                sql.push_str(&format!(" OFFSET {offset} ROWS"));
                if let Some(limit) = stmt.limit {
                    sql.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
                }
            }
            LimitSyntax::LimitOffset {
                offset_requires_limit,
            } => {
                match (stmt.limit, stmt.offset) {
                    (Some(limit), _) => sql.push_str(&format!(" LIMIT {limit}")),
                    (None, Some(_)) if offset_requires_limit => sql.push_str(" LIMIT -1"),
                    _ => {}
                }
                if let Some(offset) = stmt.offset {
                    sql.push_str(&format!(" OFFSET {offset}"));
                }
            }
        }
    }

    fn table_ref(&mut self, table: &TableRef) -> Result<String> {
        match table {
            TableRef::Table { name, alias } => Ok(match alias {
                Some(alias) => format!("{} AS {}", self.ident(name), self.ident(alias)),
                None => self.ident(name),
            }),
            TableRef::Derived { query, alias } => {
                // A derived table cannot see the tables of the enclosing query.
                let outer = std::mem::take(&mut self.frames);
                let rendered = self.query(query);
                self.frames = outer;
                let alias = match alias {
                    DerivedAlias::Generated(scope) => self.alias(*scope),
                    DerivedAlias::Named(name) => self.ident(name),
                };
                Ok(format!("({}) AS {alias}", rendered?))
            }
            TableRef::Join { left, join } => {
                let left = self.table_ref(left)?;
                let right = self.table_ref(&join.table)?;
                let on = self.condition(&join.on, "ON")?;
                Ok(format!(
                    "{left} {} {right} ON {on}",
                    join.join_type.as_str()
                ))
            }
        }
    }

    /// Renders a nested query that must produce exactly one column.
    fn single_column(&mut self, query: &QueryExpr, context: &'static str) -> Result<String> {
        let columns = query.columns();
        if columns.len() != 1 {
            return Err(CompileError::ShapeMismatch {
                context,
                left: shape_of(columns),
                right: Shape(columns.iter().take(1).map(|c| c.kind).collect()),
            });
        }
        self.query(query)
    }

    // Expressions

    /// Top-level predicate of WHERE, HAVING, ON: an outermost binary
    /// operation is left unparenthesized.
    pub(super) fn condition(&mut self, node: &ExprNode, clause: &'static str) -> Result<String> {
        match node {
            ExprNode::Binary { left, op, right } if op.is_predicate() => {
                self.binary(left, *op, right, clause, false)
            }
            _ => self.predicate(node, clause),
        }
    }

    /// A node in truth-value position.
    fn predicate(&mut self, node: &ExprNode, clause: &'static str) -> Result<String> {
        let rendered = self.natural(node, clause)?;
        if node.is_predicate() || self.dialect.native_booleans() {
            Ok(rendered)
        } else {
            Ok(format!("({rendered} = 1)"))
        }
    }

    /// A node in value position.
    pub(super) fn value(&mut self, node: &ExprNode, clause: &'static str) -> Result<String> {
        let rendered = self.natural(node, clause)?;
        if node.is_predicate() && !self.dialect.native_booleans() {
            Ok(format!("CASE WHEN {rendered} THEN 1 ELSE 0 END"))
        } else {
            Ok(rendered)
        }
    }

    fn list(&mut self, nodes: &[ExprNode], clause: &'static str) -> Result<String> {
        let mut parts = Vec::with_capacity(nodes.len());
        for node in nodes {
            parts.push(self.value(node, clause)?);
        }
        Ok(parts.join(", "))
    }

    fn natural(&mut self, node: &ExprNode, clause: &'static str) -> Result<String> {
        match node {
            ExprNode::Literal(value) => Ok(self.binder.literal(value)),
            ExprNode::Column { table, name, .. } => self.column(table.as_deref(), name, clause),
            ExprNode::Projection { scope, name, .. } => {
                if !self.frames.contains(&Frame::Scope(*scope)) {
                    return Err(CompileError::SymbolicEvaluation {
                        clause,
                        reason: format!(
                            "column `{name}` refers to a derived table that is not part of this query"
                        ),
                    });
                }
                let alias = self.alias(*scope);
                Ok(format!("{alias}.{}", self.ident(name)))
            }
            ExprNode::Parameter { name, default } => self.binder.named(name, default),
            ExprNode::Unary { op, operand } => match op {
                UnaryOp::Neg => {
                    let operand = self.value(operand, clause)?;
                    // `--` would open a line comment.
                    if operand.starts_with('-') {
                        Ok(format!("({}({operand}))", op.as_str()))
                    } else {
                        Ok(format!("({}{operand})", op.as_str()))
                    }
                }
                UnaryOp::Not => Ok(format!(
                    "({}{})",
                    op.as_str(),
                    self.predicate(operand, clause)?
                )),
            },
            ExprNode::Binary { left, op, right } => self.binary(left, *op, right, clause, true),
            ExprNode::Function { func, args } => self.function(*func, args, clause),
            ExprNode::Case {
                branches,
                otherwise,
            } => {
                let mut sql = String::from("CASE");
                for (when, then) in branches {
                    let when = self.predicate(when, clause)?;
                    let then = self.value(then, clause)?;
                    sql.push_str(&format!(" WHEN {when} THEN {then}"));
                }
                if let Some(otherwise) = otherwise {
                    sql.push_str(" ELSE ");
                    sql.push_str(&self.value(otherwise, clause)?);
                }
                sql.push_str(" END");
                Ok(sql)
            }
            ExprNode::Aggregate {
                func,
                arg,
                distinct,
            } => self.aggregate(*func, arg.as_deref(), *distinct, clause),
            ExprNode::QueryAggregate {
                func,
                kind,
                source,
                arg,
            } => {
                let stmt = self
                    .optimizer
                    .lower_aggregate(*func, *kind, source, arg.as_deref())?;
                Ok(format!("({})", self.select(&stmt)?))
            }
            ExprNode::Subquery(query) => {
                let query = self.optimizer.lower_nested(query)?;
                Ok(format!("({})", self.single_column(&query, "scalar subquery")?))
            }
            ExprNode::Exists { query, negated } => {
                let query = self.optimizer.lower_nested(query)?;
                let keyword = if *negated { "NOT EXISTS" } else { "EXISTS" };
                Ok(format!("{keyword} ({})", self.query(&query)?))
            }
            ExprNode::InList {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    return Ok(String::from(if *negated { "(1 = 1)" } else { "(1 = 0)" }));
                }
                let expr = self.value(expr, clause)?;
                let list = self.list(list, clause)?;
                let keyword = if *negated { "NOT IN" } else { "IN" };
                Ok(format!("({expr} {keyword} ({list}))"))
            }
            ExprNode::InQuery {
                expr,
                query,
                negated,
            } => {
                let expr = self.value(expr, clause)?;
                let query = self.optimizer.lower_nested(query)?;
                let query = self.single_column(&query, "IN subquery")?;
                let keyword = if *negated { "NOT IN" } else { "IN" };
                Ok(format!("({expr} {keyword} ({query}))"))
            }
            ExprNode::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let expr = self.value(expr, clause)?;
                let low = self.value(low, clause)?;
                let high = self.value(high, clause)?;
                let keyword = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                Ok(format!("({expr} {keyword} {low} AND {high})"))
            }
            ExprNode::IsNull { expr, negated } => {
                let expr = self.value(expr, clause)?;
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                Ok(format!("({expr} {keyword})"))
            }
            ExprNode::Cast { expr, target } => {
                let expr = self.value(expr, clause)?;
                Ok(format!("CAST({expr} AS {})", self.dialect.type_name(*target)))
            }
        }
    }

    fn column(&mut self, table: Option<&str>, name: &str, clause: &'static str) -> Result<String> {
        let Some(table) = table else {
            return Ok(self.ident(name));
        };
        let bound = self
            .frames
            .iter()
            .any(|frame| matches!(frame, Frame::Qualifier(q) if q == table));
        if !bound {
            return Err(CompileError::SymbolicEvaluation {
                clause,
                reason: format!(
                    "column `{table}.{name}` refers to a table that is not part of this query"
                ),
            });
        }
        Ok(format!("{}.{}", self.ident(table), self.ident(name)))
    }

    fn binary(
        &mut self,
        left: &ExprNode,
        op: BinaryOp,
        right: &ExprNode,
        clause: &'static str,
        wrap: bool,
    ) -> Result<String> {
        let (left, right) = if op.is_logical() {
            (self.predicate(left, clause)?, self.predicate(right, clause)?)
        } else {
            (self.value(left, clause)?, self.value(right, clause)?)
        };
        if op == BinaryOp::Concat && self.dialect.concat_style() == ConcatStyle::Function {
            return Ok(format!("CONCAT({left}, {right})"));
        }
        let body = format!("{left} {} {right}", op.as_str());
        Ok(if wrap { format!("({body})") } else { body })
    }

    fn aggregate(
        &mut self,
        func: AggregateFunction,
        arg: Option<&ExprNode>,
        distinct: bool,
        clause: &'static str,
    ) -> Result<String> {
        let arg = match arg {
            Some(arg) => self.value(arg, clause)?,
            None => String::from("*"),
        };
        let distinct = if distinct { "DISTINCT " } else { "" };
        Ok(format!("{}({distinct}{arg})", func.as_str()))
    }

    /// Fills a dialect call template. Arguments are rendered in the order
    /// the template places them, so placeholders stay numbered in text
    /// order.
    fn function(
        &mut self,
        func: ScalarFunction,
        args: &[ExprNode],
        clause: &'static str,
    ) -> Result<String> {
        let template = self.dialect.function_template(func)?;
        let mut sql = String::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            sql.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                self.dialect
                    .unsupported(&format!("malformed call template for {}", func.name()))
            })?;
            let slot = &after[..close];
            if slot == "*" {
                sql.push_str(&self.list(args, clause)?);
            } else {
                let arg = slot
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| args.get(index))
                    .ok_or_else(|| CompileError::SymbolicEvaluation {
                        clause,
                        reason: format!("{} is missing argument {slot}", func.name()),
                    })?;
                sql.push_str(&self.value(arg, clause)?);
            }
            rest = &after[close + 1..];
        }
        sql.push_str(rest);
        Ok(sql)
    }
}

fn collect_frames(table: &TableRef, frames: &mut Vec<Frame>) {
    match table {
        TableRef::Table { name, alias } => {
            frames.push(Frame::Qualifier(alias.clone().unwrap_or_else(|| name.clone())));
        }
        TableRef::Derived { alias, .. } => frames.push(match alias {
            DerivedAlias::Generated(scope) => Frame::Scope(*scope),
            DerivedAlias::Named(name) => Frame::Qualifier(name.clone()),
        }),
        TableRef::Join { left, join } => {
            collect_frames(left, frames);
            collect_frames(&join.table, frames);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JoinClause, JoinType, SelectColumn};
    use crate::compiler::LiteralMode;
    use crate::dialect::DialectKind;
    use crate::types::SqlKind;
    use crate::value::SqlValue;

    fn column(table: &str, name: &str) -> ExprNode {
        ExprNode::Column {
            table: Some(String::from(table)),
            name: String::from(name),
            null_extended: false,
        }
    }

    fn render(kind: DialectKind, node: &ExprNode) -> String {
        let options = CompileOptions::default();
        let mut renderer = Renderer::new(kind.dialect(), &options);
        renderer.bind_table("customers");
        renderer.value(node, "SELECT").unwrap()
    }

    #[test]
    fn test_concat_per_dialect() {
        let node = ExprNode::binary(
            column("customers", "Name"),
            BinaryOp::Concat,
            ExprNode::Literal(SqlValue::Text(String::from("!"))),
        );
        assert_eq!(
            render(DialectKind::Postgres, &node),
            "CONCAT(customers.Name, :p0)"
        );
        assert_eq!(render(DialectKind::Sqlite, &node), "(customers.Name || :p0)");
    }

    #[test]
    fn test_predicate_as_value_on_sqlserver() {
        let node = ExprNode::binary(
            column("customers", "Age"),
            BinaryOp::Gt,
            ExprNode::Literal(SqlValue::Int(18)),
        );
        assert_eq!(
            render(DialectKind::SqlServer, &node),
            "CASE WHEN (customers.Age > @p0) THEN 1 ELSE 0 END"
        );
        assert_eq!(render(DialectKind::Postgres, &node), "(customers.Age > :p0)");
    }

    #[test]
    fn test_function_template_argument_order() {
        let node = ExprNode::Function {
            func: ScalarFunction::AddDays,
            args: vec![column("customers", "Joined"), ExprNode::Literal(SqlValue::Int(3))],
        };
        assert_eq!(
            render(DialectKind::SqlServer, &node),
            "DATEADD(day, @p0, customers.Joined)"
        );
    }

    #[test]
    fn test_negation_never_emits_comment_marker() {
        let negated = ExprNode::unary(UnaryOp::Neg, column("customers", "Age"));
        assert_eq!(render(DialectKind::Postgres, &negated), "(-customers.Age)");

        let options = CompileOptions::default().with_literals(LiteralMode::Inline);
        let mut renderer = Renderer::new(DialectKind::Sqlite.dialect(), &options);
        let literal = ExprNode::unary(UnaryOp::Neg, ExprNode::Literal(SqlValue::Int(-2)));
        assert_eq!(renderer.value(&literal, "SELECT").unwrap(), "(-(-2))");
    }

    #[test]
    fn test_empty_in_list() {
        let node = ExprNode::InList {
            expr: Box::new(column("customers", "Id")),
            list: Vec::new(),
            negated: false,
        };
        assert_eq!(render(DialectKind::Sqlite, &node), "(1 = 0)");
    }

    #[test]
    fn test_unbound_table_is_rejected() {
        let options = CompileOptions::default();
        let mut renderer = Renderer::new(DialectKind::Postgres.dialect(), &options);
        let err = renderer
            .value(&column("orders", "Total"), "WHERE")
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::SymbolicEvaluation { clause: "WHERE", .. }
        ));
    }

    #[test]
    fn test_derived_alias_numbered_on_first_use() {
        let scope = ScopeId::fresh();
        let inner = SelectStatement {
            columns: vec![SelectColumn {
                expr: column("customers", "Id"),
                kind: SqlKind::Int,
                nullable: false,
                alias: Some(String::from("c0")),
            }],
            from: Some(TableRef::Table {
                name: String::from("customers"),
                alias: None,
            }),
            ..SelectStatement::default()
        };
        let outer = SelectStatement {
            columns: vec![SelectColumn {
                expr: ExprNode::Projection {
                    scope,
                    name: String::from("c0"),
                    null_extended: false,
                },
                kind: SqlKind::Int,
                nullable: false,
                alias: None,
            }],
            from: Some(TableRef::Join {
                left: Box::new(TableRef::Derived {
                    query: Box::new(QueryExpr::Select(Box::new(inner))),
                    alias: DerivedAlias::Generated(scope),
                }),
                join: Box::new(JoinClause {
                    join_type: JoinType::Inner,
                    table: TableRef::Table {
                        name: String::from("orders"),
                        alias: None,
                    },
                    on: ExprNode::binary(
                        ExprNode::Projection {
                            scope,
                            name: String::from("c0"),
                            null_extended: false,
                        },
                        BinaryOp::Eq,
                        column("orders", "CustomerId"),
                    ),
                }),
            }),
            ..SelectStatement::default()
        };
        let options = CompileOptions::default();
        let mut renderer = Renderer::new(DialectKind::Postgres.dialect(), &options);
        assert_eq!(
            renderer.select(&outer).unwrap(),
            "SELECT t0.c0 FROM (SELECT customers.Id AS c0 FROM customers) AS t0 \
             INNER JOIN orders ON t0.c0 = orders.CustomerId"
        );
    }
}
