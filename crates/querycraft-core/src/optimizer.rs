//! Lowering of clause chains into flat SELECT statements.
//!
//! The chain is lowered bottom-up. Each clause is folded into the statement
//! built so far: filters AND into WHERE (or HAVING once grouped), ordering
//! keys replace or extend ORDER BY, projections replace the SELECT list. A
//! boundary (DISTINCT, LIMIT/OFFSET, set operation, explicit subquery)
//! *seals* the statement; the next clause after a seal wraps it in a derived
//! table aliased by the boundary's scope, which is the scope the builder
//! rebound the row to.
//!
//! Lowering is purely structural. Expressions are moved, never evaluated.

use std::collections::HashMap;

use tracing::trace;

use crate::ast::{
    DerivedAlias, JoinClause, JoinType, OrderBy, QueryExpr, SelectColumn, SelectStatement,
    SetOperator, TableRef,
};
use crate::compiler::CompileOptions;
use crate::error::{CompileError, Result, Shape};
use crate::expr::{AggregateFunction, BinaryOp, ExprNode};
use crate::query::{JoinCondition, OrderKey, QueryNode};
use crate::symbolic::{Projected, Rebinder, ScopeId};
use crate::types::SqlKind;

/// The boundary that sealed a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Distinct,
    Limit,
    SetOp,
    Derived,
}

/// A partially lowered query.
#[derive(Debug)]
enum Lowered {
    /// Later clauses fold into the statement.
    Open(SelectStatement),
    /// Later clauses must wrap the query in a derived table.
    Sealed {
        query: QueryExpr,
        scope: ScopeId,
        by: Boundary,
    },
}

/// Lowers query nodes into SQL statements.
pub(crate) struct Optimizer<'o> {
    options: &'o CompileOptions,
    tables: HashMap<String, Vec<SelectColumn>>,
}

impl<'o> Optimizer<'o> {
    pub(crate) fn new(options: &'o CompileOptions) -> Self {
        Self {
            options,
            tables: HashMap::new(),
        }
    }

    /// Lowers a top-level query.
    pub(crate) fn lower_query(&mut self, node: &QueryNode) -> Result<QueryExpr> {
        Ok(match self.lower(node)? {
            Lowered::Open(stmt) => QueryExpr::Select(Box::new(stmt)),
            Lowered::Sealed { query, .. } => query,
        })
    }

    /// Lowers a query nested in an expression. ORDER BY without a row
    /// window has no meaning there and is dropped.
    pub(crate) fn lower_nested(&mut self, node: &QueryNode) -> Result<QueryExpr> {
        let mut query = self.lower_query(node)?;
        query.for_each_select(&mut strip_unbounded_order);
        Ok(query)
    }

    /// Lowers an aggregate over a whole query into `SELECT AGG(...) FROM ...`.
    ///
    /// Without an explicit argument the aggregate applies to the single
    /// projected column of the lowered source (or `*` for COUNT).
    pub(crate) fn lower_aggregate(
        &mut self,
        func: AggregateFunction,
        kind: SqlKind,
        source: &QueryNode,
        arg: Option<&ExprNode>,
    ) -> Result<SelectStatement> {
        let mut stmt = self.open_node(source)?;
        let arg = match (arg, func) {
            (Some(arg), _) => Some(arg.clone()),
            (None, AggregateFunction::Count) => None,
            (None, _) => match stmt.columns.as_slice() {
                [single] => Some(single.expr.clone()),
                columns => {
                    return Err(CompileError::ShapeMismatch {
                        context: "aggregate",
                        left: shape_of(columns),
                        right: Shape(vec![kind]),
                    })
                }
            },
        };
        trace!(aggregate = func.as_str(), "lowering query aggregate");
        stmt.columns = vec![SelectColumn {
            expr: ExprNode::Aggregate {
                func,
                arg: arg.map(Box::new),
                distinct: false,
            },
            kind,
            nullable: func != AggregateFunction::Count,
            alias: None,
        }];
        stmt.order_by.clear();
        Ok(stmt)
    }

    fn open_node(&mut self, node: &QueryNode) -> Result<SelectStatement> {
        let lowered = self.lower(node)?;
        Ok(open(lowered))
    }

    fn lower(&mut self, node: &QueryNode) -> Result<Lowered> {
        match node {
            QueryNode::From { table, items } => {
                let columns = select_columns(items);
                self.tables
                    .insert(String::from(table.qualifier()), columns.clone());
                Ok(Lowered::Open(SelectStatement {
                    columns,
                    from: Some(TableRef::Table {
                        name: table.name.clone(),
                        alias: table.alias.clone(),
                    }),
                    ..SelectStatement::default()
                }))
            }
            QueryNode::Where { source, predicate } => {
                let mut stmt = self.open_node(source)?;
                if stmt.is_grouped() {
                    trace!("filter over grouped rows folded into HAVING");
                    and_into(&mut stmt.having, predicate.clone());
                } else {
                    if stmt.where_clause.is_some() {
                        if self.options.fuse_filters {
                            trace!("fusing consecutive filters");
                        } else {
                            self.nest_filter(&mut stmt);
                        }
                    }
                    and_into(&mut stmt.where_clause, predicate.clone());
                }
                Ok(Lowered::Open(stmt))
            }
            QueryNode::Select { source, items } => {
                if items.is_empty() {
                    return Err(CompileError::SymbolicEvaluation {
                        clause: "SELECT",
                        reason: String::from("the selector produced no columns"),
                    });
                }
                let mut stmt = self.open_node(source)?;
                stmt.columns = select_columns(items);
                Ok(Lowered::Open(stmt))
            }
            QueryNode::OrderBy { source, keys } => {
                let keys = order_keys(keys)?;
                let mut stmt = self.open_node(source)?;
                if !stmt.order_by.is_empty() {
                    trace!("ordering replaces earlier keys");
                }
                stmt.order_by = keys;
                Ok(Lowered::Open(stmt))
            }
            QueryNode::ThenBy { source, keys } => {
                let keys = order_keys(keys)?;
                let mut stmt = self.open_node(source)?;
                trace!("appending ordering keys");
                stmt.order_by.extend(keys);
                Ok(Lowered::Open(stmt))
            }
            QueryNode::GroupBy { source, keys } => {
                if keys.is_empty() {
                    return Err(CompileError::SymbolicEvaluation {
                        clause: "GROUP BY",
                        reason: String::from("the key selector produced no columns"),
                    });
                }
                let mut stmt = self.open_node(source)?;
                stmt.group_by = keys.iter().map(|k| k.expr.clone()).collect();
                stmt.order_by.clear();
                Ok(Lowered::Open(stmt))
            }
            QueryNode::Having { source, predicate } => {
                let mut stmt = self.open_node(source)?;
                and_into(&mut stmt.having, predicate.clone());
                Ok(Lowered::Open(stmt))
            }
            QueryNode::Join {
                left,
                right,
                join_type,
                condition,
                items,
            } => self.lower_join(left, right, *join_type, condition, items),
            QueryNode::Distinct { source, scope } => {
                let stmt = match self.lower(source)? {
                    Lowered::Sealed {
                        query: QueryExpr::Select(stmt),
                        by: Boundary::Distinct,
                        ..
                    } => {
                        trace!("collapsing repeated DISTINCT");
                        *stmt
                    }
                    other => {
                        let mut stmt = open(other);
                        stmt.distinct = true;
                        stmt
                    }
                };
                Ok(seal(stmt, *scope, Boundary::Distinct))
            }
            QueryNode::LimitOffset {
                source,
                limit,
                offset,
                scope,
            } => {
                let mut stmt = match self.lower(source)? {
                    Lowered::Sealed {
                        query: QueryExpr::Select(stmt),
                        by: Boundary::Distinct,
                        ..
                    } if !stmt.is_limited() => {
                        trace!("row window merged into DISTINCT");
                        *stmt
                    }
                    Lowered::Sealed {
                        query: QueryExpr::Select(stmt),
                        by: Boundary::Limit,
                        ..
                    } if stmt.limit.is_none() && offset.is_none() => {
                        trace!("limit merged into preceding offset");
                        *stmt
                    }
                    other => open(other),
                };
                if limit.is_some() {
                    stmt.limit = *limit;
                }
                if offset.is_some() {
                    stmt.offset = *offset;
                }
                Ok(seal(stmt, *scope, Boundary::Limit))
            }
            QueryNode::SetOp {
                left,
                right,
                op,
                scope,
            } => {
                let left = self.lower(left)?;
                let right = self.lower(right)?;
                let left = set_operand(left, *op, true);
                let right = set_operand(right, *op, false);
                let (left_shape, right_shape) = (shape_of(left.columns()), shape_of(right.columns()));
                if left_shape != right_shape {
                    return Err(CompileError::ShapeMismatch {
                        context: op.as_str(),
                        left: left_shape,
                        right: right_shape,
                    });
                }
                Ok(Lowered::Sealed {
                    query: QueryExpr::Compound {
                        left: Box::new(left),
                        op: *op,
                        right: Box::new(right),
                    },
                    scope: *scope,
                    by: Boundary::SetOp,
                })
            }
            QueryNode::Derived { source, scope } => {
                let stmt = self.open_node(source)?;
                Ok(seal(stmt, *scope, Boundary::Derived))
            }
        }
    }

    fn lower_join(
        &mut self,
        left: &QueryNode,
        right: &QueryNode,
        join_type: JoinType,
        condition: &JoinCondition,
        items: &[Projected],
    ) -> Result<Lowered> {
        if items.is_empty() {
            return Err(CompileError::SymbolicEvaluation {
                clause: "SELECT",
                reason: String::from("the join result selector produced no columns"),
            });
        }
        let mut stmt = self.open_node(left)?;
        let (table, filters) = self.join_operand(right)?;
        let mut on = match condition {
            JoinCondition::Keys { left, right } => key_condition(left, right)?,
            JoinCondition::Predicate(predicate) => predicate.clone(),
        };
        for filter in filters {
            trace!("moving right-side filter into ON");
            on = ExprNode::binary(on, BinaryOp::And, filter);
        }
        let from = stmt
            .from
            .take()
            .ok_or_else(|| CompileError::SymbolicEvaluation {
                clause: "FROM",
                reason: String::from("the left side of the join has no table"),
            })?;
        stmt.from = Some(TableRef::Join {
            left: Box::new(from),
            join: Box::new(JoinClause {
                join_type,
                table,
                on,
            }),
        });
        stmt.columns = select_columns(items);
        Ok(Lowered::Open(stmt))
    }

    /// The right operand of a join: a base table with the filters to move
    /// into ON, or a sealed query as a derived table.
    fn join_operand(&mut self, node: &QueryNode) -> Result<(TableRef, Vec<ExprNode>)> {
        match node {
            QueryNode::From { table, items } => {
                self.tables
                    .insert(String::from(table.qualifier()), select_columns(items));
                Ok((
                    TableRef::Table {
                        name: table.name.clone(),
                        alias: table.alias.clone(),
                    },
                    Vec::new(),
                ))
            }
            QueryNode::Where { source, predicate } if source.is_table_chain() => {
                let (table, mut filters) = self.join_operand(source)?;
                filters.push(predicate.clone());
                Ok((table, filters))
            }
            other => match self.lower(other)? {
                Lowered::Sealed { query, scope, .. } => Ok((derived(query, scope), Vec::new())),
                Lowered::Open(_) => Err(CompileError::SymbolicEvaluation {
                    clause: "JOIN",
                    reason: String::from("the right operand is neither a table nor a derived table"),
                }),
            },
        }
    }

    /// Moves the existing WHERE of a single-table statement into a derived
    /// table re-aliased to the table's own qualifier, so column references
    /// stay valid. Statements over joins or derived tables are left as-is.
    fn nest_filter(&self, stmt: &mut SelectStatement) {
        let Some(TableRef::Table { name, alias }) = &stmt.from else {
            return;
        };
        let qualifier = alias.clone().unwrap_or_else(|| name.clone());
        let Some(columns) = self.tables.get(&qualifier) else {
            return;
        };
        trace!(table = %qualifier, "nesting filter instead of fusing");
        let inner = SelectStatement {
            columns: columns.clone(),
            from: stmt.from.take(),
            where_clause: stmt.where_clause.take(),
            ..SelectStatement::default()
        };
        stmt.from = Some(TableRef::Derived {
            query: Box::new(QueryExpr::Select(Box::new(inner))),
            alias: DerivedAlias::Named(qualifier),
        });
    }
}

fn seal(stmt: SelectStatement, scope: ScopeId, by: Boundary) -> Lowered {
    Lowered::Sealed {
        query: QueryExpr::Select(Box::new(stmt)),
        scope,
        by,
    }
}

/// Returns a statement later clauses can fold into.
fn open(lowered: Lowered) -> SelectStatement {
    match lowered {
        Lowered::Open(stmt) => stmt,
        Lowered::Sealed { query, scope, by } => {
            trace!(boundary = ?by, "wrapping sealed query in a derived table");
            wrap(query, scope)
        }
    }
}

/// `SELECT scope.c0, ... FROM (query) AS scope`.
fn wrap(query: QueryExpr, scope: ScopeId) -> SelectStatement {
    let mut binder = Rebinder::new(scope);
    let columns = query
        .columns()
        .iter()
        .map(|c| {
            let expr = binder.next(&Projected {
                expr: c.expr.clone(),
                kind: c.kind,
                nullable: c.nullable,
            });
            SelectColumn {
                expr,
                kind: c.kind,
                nullable: c.nullable,
                alias: None,
            }
        })
        .collect();
    SelectStatement {
        columns,
        from: Some(derived(query, scope)),
        ..SelectStatement::default()
    }
}

/// A derived table: inner columns aliased `c0..cn`, unbounded ORDER BY
/// dropped.
fn derived(mut query: QueryExpr, scope: ScopeId) -> TableRef {
    query.for_each_select(&mut |stmt| {
        for (i, column) in stmt.columns.iter_mut().enumerate() {
            column.alias = Some(Rebinder::column_name(i));
        }
        strip_unbounded_order(stmt);
    });
    TableRef::Derived {
        query: Box::new(query),
        alias: DerivedAlias::Generated(scope),
    }
}

/// Prepares one side of a set operation. A left compound of the same
/// operator stays flat; sides with a row window or a different compound are
/// wrapped.
fn set_operand(lowered: Lowered, op: SetOperator, leftmost: bool) -> QueryExpr {
    match lowered {
        Lowered::Open(mut stmt) => {
            strip_unbounded_order(&mut stmt);
            QueryExpr::Select(Box::new(stmt))
        }
        Lowered::Sealed {
            query: query @ QueryExpr::Compound { op: inner, .. },
            ..
        } if leftmost && inner == op => {
            trace!(op = op.as_str(), "flattening chained set operation");
            query
        }
        Lowered::Sealed {
            query: QueryExpr::Select(mut stmt),
            by: Boundary::Distinct,
            ..
        } if !stmt.is_limited() => {
            strip_unbounded_order(&mut stmt);
            QueryExpr::Select(stmt)
        }
        sealed => QueryExpr::Select(Box::new(open(sealed))),
    }
}

fn strip_unbounded_order(stmt: &mut SelectStatement) {
    if !stmt.is_limited() {
        stmt.order_by.clear();
    }
}

fn and_into(slot: &mut Option<ExprNode>, predicate: ExprNode) {
    *slot = Some(match slot.take() {
        Some(existing) => ExprNode::binary(existing, BinaryOp::And, predicate),
        None => predicate,
    });
}

fn select_columns(items: &[Projected]) -> Vec<SelectColumn> {
    items
        .iter()
        .map(|p| SelectColumn {
            expr: p.expr.clone(),
            kind: p.kind,
            nullable: p.nullable,
            alias: None,
        })
        .collect()
}

fn order_keys(keys: &[OrderKey]) -> Result<Vec<OrderBy>> {
    if keys.is_empty() {
        return Err(CompileError::SymbolicEvaluation {
            clause: "ORDER BY",
            reason: String::from("the key selector produced no columns"),
        });
    }
    Ok(keys
        .iter()
        .map(|k| OrderBy {
            expr: k.expr.clone(),
            direction: k.direction,
        })
        .collect())
}

fn key_condition(left: &[Projected], right: &[Projected]) -> Result<ExprNode> {
    let left_shape = Shape(left.iter().map(|p| p.kind).collect());
    let right_shape = Shape(right.iter().map(|p| p.kind).collect());
    if left_shape != right_shape {
        return Err(CompileError::ShapeMismatch {
            context: "join keys",
            left: left_shape,
            right: right_shape,
        });
    }
    left.iter()
        .zip(right)
        .map(|(l, r)| ExprNode::binary(l.expr.clone(), BinaryOp::Eq, r.expr.clone()))
        .reduce(|acc, eq| ExprNode::binary(acc, BinaryOp::And, eq))
        .ok_or_else(|| CompileError::SymbolicEvaluation {
            clause: "ON",
            reason: String::from("the join key selectors produced no columns"),
        })
}

pub(crate) fn shape_of(columns: &[SelectColumn]) -> Shape {
    Shape(columns.iter().map(|c| c.kind).collect())
}
