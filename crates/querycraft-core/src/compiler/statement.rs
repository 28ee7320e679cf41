//! INSERT, UPDATE and DELETE rendering.

use crate::error::{CompileError, Result, Shape};
use crate::expr::{BinaryOp, ExprNode};
use crate::optimizer::shape_of;
use crate::statement::{
    DeleteStatement, InsertSource, InsertStatement, Statement, TargetTable, UpdateStatement,
};

use super::render::Renderer;

impl Renderer<'_> {
    pub(super) fn statement(&mut self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Insert(insert) => self.insert(insert),
            Statement::Update(update) => self.update(update),
            Statement::Delete(delete) => self.delete(delete),
        }
    }

    fn insert(&mut self, insert: &InsertStatement) -> Result<String> {
        if insert.targets.is_empty() {
            return Err(CompileError::SymbolicEvaluation {
                clause: "INSERT",
                reason: String::from("no target columns were selected"),
            });
        }
        let mut names = Vec::with_capacity(insert.targets.len());
        for target in &insert.targets {
            let name = target_column(&insert.table, &target.expr, "INSERT")?;
            claim(&mut names, name, "INSERT")?;
        }
        let columns: Vec<String> = names.iter().map(|n| self.ident(n)).collect();
        let mut sql = format!(
            "INSERT INTO {} ({})",
            self.ident(&insert.table.name),
            columns.join(", ")
        );

        match &insert.source {
            InsertSource::Values(values) => {
                let mut rendered = Vec::with_capacity(values.len());
                for value in values {
                    rendered.push(self.value(value, "VALUES")?);
                }
                sql.push_str(" VALUES (");
                sql.push_str(&rendered.join(", "));
                sql.push(')');
            }
            InsertSource::Query(node) => {
                let query = self.optimizer.lower_nested(node)?;
                let target = Shape(insert.targets.iter().map(|t| t.kind).collect());
                let source = shape_of(query.columns());
                if target != source {
                    return Err(CompileError::ShapeMismatch {
                        context: "INSERT ... SELECT",
                        left: target,
                        right: source,
                    });
                }
                sql.push(' ');
                sql.push_str(&self.query(&query)?);
            }
        }
        Ok(sql)
    }

    fn update(&mut self, update: &UpdateStatement) -> Result<String> {
        let table = &update.table;
        self.bind_table(&table.name);
        let mut assignments = Vec::with_capacity(update.assignments.len());
        let mut names = Vec::with_capacity(update.assignments.len());
        for assignment in &update.assignments {
            let column = target_column(table, &assignment.target, "SET")?;
            claim(&mut names, column, "SET")?;
            let target = if self.options.qualify_update_targets {
                format!("{}.{}", self.ident(&table.name), self.ident(column))
            } else {
                self.ident(column)
            };
            let value = self.value(&assignment.value, "SET")?;
            assignments.push(format!("{target} = {value}"));
        }
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.ident(&table.name),
            assignments.join(", ")
        );
        self.filters(&update.predicates, &mut sql)?;
        Ok(sql)
    }

    fn delete(&mut self, delete: &DeleteStatement) -> Result<String> {
        self.bind_table(&delete.table.name);
        let mut sql = format!("DELETE FROM {}", self.ident(&delete.table.name));
        self.filters(&delete.predicates, &mut sql)?;
        Ok(sql)
    }

    fn filters(&mut self, predicates: &[ExprNode], sql: &mut String) -> Result<()> {
        let fused = predicates
            .iter()
            .cloned()
            .reduce(|acc, p| ExprNode::binary(acc, BinaryOp::And, p));
        if let Some(predicate) = fused {
            sql.push_str(" WHERE ");
            sql.push_str(&self.condition(&predicate, "WHERE")?);
        }
        Ok(())
    }
}

/// Resolves a selected target to the name of a column of `table`.
fn target_column<'n>(
    table: &TargetTable,
    target: &'n ExprNode,
    clause: &'static str,
) -> Result<&'n str> {
    if let ExprNode::Column {
        table: qualifier,
        name,
        ..
    } = target
    {
        let same_table = match qualifier {
            Some(q) => *q == table.name,
            None => true,
        };
        if same_table && table.columns.iter().any(|c| c == name) {
            return Ok(name);
        }
    }
    Err(CompileError::SymbolicEvaluation {
        clause,
        reason: format!("target is not a column of table `{}`", table.name),
    })
}

/// Records `name` as assigned, failing if it already was.
fn claim<'n>(names: &mut Vec<&'n str>, name: &'n str, clause: &'static str) -> Result<()> {
    if names.contains(&name) {
        return Err(CompileError::SymbolicEvaluation {
            clause,
            reason: format!("column `{name}` is assigned more than once"),
        });
    }
    names.push(name);
    Ok(())
}
