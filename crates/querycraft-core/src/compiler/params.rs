//! Parameter binding.

use crate::dialect::Dialect;
use crate::error::{CompileError, Result};
use crate::value::{Parameter, ParameterTable, SqlValue};

use super::LiteralMode;

/// Collects parameters in the order their placeholders are rendered.
pub(crate) struct Binder<'d> {
    dialect: &'d dyn Dialect,
    mode: LiteralMode,
    entries: Vec<Parameter>,
    next: usize,
}

impl<'d> Binder<'d> {
    pub(crate) fn new(dialect: &'d dyn Dialect, mode: LiteralMode) -> Self {
        Self {
            dialect,
            mode,
            entries: Vec::new(),
            next: 0,
        }
    }

    /// Renders a literal: `NULL`, an inline value, or a fresh numbered
    /// placeholder.
    pub(crate) fn literal(&mut self, value: &SqlValue) -> String {
        if value.is_null() {
            return String::from("NULL");
        }
        if self.mode == LiteralMode::Inline {
            return self.dialect.render_literal(value);
        }
        let name = format!("{}p{}", self.dialect.parameter_prefix(), self.next);
        self.next += 1;
        self.entries.push(Parameter {
            name: name.clone(),
            value: value.clone(),
        });
        name
    }

    /// Renders a named placeholder, binding its default on first use.
    ///
    /// Names compare case-insensitively; a later use must repeat the first
    /// spelling and default exactly.
    pub(crate) fn named(&mut self, name: &str, default: &SqlValue) -> Result<String> {
        if !is_valid_name(name) {
            return Err(self
                .dialect
                .unsupported(&format!("parameter name `{name}`")));
        }
        let placeholder = format!("{}{name}", self.dialect.parameter_prefix());
        let same = self
            .entries
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(&placeholder))
            .map(|p| p.name == placeholder && p.value == *default);
        match same {
            Some(true) => {}
            Some(false) => return Err(CompileError::ConflictingParameter(String::from(name))),
            None => self.entries.push(Parameter {
                name: placeholder.clone(),
                value: default.clone(),
            }),
        }
        Ok(placeholder)
    }

    pub(crate) fn finish(self) -> ParameterTable {
        ParameterTable::from_entries(self.entries)
    }
}

/// A named parameter must be a plain identifier and must not collide with
/// the generated `p0`, `p1`, ... names in any letter case.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    let generated = name
        .strip_prefix(|c: char| c.eq_ignore_ascii_case(&'p'))
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()));
    plain && !generated
}
