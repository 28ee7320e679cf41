//! Error types for query compilation.

use std::fmt;

use thiserror::Error;

use crate::types::SqlKind;

/// Column kinds of a query result, in projection order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Shape(pub Vec<SqlKind>);

impl Shape {
    /// Number of columns.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(kind.as_str())?;
        }
        f.write_str(")")
    }
}

/// Errors raised while compiling a query or statement.
///
/// Compilation is all-or-nothing: when any of these is returned, no SQL text
/// or parameter table is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The target dialect cannot express a construct.
    #[error("{construct} is not supported by the {dialect} dialect")]
    UnsupportedConstruct {
        /// Description of the construct.
        construct: String,
        /// Dialect name.
        dialect: &'static str,
    },

    /// A captured selector, predicate or assignment cannot be compiled in
    /// the clause it appears in.
    #[error("cannot compile {clause} clause: {reason}")]
    SymbolicEvaluation {
        /// Clause being rendered (`WHERE`, `SELECT`, `SET`, ...).
        clause: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// Two row shapes that must agree do not.
    #[error("shape mismatch in {context}: {left} vs {right}")]
    ShapeMismatch {
        /// Where the shapes meet (`UNION`, `join keys`, ...).
        context: &'static str,
        /// Left-hand shape.
        left: Shape,
        /// Right-hand shape.
        right: Shape,
    },

    /// No parameter with this name exists in the parameter table.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// A named parameter is used with two different defaults.
    #[error("parameter `{0}` is bound to conflicting default values")]
    ConflictingParameter(String),

    /// A dialect name could not be parsed.
    #[error("unknown dialect: {0}")]
    UnknownDialect(String),
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_display() {
        let shape = Shape(vec![SqlKind::Int, SqlKind::Text]);
        assert_eq!(shape.to_string(), "(Int, Text)");
        assert_eq!(shape.arity(), 2);
    }

    #[test]
    fn test_error_messages() {
        let err = CompileError::ShapeMismatch {
            context: "UNION",
            left: Shape(vec![SqlKind::Int]),
            right: Shape(vec![SqlKind::Int, SqlKind::Text]),
        };
        assert_eq!(
            err.to_string(),
            "shape mismatch in UNION: (Int) vs (Int, Text)"
        );

        let err = CompileError::UnsupportedConstruct {
            construct: String::from("regular expression match"),
            dialect: "SQL Server",
        };
        assert_eq!(
            err.to_string(),
            "regular expression match is not supported by the SQL Server dialect"
        );
    }
}
