//! The untyped expression tree.

use std::sync::Arc;

use crate::query::QueryNode;
use crate::symbolic::ScopeId;
use crate::types::SqlKind;
use crate::value::SqlValue;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Division (`/`).
    Div,
    /// Modulo (`%`).
    Mod,
    /// Equal (`=`).
    Eq,
    /// Not equal (`!=`).
    NotEq,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    LtEq,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    GtEq,
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
    /// String concatenation. Rendered per dialect.
    Concat,
    /// LIKE pattern match.
    Like,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    ///
    /// `Concat` has no fixed spelling; dialects render it.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::Like => "LIKE",
        }
    }

    /// Returns true if the operator yields a truth value.
    #[must_use]
    pub const fn is_predicate(&self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::NotEq
                | Self::Lt
                | Self::LtEq
                | Self::Gt
                | Self::GtEq
                | Self::And
                | Self::Or
                | Self::Like
        )
    }

    /// Returns true for AND/OR, whose operands are themselves predicates.
    #[must_use]
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Negation (`-`).
    Neg,
    /// Logical NOT.
    Not,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT ",
        }
    }
}

/// Scalar functions with dialect-specific spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarFunction {
    /// Upper-case a string.
    Upper,
    /// Lower-case a string.
    Lower,
    /// Strip leading and trailing spaces.
    Trim,
    /// Character length.
    Length,
    /// Substring by 1-based start and length.
    Substring,
    /// Replace all occurrences.
    Replace,
    /// Absolute value.
    Abs,
    /// Round to a number of decimal places.
    Round,
    /// Smallest integer not less than the argument.
    Ceiling,
    /// Largest integer not greater than the argument.
    Floor,
    /// Current timestamp.
    Now,
    /// Year component of a timestamp.
    Year,
    /// Month component of a timestamp.
    Month,
    /// Day-of-month component of a timestamp.
    Day,
    /// Timestamp shifted by a number of days.
    AddDays,
    /// Freshly generated UUID.
    NewGuid,
    /// First non-NULL argument.
    Coalesce,
    /// Regular expression match.
    RegexMatch,
}

impl ScalarFunction {
    /// Human-readable name, used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Upper => "UPPER",
            Self::Lower => "LOWER",
            Self::Trim => "TRIM",
            Self::Length => "LENGTH",
            Self::Substring => "SUBSTRING",
            Self::Replace => "REPLACE",
            Self::Abs => "ABS",
            Self::Round => "ROUND",
            Self::Ceiling => "CEILING",
            Self::Floor => "FLOOR",
            Self::Now => "NOW",
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::AddDays => "ADD_DAYS",
            Self::NewGuid => "NEW_GUID",
            Self::Coalesce => "COALESCE",
            Self::RegexMatch => "regular expression match",
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// COUNT.
    Count,
    /// SUM.
    Sum,
    /// AVG.
    Avg,
    /// MIN.
    Min,
    /// MAX.
    Max,
}

impl AggregateFunction {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// An untyped expression node.
///
/// [`Expr<T>`](super::Expr) wraps one of these with its result type. The
/// compiler works on the untyped form.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// Literal value.
    Literal(SqlValue),
    /// Table column reference.
    Column {
        /// Table name or alias; `None` renders the bare column name.
        table: Option<String>,
        /// Column name.
        name: String,
        /// Set when an outer join may null-extend the column.
        null_extended: bool,
    },
    /// Reference to a column of a derived table.
    Projection {
        /// The derived table.
        scope: ScopeId,
        /// Column alias inside the derived table.
        name: String,
        /// Set when the referenced column may be NULL.
        null_extended: bool,
    },
    /// Named placeholder with a default value.
    Parameter {
        /// Name without the dialect prefix.
        name: String,
        /// Value bound unless re-bound after compilation.
        default: SqlValue,
    },
    /// Unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<ExprNode>,
    },
    /// Binary operation.
    Binary {
        /// Left operand.
        left: Box<ExprNode>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<ExprNode>,
    },
    /// Scalar function call.
    Function {
        /// Function.
        func: ScalarFunction,
        /// Arguments.
        args: Vec<ExprNode>,
    },
    /// Searched CASE.
    Case {
        /// `WHEN condition THEN value` pairs.
        branches: Vec<(ExprNode, ExprNode)>,
        /// ELSE value; `None` yields NULL.
        otherwise: Option<Box<ExprNode>>,
    },
    /// Aggregate over the rows of the current group.
    Aggregate {
        /// Aggregate function.
        func: AggregateFunction,
        /// Argument; `None` means `*`.
        arg: Option<Box<ExprNode>>,
        /// DISTINCT aggregate.
        distinct: bool,
    },
    /// Aggregate over a whole query, compiled as a scalar subquery.
    QueryAggregate {
        /// Aggregate function.
        func: AggregateFunction,
        /// Result family.
        kind: SqlKind,
        /// The aggregated query.
        source: Arc<QueryNode>,
        /// Argument evaluated against the source row; `None` aggregates the
        /// single projected column (or `*` for COUNT).
        arg: Option<Box<ExprNode>>,
    },
    /// Scalar subquery.
    Subquery(Arc<QueryNode>),
    /// EXISTS / NOT EXISTS.
    Exists {
        /// The subquery tested for rows.
        query: Arc<QueryNode>,
        /// NOT EXISTS.
        negated: bool,
    },
    /// `expr [NOT] IN (list)`.
    InList {
        /// Tested expression.
        expr: Box<ExprNode>,
        /// Candidates.
        list: Vec<ExprNode>,
        /// NOT IN.
        negated: bool,
    },
    /// `expr [NOT] IN (subquery)`.
    InQuery {
        /// Tested expression.
        expr: Box<ExprNode>,
        /// Single-column query.
        query: Arc<QueryNode>,
        /// NOT IN.
        negated: bool,
    },
    /// `expr [NOT] BETWEEN low AND high`.
    Between {
        /// Tested expression.
        expr: Box<ExprNode>,
        /// Lower bound.
        low: Box<ExprNode>,
        /// Upper bound.
        high: Box<ExprNode>,
        /// NOT BETWEEN.
        negated: bool,
    },
    /// `expr IS [NOT] NULL`.
    IsNull {
        /// Tested expression.
        expr: Box<ExprNode>,
        /// IS NOT NULL.
        negated: bool,
    },
    /// `CAST(expr AS type)`.
    Cast {
        /// Converted expression.
        expr: Box<ExprNode>,
        /// Target family.
        target: SqlKind,
    },
}

impl ExprNode {
    /// Builds a binary node.
    #[must_use]
    pub fn binary(left: Self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Builds a unary node.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Returns true if the node yields a truth value rather than a plain
    /// boolean value. Dialects without native booleans render the two
    /// differently.
    #[must_use]
    pub fn is_predicate(&self) -> bool {
        match self {
            Self::Binary { op, .. } => op.is_predicate(),
            Self::Unary { op, .. } => matches!(op, UnaryOp::Not),
            Self::Function { func, .. } => matches!(func, ScalarFunction::RegexMatch),
            Self::Exists { .. }
            | Self::InList { .. }
            | Self::InQuery { .. }
            | Self::Between { .. }
            | Self::IsNull { .. } => true,
            _ => false,
        }
    }

    /// Returns true if the node is a leaf reference (column or projection).
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Column { .. } | Self::Projection { .. })
    }

    /// Returns true if any column reference within the node may have been
    /// null-extended by an outer join. Subqueries are not inspected.
    #[must_use]
    pub fn is_null_extended(&self) -> bool {
        let mut found = false;
        self.walk(&mut |node| {
            if let Self::Column { null_extended, .. } | Self::Projection { null_extended, .. } =
                node
            {
                found |= *null_extended;
            }
        });
        found
    }

    /// Returns a copy of a reference node marked as null-extended. Other
    /// nodes are returned unchanged.
    #[must_use]
    pub fn null_extend(&self) -> Self {
        match self {
            Self::Column { table, name, .. } => Self::Column {
                table: table.clone(),
                name: name.clone(),
                null_extended: true,
            },
            Self::Projection { scope, name, .. } => Self::Projection {
                scope: *scope,
                name: name.clone(),
                null_extended: true,
            },
            other => other.clone(),
        }
    }

    /// Returns true if any column reference within the node uses one of the
    /// given table qualifiers.
    #[must_use]
    pub fn references_any(&self, qualifiers: &[String]) -> bool {
        let mut found = false;
        self.walk(&mut |node| {
            if let Self::Column {
                table: Some(table), ..
            } = node
            {
                found |= qualifiers.iter().any(|q| q == table);
            }
        });
        found
    }

    /// Visits this node and its descendants in pre-order, without entering
    /// subqueries.
    pub fn walk(&self, visit: &mut dyn FnMut(&Self)) {
        visit(self);
        match self {
            Self::Literal(_)
            | Self::Column { .. }
            | Self::Projection { .. }
            | Self::Parameter { .. }
            | Self::Subquery(_)
            | Self::Exists { .. } => {}
            Self::Unary { operand, .. } => operand.walk(visit),
            Self::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Self::Function { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Self::Case {
                branches,
                otherwise,
            } => {
                for (when, then) in branches {
                    when.walk(visit);
                    then.walk(visit);
                }
                if let Some(otherwise) = otherwise {
                    otherwise.walk(visit);
                }
            }
            Self::Aggregate { arg, .. } | Self::QueryAggregate { arg, .. } => {
                if let Some(arg) = arg {
                    arg.walk(visit);
                }
            }
            Self::InList { expr, list, .. } => {
                expr.walk(visit);
                for item in list {
                    item.walk(visit);
                }
            }
            Self::InQuery { expr, .. } | Self::IsNull { expr, .. } | Self::Cast { expr, .. } => {
                expr.walk(visit);
            }
            Self::Between {
                expr, low, high, ..
            } => {
                expr.walk(visit);
                low.walk(visit);
                high.walk(visit);
            }
        }
    }
}
