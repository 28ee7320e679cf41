//! Compilation options.

use serde::{Deserialize, Serialize};

/// How literal values reach the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralMode {
    /// Each literal becomes a numbered placeholder (default).
    #[default]
    Parameterized,
    /// Literals are rendered inline, quoted and escaped for the dialect.
    /// Named parameters still bind.
    Inline,
}

/// When identifiers are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotePolicy {
    /// Only reserved words and identifiers with unusual characters (default).
    #[default]
    WhenNeeded,
    /// Every table, column and alias name.
    Always,
}

/// Options controlling how a query is compiled.
///
/// Deserializes with every field optional, so a configuration file only
/// needs to name what it changes:
///
/// ```
/// use querycraft_core::compiler::{CompileOptions, LiteralMode};
///
/// let options = CompileOptions::default().with_literals(LiteralMode::Inline);
/// assert!(options.fuse_filters);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Literal rendering.
    pub literals: LiteralMode,
    /// Fuse consecutive filters into one WHERE. When false, each extra
    /// filter over a plain table nests the earlier ones in a derived table.
    pub fuse_filters: bool,
    /// Identifier quoting.
    pub quote_identifiers: QuotePolicy,
    /// Qualify UPDATE SET targets with the table name.
    pub qualify_update_targets: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            literals: LiteralMode::Parameterized,
            fuse_filters: true,
            quote_identifiers: QuotePolicy::WhenNeeded,
            qualify_update_targets: true,
        }
    }
}

impl CompileOptions {
    /// Sets the literal mode.
    #[must_use]
    pub const fn with_literals(mut self, literals: LiteralMode) -> Self {
        self.literals = literals;
        self
    }

    /// Enables or disables filter fusion.
    #[must_use]
    pub const fn with_fuse_filters(mut self, fuse: bool) -> Self {
        self.fuse_filters = fuse;
        self
    }

    /// Sets the identifier quoting policy.
    #[must_use]
    pub const fn with_quote_identifiers(mut self, policy: QuotePolicy) -> Self {
        self.quote_identifiers = policy;
        self
    }

    /// Enables or disables qualified UPDATE SET targets.
    #[must_use]
    pub const fn with_qualify_update_targets(mut self, qualify: bool) -> Self {
        self.qualify_update_targets = qualify;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.literals, LiteralMode::Parameterized);
        assert!(options.fuse_filters);
        assert_eq!(options.quote_identifiers, QuotePolicy::WhenNeeded);
        assert!(options.qualify_update_targets);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let options: CompileOptions =
            serde_json::from_str(r#"{"literals": "inline", "quote_identifiers": "always"}"#)
                .unwrap();
        assert_eq!(options.literals, LiteralMode::Inline);
        assert_eq!(options.quote_identifiers, QuotePolicy::Always);
        assert!(options.fuse_filters);
    }
}
