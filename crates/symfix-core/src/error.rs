//! Error taxonomy for a single-file rewrite

use thiserror::Error;

use crate::edit::EditError;
use crate::text::{offset_to_line_column, TextRange};

/// Unparseable input. No tree is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at line {line}, column {column}: {message}")]
pub struct SyntaxError {
    /// Byte offset of the offending token
    pub position: usize,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(source: &str, position: usize, message: impl Into<String>) -> Self {
        let (line, column) = offset_to_line_column(source, position);
        Self {
            position,
            line,
            column,
            message: message.into(),
        }
    }
}

/// Error type rules may return from `apply`
pub type RuleFailure = Box<dyn std::error::Error + Send + Sync>;

/// A rule failed while handling a node; the whole file is abandoned
#[derive(Error, Debug)]
#[error("rule '{rule_name}' failed at {}: {cause}", display_range(.node_range))]
pub struct RuleExecutionError {
    pub rule_name: String,
    /// Source range of the offered node, `None` for constructed nodes
    pub node_range: Option<TextRange>,
    #[source]
    pub cause: RuleFailure,
}

/// Two replacements touched overlapping source in the same pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rule '{rule_name}' tried to replace {range}, which overlaps already rewritten {existing}")]
pub struct ReplacementConflictError {
    pub rule_name: String,
    pub range: TextRange,
    pub existing: TextRange,
}

/// Any failure of a rewrite invocation
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    RuleExecution(#[from] RuleExecutionError),

    #[error(transparent)]
    ReplacementConflict(#[from] ReplacementConflictError),

    #[error("failed to print rewritten source: {0}")]
    Print(#[from] EditError),
}

fn display_range(range: &Option<TextRange>) -> String {
    match range {
        Some(range) => range.to_string(),
        None => "<constructed node>".to_string(),
    }
}
