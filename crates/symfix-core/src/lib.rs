//! symfix-core: format-preserving structural rewriting of PHP sources
//!
//! This crate provides:
//! - `SourceFile`: the original text plus a concrete syntax tree that keeps
//!   every byte of trivia
//! - `Rule`: the contract rewrite rules implement, and `FragmentBuilder` for
//!   the replacement subtrees they return
//! - `Dispatcher`: single pass, first-match-wins rule application
//! - `print()`: renders a rewritten tree, untouched regions byte for byte
//! - `Engine`: parse, dispatch and print in one call

mod edit;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod printer;
pub mod query;
pub mod rule;
pub mod source;
pub mod text;
pub mod tree;

pub use dispatcher::{apply_replacements, AppliedChange, Dispatcher, DEFAULT_VISIT_BUDGET};
pub use edit::{apply_edits, Edit, EditError};
pub use engine::{Engine, EngineConfig, RewriteOutput};
pub use error::{
    ReplacementConflictError, RewriteError, RuleExecutionError, RuleFailure, SyntaxError,
};
pub use fragment::{Fragment, FragmentBuilder, FragmentError};
pub use node::{ListKind, Node, NodeId, NodeKind};
pub use printer::{print, PrinterConfig};
pub use query::{
    is_of_declared_type, matches_kind, name_matches, ControllerContext, NoControllers, NoTypes,
    TypeResolution, TypeResolver,
};
pub use rule::{Replacement, ReplacementAction, Rule, RuleContext, RuleDescriptor};
pub use source::SourceFile;
pub use text::TextRange;
pub use tree::{Origin, ShapeError, SyntaxTree};
