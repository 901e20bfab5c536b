//! Rule: status_code_constructor
//!
//! Replaces the status argument of response constructors with a
//! `Response::HTTP_*` constant.
//!
//! Example:
//! ```php
//! // Before
//! return new JsonResponse(['error' => 'gone'], 410);
//!
//! // After
//! return new JsonResponse(['error' => 'gone'], Response::HTTP_GONE);
//! ```

use std::sync::Arc;

use symfix_core::query::{argument_value, named_argument_value, short_name};
use symfix_core::{Node, NodeId, NodeKind, Replacement, Rule, RuleContext, RuleFailure};

use crate::status_codes::StatusCodeTable;

/// Response classes whose second constructor parameter is the status
const RESPONSE_CLASSES: &[&str] = &[
    "Response",
    "JsonResponse",
    "RedirectResponse",
    "BinaryFileResponse",
    "StreamedResponse",
    "StreamedJsonResponse",
];

pub struct StatusCodeConstructorRule {
    table: Arc<StatusCodeTable>,
}

impl StatusCodeConstructorRule {
    pub fn new(table: Arc<StatusCodeTable>) -> Self {
        Self { table }
    }
}

impl Default for StatusCodeConstructorRule {
    fn default() -> Self {
        Self::new(Arc::new(StatusCodeTable::symfony()))
    }
}

impl Rule for StatusCodeConstructorRule {
    fn name(&self) -> &'static str {
        "status_code_constructor"
    }

    fn description(&self) -> &'static str {
        "Use Response::HTTP_* constants in response constructors"
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::New]
    }

    fn apply(&self, ctx: &RuleContext<'_>, node: NodeId) -> Result<Option<Replacement>, RuleFailure> {
        let Node::New { class, .. } = ctx.tree.node(node) else {
            return Ok(None);
        };
        let Node::Name { name } = ctx.tree.node(*class) else {
            return Ok(None);
        };
        if !RESPONSE_CLASSES.contains(&short_name(name)) {
            return Ok(None);
        }

        let status = argument_value(ctx.tree, node, 1)
            .or_else(|| named_argument_value(ctx.tree, node, "status"));
        match status {
            Some(status) => self.table.replace_literal(ctx, status),
            None => Ok(None),
        }
    }
}
