//! Rule: status_code_setter
//!
//! Replaces the integer passed to `Response::setStatusCode()` with the
//! matching `Response::HTTP_*` constant.
//!
//! Example:
//! ```php
//! // Before
//! $response = new Response();
//! $response->setStatusCode(404);
//!
//! // After
//! $response = new Response();
//! $response->setStatusCode(Response::HTTP_NOT_FOUND);
//! ```
//!
//! The receiver must resolve to `Response` or a subclass; calls on values of
//! unknown type are left alone.

use std::sync::Arc;

use symfix_core::query::{argument_value, method_call_name};
use symfix_core::{Node, NodeId, NodeKind, Replacement, Rule, RuleContext, RuleFailure};

use crate::status_codes::StatusCodeTable;

pub struct StatusCodeSetterRule {
    table: Arc<StatusCodeTable>,
}

impl StatusCodeSetterRule {
    pub fn new(table: Arc<StatusCodeTable>) -> Self {
        Self { table }
    }
}

impl Default for StatusCodeSetterRule {
    fn default() -> Self {
        Self::new(Arc::new(StatusCodeTable::symfony()))
    }
}

impl Rule for StatusCodeSetterRule {
    fn name(&self) -> &'static str {
        "status_code_setter"
    }

    fn description(&self) -> &'static str {
        "Use Response::HTTP_* constants in setStatusCode()"
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::MethodCall]
    }

    fn apply(&self, ctx: &RuleContext<'_>, node: NodeId) -> Result<Option<Replacement>, RuleFailure> {
        let is_setter = method_call_name(ctx.tree, node)
            .is_some_and(|name| name.eq_ignore_ascii_case("setStatusCode"));
        if !is_setter {
            return Ok(None);
        }
        let Node::MethodCall { object, .. } = ctx.tree.node(node) else {
            return Ok(None);
        };
        if !ctx.is_of_declared_type(*object, self.table.short_class_name()) {
            return Ok(None);
        }
        let Some(code) = argument_value(ctx.tree, node, 0) else {
            return Ok(None);
        };
        self.table.replace_literal(ctx, code)
    }
}
