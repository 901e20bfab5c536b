//! Rule: status_code_comparison
//!
//! Replaces status code literals compared against `getStatusCode()`.
//!
//! Example:
//! ```php
//! // Before
//! if ($response->getStatusCode() === 200) {}
//! if (404 !== $response->getStatusCode()) {}
//!
//! // After
//! if ($response->getStatusCode() === Response::HTTP_OK) {}
//! if (Response::HTTP_NOT_FOUND !== $response->getStatusCode()) {}
//! ```

use std::sync::Arc;

use symfix_core::query::method_call_name;
use symfix_core::{Node, NodeId, NodeKind, Replacement, Rule, RuleContext, RuleFailure};

use crate::status_codes::StatusCodeTable;

pub struct StatusCodeComparisonRule {
    table: Arc<StatusCodeTable>,
}

impl StatusCodeComparisonRule {
    pub fn new(table: Arc<StatusCodeTable>) -> Self {
        Self { table }
    }

    /// `$response->getStatusCode()` on a receiver of the status class
    fn is_status_getter(&self, ctx: &RuleContext<'_>, node: NodeId) -> bool {
        let Node::MethodCall { object, .. } = ctx.tree.node(node) else {
            return false;
        };
        method_call_name(ctx.tree, node)
            .is_some_and(|name| name.eq_ignore_ascii_case("getStatusCode"))
            && ctx.is_of_declared_type(*object, self.table.short_class_name())
    }
}

impl Default for StatusCodeComparisonRule {
    fn default() -> Self {
        Self::new(Arc::new(StatusCodeTable::symfony()))
    }
}

impl Rule for StatusCodeComparisonRule {
    fn name(&self) -> &'static str {
        "status_code_comparison"
    }

    fn description(&self) -> &'static str {
        "Use Response::HTTP_* constants in getStatusCode() comparisons"
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::BinaryOp]
    }

    fn apply(&self, ctx: &RuleContext<'_>, node: NodeId) -> Result<Option<Replacement>, RuleFailure> {
        let Node::BinaryOp { op, left, right } = ctx.tree.node(node) else {
            return Ok(None);
        };
        if !op.is_equality() {
            return Ok(None);
        }

        let literal = if self.is_status_getter(ctx, *left) {
            *right
        } else if self.is_status_getter(ctx, *right) {
            *left
        } else {
            return Ok(None);
        };
        self.table.replace_literal(ctx, literal)
    }
}
