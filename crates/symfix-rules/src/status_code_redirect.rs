//! Rule: status_code_redirect
//!
//! Replaces the status argument of controller redirect helpers with a
//! `Response::HTTP_*` constant.
//!
//! Example:
//! ```php
//! // Before
//! return $this->redirect('/login', 301);
//! return $this->redirectToRoute('home', [], status: 303);
//!
//! // After
//! return $this->redirect('/login', Response::HTTP_MOVED_PERMANENTLY);
//! return $this->redirectToRoute('home', [], status: Response::HTTP_SEE_OTHER);
//! ```

use std::sync::Arc;

use symfix_core::query::{argument_value, is_this, method_call_name, named_argument_value};
use symfix_core::{Node, NodeId, NodeKind, Replacement, Rule, RuleContext, RuleFailure};

use crate::status_codes::StatusCodeTable;

/// Helper name and the position of its status parameter
const REDIRECT_HELPERS: &[(&str, usize)] = &[("redirect", 1), ("redirectToRoute", 2)];

pub struct StatusCodeRedirectRule {
    table: Arc<StatusCodeTable>,
}

impl StatusCodeRedirectRule {
    pub fn new(table: Arc<StatusCodeTable>) -> Self {
        Self { table }
    }
}

impl Default for StatusCodeRedirectRule {
    fn default() -> Self {
        Self::new(Arc::new(StatusCodeTable::symfony()))
    }
}

impl Rule for StatusCodeRedirectRule {
    fn name(&self) -> &'static str {
        "status_code_redirect"
    }

    fn description(&self) -> &'static str {
        "Use Response::HTTP_* constants in controller redirects"
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::MethodCall]
    }

    fn apply(&self, ctx: &RuleContext<'_>, node: NodeId) -> Result<Option<Replacement>, RuleFailure> {
        let Node::MethodCall { object, .. } = ctx.tree.node(node) else {
            return Ok(None);
        };
        if !is_this(ctx.tree, *object) {
            return Ok(None);
        }
        let Some(method) = method_call_name(ctx.tree, node) else {
            return Ok(None);
        };
        let Some(position) = REDIRECT_HELPERS
            .iter()
            .find(|(helper, _)| method.eq_ignore_ascii_case(helper))
            .map(|(_, position)| *position)
        else {
            return Ok(None);
        };
        if !ctx.is_controller_context(node) {
            return Ok(None);
        }

        let status = argument_value(ctx.tree, node, position)
            .or_else(|| named_argument_value(ctx.tree, node, "status"));
        match status {
            Some(status) => self.table.replace_literal(ctx, status),
            None => Ok(None),
        }
    }
}
