//! Rule: status_code_assertion
//!
//! Replaces status code literals in test assertions with
//! `Response::HTTP_*` constants.
//!
//! Example:
//! ```php
//! // Before
//! $this->assertResponseStatusCodeSame(403);
//! self::assertSame(200, $client->getResponse()->getStatusCode());
//!
//! // After
//! $this->assertResponseStatusCodeSame(Response::HTTP_FORBIDDEN);
//! self::assertSame(Response::HTTP_OK, $client->getResponse()->getStatusCode());
//! ```
//!
//! Only applies inside test classes: a class named `*Test`, or one that
//! extends a `*TestCase`.

use std::sync::Arc;

use symfix_core::query::{
    argument_value, class_name_of, enclosing_class, identifier_text, is_this, method_call_name,
    name_matches, short_name,
};
use symfix_core::{
    Node, NodeId, NodeKind, Replacement, Rule, RuleContext, RuleFailure, SyntaxTree,
};

use crate::status_codes::StatusCodeTable;

/// Assertions whose expected value is compared to `getStatusCode()`
const EQUALITY_ASSERTIONS: &[&str] = &["assertSame", "assertEquals"];

#[derive(Debug, Clone)]
pub struct StatusCodeAssertionConfig {
    /// Method name patterns, `*` suffix allowed
    pub assertion_methods: Vec<String>,
}

impl Default for StatusCodeAssertionConfig {
    fn default() -> Self {
        Self {
            assertion_methods: crate::RuleSet::default().assertion_methods,
        }
    }
}

pub struct StatusCodeAssertionRule {
    table: Arc<StatusCodeTable>,
    config: StatusCodeAssertionConfig,
}

impl StatusCodeAssertionRule {
    pub fn new(table: Arc<StatusCodeTable>) -> Self {
        Self::with_config(table, StatusCodeAssertionConfig::default())
    }

    pub fn with_config(table: Arc<StatusCodeTable>, config: StatusCodeAssertionConfig) -> Self {
        Self { table, config }
    }

    fn is_status_assertion(&self, method: &str) -> bool {
        self.config
            .assertion_methods
            .iter()
            .any(|pattern| name_matches(method, pattern))
    }
}

impl Default for StatusCodeAssertionRule {
    fn default() -> Self {
        Self::new(Arc::new(StatusCodeTable::symfony()))
    }
}

impl Rule for StatusCodeAssertionRule {
    fn name(&self) -> &'static str {
        "status_code_assertion"
    }

    fn description(&self) -> &'static str {
        "Use Response::HTTP_* constants in status code assertions"
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::MethodCall, NodeKind::StaticCall]
    }

    fn apply(&self, ctx: &RuleContext<'_>, node: NodeId) -> Result<Option<Replacement>, RuleFailure> {
        if !is_own_call(ctx.tree, node) || !in_test_case(ctx.tree, node) {
            return Ok(None);
        }
        let Some(method) = method_call_name(ctx.tree, node) else {
            return Ok(None);
        };

        let status_assertion = self.is_status_assertion(method);
        let compares_status = EQUALITY_ASSERTIONS.contains(&method)
            && argument_value(ctx.tree, node, 1)
                .is_some_and(|actual| is_get_status_code(ctx.tree, actual));
        if !status_assertion && !compares_status {
            return Ok(None);
        }

        let Some(expected) = argument_value(ctx.tree, node, 0) else {
            return Ok(None);
        };
        self.table.replace_literal(ctx, expected)
    }
}

/// `$this->x()`, `self::x()` or `static::x()`
fn is_own_call(tree: &SyntaxTree, node: NodeId) -> bool {
    match tree.node(node) {
        Node::MethodCall { object, .. } => is_this(tree, *object),
        Node::StaticCall { class, .. } => identifier_text(tree, *class).is_some_and(|class| {
            class.eq_ignore_ascii_case("self") || class.eq_ignore_ascii_case("static")
        }),
        _ => false,
    }
}

fn in_test_case(tree: &SyntaxTree, node: NodeId) -> bool {
    let Some(class) = enclosing_class(tree, node) else {
        return false;
    };
    if class_name_of(tree, class).is_some_and(|name| name.ends_with("Test")) {
        return true;
    }
    match tree.node(class) {
        Node::ClassDecl {
            extends: Some(parent),
            ..
        } => identifier_text(tree, *parent)
            .is_some_and(|parent| short_name(parent).ends_with("TestCase")),
        _ => false,
    }
}

fn is_get_status_code(tree: &SyntaxTree, node: NodeId) -> bool {
    tree.kind(node) == NodeKind::MethodCall
        && method_call_name(tree, node)
            .is_some_and(|name| name.eq_ignore_ascii_case("getStatusCode"))
}
