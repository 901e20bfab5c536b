//! Rule: add_return_type (Configurable)
//!
//! Adds a return type to overridden methods whose parent now declares one.
//!
//! Example (default entry `Command::execute(): int`):
//! ```php
//! // Before
//! class ImportCommand extends Command
//! {
//!     protected function execute(InputInterface $input, OutputInterface $output)
//!     {
//!         return Command::SUCCESS;
//!     }
//! }
//!
//! // After
//! class ImportCommand extends Command
//! {
//!     protected function execute(InputInterface $input, OutputInterface $output): int
//!     {
//!         return Command::SUCCESS;
//!     }
//! }
//! ```
//!
//! Methods that already declare a return type are left alone, whatever the
//! declared type is.

use symfix_core::query::{class_name_of, enclosing_class, extends_matches, name_matches};
use symfix_core::{
    FragmentBuilder, Node, NodeId, NodeKind, Replacement, Rule, RuleContext, RuleFailure,
};

use crate::rule_set::ReturnTypeEntry;

pub struct AddReturnTypeRule {
    entries: Vec<ReturnTypeEntry>,
}

impl AddReturnTypeRule {
    pub fn new() -> Self {
        Self::with_entries(crate::RuleSet::default().return_types)
    }

    pub fn with_entries(entries: Vec<ReturnTypeEntry>) -> Self {
        Self { entries }
    }

    fn entry_for(&self, ctx: &RuleContext<'_>, method: NodeId) -> Option<&ReturnTypeEntry> {
        let name = class_name_of(ctx.tree, method)?.to_ascii_lowercase();
        if name.starts_with("__") {
            return None;
        }
        let class = enclosing_class(ctx.tree, method)?;
        self.entries.iter().find(|entry| {
            name_matches(&name, &entry.method.to_ascii_lowercase())
                && extends_matches(ctx.tree, class, &entry.parent)
        })
    }
}

impl Default for AddReturnTypeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for AddReturnTypeRule {
    fn name(&self) -> &'static str {
        "add_return_type"
    }

    fn description(&self) -> &'static str {
        "Add return types required by parent class signatures"
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::MethodDecl]
    }

    fn apply(&self, ctx: &RuleContext<'_>, node: NodeId) -> Result<Option<Replacement>, RuleFailure> {
        let Node::MethodDecl {
            modifiers,
            by_ref,
            name,
            params,
            return_type: None,
            body,
        } = ctx.tree.node(node)
        else {
            return Ok(None);
        };
        let Some(entry) = self.entry_for(ctx, node) else {
            return Ok(None);
        };

        let mut builder = FragmentBuilder::new();
        let name_copy = builder.copy_of(ctx.tree, *name);
        let params = params
            .iter()
            .map(|param| builder.copy_of(ctx.tree, *param))
            .collect();
        let body = body.map(|body| builder.copy_of(ctx.tree, body));
        let return_type = builder.simple_type(&entry.return_type);
        let method = builder.push(Node::MethodDecl {
            modifiers: modifiers.clone(),
            by_ref: *by_ref,
            name: name_copy,
            params,
            return_type: Some(return_type),
            body,
        });

        let method_name = class_name_of(ctx.tree, node).unwrap_or_default();
        Ok(Some(
            Replacement::replace(node, builder.finish(method)?).with_message(format!(
                "Add return type {} to {}()",
                entry.return_type, method_name
            )),
        ))
    }
}
