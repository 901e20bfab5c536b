//! The contract every rewrite rule implements

use std::collections::HashSet;

use crate::error::RuleFailure;
use crate::fragment::Fragment;
use crate::node::{NodeId, NodeKind};
use crate::query::{self, ControllerContext, TypeResolution, TypeResolver};
use crate::tree::SyntaxTree;

/// What a rule sees while handling one node
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub tree: &'a SyntaxTree,
    pub source: &'a str,
    pub resolver: &'a dyn TypeResolver,
    pub controllers: &'a dyn ControllerContext,
}

impl<'a> RuleContext<'a> {
    pub fn is_of_declared_type(&self, node: NodeId, type_query: &str) -> bool {
        query::is_of_declared_type(self.tree, node, type_query, self.resolver)
    }

    pub fn resolve(&self, node: NodeId, type_query: &str) -> Option<TypeResolution> {
        self.resolver.resolve(self.tree, node, type_query)
    }

    pub fn is_controller_context(&self, node: NodeId) -> bool {
        self.controllers.is_controller_context(self.tree, node)
    }

    /// Source text of a parsed node
    pub fn text(&self, node: NodeId) -> Option<&'a str> {
        self.tree.text(node, self.source)
    }
}

#[derive(Debug, Clone)]
pub enum ReplacementAction {
    /// Put the fragment's roots where the target was
    Replace(Fragment),
    /// Remove the target from its list
    Delete,
}

/// A proposed substitution for one node
#[derive(Debug, Clone)]
pub struct Replacement {
    pub target: NodeId,
    pub action: ReplacementAction,
    /// Shown in reports instead of the rule description
    pub message: Option<String>,
}

impl Replacement {
    pub fn replace(target: NodeId, fragment: Fragment) -> Self {
        Self {
            target,
            action: ReplacementAction::Replace(fragment),
            message: None,
        }
    }

    pub fn delete(target: NodeId) -> Self {
        Self {
            target,
            action: ReplacementAction::Delete,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A rewrite rule
///
/// `apply` is offered every node whose kind is in `interested_kinds`. It
/// returns `Ok(None)` when the node does not match, including when the node
/// already has the shape the rule produces.
pub trait Rule: Send + Sync {
    /// The unique identifier for this rule (e.g., "status_code_setter")
    fn name(&self) -> &'static str;

    /// A short description of what this rule does
    fn description(&self) -> &'static str;

    /// Node kinds this rule wants to be offered
    fn interested_kinds(&self) -> &[NodeKind];

    fn apply(
        &self,
        ctx: &RuleContext<'_>,
        node: NodeId,
    ) -> Result<Option<Replacement>, RuleFailure>;

    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            name: self.name(),
            description: self.description(),
            kinds: self.interested_kinds().iter().copied().collect(),
        }
    }
}

/// Static facts about a rule, captured once at registration
#[derive(Debug, Clone)]
pub struct RuleDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub kinds: HashSet<NodeKind>,
}

impl RuleDescriptor {
    pub fn is_interested_in(&self, kind: NodeKind) -> bool {
        self.kinds.contains(&kind)
    }
}
