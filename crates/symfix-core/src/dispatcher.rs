//! Single-pass rule dispatcher
//!
//! Walks the tree in pre-order and offers each node to the rules interested
//! in its kind, in registration order. The first rule returning a
//! replacement wins the node. Replacement subtrees are walked too, so rules
//! see each other's output, up to the visit budget.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{ReplacementConflictError, RewriteError, RuleExecutionError, RuleFailure};
use crate::node::NodeId;
use crate::query::{ControllerContext, TypeResolver};
use crate::rule::{ReplacementAction, Replacement, Rule, RuleContext, RuleDescriptor};
use crate::source::SourceFile;
use crate::text::TextRange;
use crate::tree::{Origin, SyntaxTree};

pub const DEFAULT_VISIT_BUDGET: u8 = 2;

/// One accepted replacement, for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedChange {
    pub rule: String,
    /// Source span that was rewritten, `None` inside constructed code
    pub range: Option<TextRange>,
    pub message: String,
}

pub struct Dispatcher<'r> {
    rules: Vec<(&'r dyn Rule, RuleDescriptor)>,
    visit_budget: u8,
}

impl<'r> Dispatcher<'r> {
    pub fn new(rules: &[&'r dyn Rule], visit_budget: u8) -> Self {
        Self {
            rules: rules.iter().map(|rule| (*rule, rule.descriptor())).collect(),
            visit_budget,
        }
    }

    /// Run every rule over the file's tree, mutating it in place
    pub fn run(
        &self,
        file: &mut SourceFile,
        resolver: &dyn TypeResolver,
        controllers: &dyn ControllerContext,
    ) -> Result<Vec<AppliedChange>, RewriteError> {
        let mut state = PassState::default();
        let mut stack = vec![file.tree.root()];

        while let Some(id) = stack.pop() {
            if !file.tree.is_attached(id) {
                continue;
            }

            let Some((rule, replacement)) = self.offer(file, id, resolver, controllers)? else {
                push_children(&file.tree, id, &mut stack);
                continue;
            };

            let target = replacement.target;
            let replaces_self_or_ancestor =
                target == id || (contains(&file.tree, target) && file.tree.is_ancestor_of(target, id));
            let replaces_descendant =
                contains(&file.tree, target) && file.tree.is_ancestor_of(id, target);

            let node_range = file.tree.range(id);
            let new_roots = apply_one(file, &rule, replacement, &mut state)
                .map_err(|err| err.into_rewrite_error(&rule, node_range))?;

            if replaces_self_or_ancestor {
                stack.extend(new_roots.iter().rev());
            } else {
                if !replaces_descendant {
                    stack.extend(new_roots.iter().rev());
                }
                push_children(&file.tree, id, &mut stack);
            }
        }

        Ok(state.changes)
    }

    fn offer(
        &self,
        file: &SourceFile,
        id: NodeId,
        resolver: &dyn TypeResolver,
        controllers: &dyn ControllerContext,
    ) -> Result<Option<(RuleDescriptor, Replacement)>, RewriteError> {
        let kind = file.tree.kind(id);
        let mut interested = self
            .rules
            .iter()
            .filter(|(_, descriptor)| descriptor.is_interested_in(kind))
            .peekable();
        if interested.peek().is_none() {
            return Ok(None);
        }

        let generation = file.tree.data(id).generation;
        if generation >= self.visit_budget {
            warn!(
                ?kind,
                generation,
                budget = self.visit_budget,
                "visit budget exhausted, node not offered to rules"
            );
            return Ok(None);
        }

        let ctx = RuleContext {
            tree: &file.tree,
            source: &file.text,
            resolver,
            controllers,
        };

        for (rule, descriptor) in interested {
            trace!(rule = descriptor.name, ?kind, node = %id, "offering node");
            match rule.apply(&ctx, id) {
                Ok(Some(replacement)) => return Ok(Some((descriptor.clone(), replacement))),
                Ok(None) => {}
                Err(cause) => {
                    return Err(RuleExecutionError {
                        rule_name: descriptor.name.to_string(),
                        node_range: file.tree.range(id),
                        cause,
                    }
                    .into());
                }
            }
        }
        Ok(None)
    }
}

fn push_children(tree: &SyntaxTree, id: NodeId, stack: &mut Vec<NodeId>) {
    stack.extend(tree.children(id).into_iter().rev());
}

fn contains(tree: &SyntaxTree, id: NodeId) -> bool {
    id.index() < tree.len()
}

#[derive(Default)]
struct PassState {
    /// Source spans rewritten so far in this pass
    rewritten: Vec<TextRange>,
    changes: Vec<AppliedChange>,
}

enum ApplyError {
    Conflict(ReplacementConflictError),
    Invalid(RuleFailure),
}

impl ApplyError {
    fn into_rewrite_error(self, rule: &RuleDescriptor, node_range: Option<TextRange>) -> RewriteError {
        match self {
            ApplyError::Conflict(conflict) => conflict.into(),
            ApplyError::Invalid(cause) => RuleExecutionError {
                rule_name: rule.name.to_string(),
                node_range,
                cause,
            }
            .into(),
        }
    }
}

/// The span a node stands for: its own range, its slot, or the nearest
/// ancestor's
fn effective_range(tree: &SyntaxTree, id: NodeId) -> TextRange {
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .find_map(|node| {
            let data = tree.data(node);
            data.slot.or(data.range)
        })
        .unwrap_or(TextRange::new(0, 0))
}

fn check_conflicts(
    tree: &SyntaxTree,
    rule: &RuleDescriptor,
    target: NodeId,
    state: &PassState,
) -> Result<(), ApplyError> {
    let data = tree.data(target);
    if data.detached {
        let range = effective_range(tree, target);
        let existing = state
            .rewritten
            .iter()
            .copied()
            .find(|existing| existing.contains_range(range) || existing.overlaps(range))
            .unwrap_or(range);
        return Err(ApplyError::Conflict(ReplacementConflictError {
            rule_name: rule.name.to_string(),
            range,
            existing,
        }));
    }

    if data.origin == Origin::Source {
        if let Some(range) = data.range {
            if let Some(existing) = state.rewritten.iter().find(|r| r.overlaps(range)) {
                return Err(ApplyError::Conflict(ReplacementConflictError {
                    rule_name: rule.name.to_string(),
                    range,
                    existing: *existing,
                }));
            }
        }
    }
    Ok(())
}

fn apply_one(
    file: &mut SourceFile,
    rule: &RuleDescriptor,
    replacement: Replacement,
    state: &mut PassState,
) -> Result<Vec<NodeId>, ApplyError> {
    let target = replacement.target;
    if !contains(&file.tree, target) {
        return Err(ApplyError::Invalid(
            format!("replacement target {} is not part of the tree", target).into(),
        ));
    }
    check_conflicts(&file.tree, rule, target, state)?;

    let data = file.tree.data(target);
    let origin = data.origin;
    let span = data.slot.or(data.range);

    let fragment = match replacement.action {
        ReplacementAction::Replace(fragment) => Some(fragment),
        ReplacementAction::Delete => None,
    };
    let new_roots = file
        .tree
        .apply_replacement(target, fragment)
        .map_err(|err| ApplyError::Invalid(Box::new(err)))?;

    if origin == Origin::Source {
        if let Some(range) = span {
            state.rewritten.push(range);
        }
    }

    debug!(rule = rule.name, range = ?span, roots = new_roots.len(), "applied replacement");
    state.changes.push(AppliedChange {
        rule: rule.name.to_string(),
        range: span,
        message: replacement
            .message
            .unwrap_or_else(|| rule.description.to_string()),
    });
    Ok(new_roots)
}

/// Apply independent replacements produced outside a dispatcher pass.
///
/// Overlapping targets are rejected before anything is applied.
pub fn apply_replacements(
    file: &mut SourceFile,
    replacements: Vec<(&dyn Rule, Replacement)>,
) -> Result<Vec<AppliedChange>, RewriteError> {
    let mut claimed: Vec<(TextRange, NodeId)> = Vec::new();
    for (rule, replacement) in &replacements {
        let target = replacement.target;
        if !contains(&file.tree, target) {
            continue;
        }
        let range = effective_range(&file.tree, target);
        if let Some((existing, _)) = claimed
            .iter()
            .find(|(other, other_id)| *other_id == target || other.overlaps(range))
        {
            return Err(ReplacementConflictError {
                rule_name: rule.name().to_string(),
                range,
                existing: *existing,
            }
            .into());
        }
        claimed.push((range, target));
    }

    let mut state = PassState::default();
    for (rule, replacement) in replacements {
        let descriptor = rule.descriptor();
        let node_range = file.tree.range(replacement.target);
        apply_one(file, &descriptor, replacement, &mut state)
            .map_err(|err| err.into_rewrite_error(&descriptor, node_range))?;
    }
    Ok(state.changes)
}
