//! Arena-backed syntax tree with parent links
//!
//! Nodes are never freed while a rewrite is running. A replaced subtree is
//! marked detached and stays addressable, so stale ids held by rules or by
//! the dispatcher stack are harmless.

use thiserror::Error;

use crate::fragment::Fragment;
use crate::node::{ListKind, Node, NodeId, NodeKind};
use crate::text::TextRange;

/// Where a node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Produced by the parser
    Source,
    /// Deep copy of a parsed node, made by a rule
    Copied,
    /// Built from scratch by a rule
    Constructed,
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub node: Node,
    pub parent: Option<NodeId>,
    pub origin: Origin,
    /// Source range, without leading trivia. `None` for constructed nodes.
    pub range: Option<TextRange>,
    /// Start of the whitespace and comments before `range`
    pub trivia_start: Option<u32>,
    /// Comments printed in front of a node that has no trivia of its own,
    /// taken over from the source node it was built from
    pub comments: Option<TextRange>,
    /// For replacement roots: the source text they stand in for
    pub slot: Option<TextRange>,
    /// Some descendant was replaced, so `range` no longer prints this node
    pub dirty: bool,
    pub detached: bool,
    /// How many replacements deep this node was produced
    pub generation: u8,
}

impl NodeData {
    pub(crate) fn source(node: Node, range: TextRange, trivia_start: u32) -> Self {
        Self {
            node,
            parent: None,
            origin: Origin::Source,
            range: Some(range),
            trivia_start: Some(trivia_start),
            comments: None,
            slot: None,
            dirty: false,
            detached: false,
            generation: 0,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    pub fn is_synthetic(&self) -> bool {
        self.origin != Origin::Source
    }
}

/// A replacement does not fit the slot it targets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("{kind:?} node is not in a list, it cannot be deleted")]
    DeleteOutsideList { kind: NodeKind },

    #[error("{kind:?} node is not in a statement or member list, it cannot be replaced by {count} nodes")]
    ExpansionOutsideList { kind: NodeKind, count: usize },

    #[error("a replacement needs at least one node")]
    EmptyReplacement,

    #[error("the file node can only be replaced by a single node")]
    RootShape,

    #[error("{0} is not a child of its recorded parent")]
    Unlinked(NodeId),
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Add a node and link its children to it
    pub(crate) fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in data.node.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(data);
        id
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()].node
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].node.kind()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn range(&self, id: NodeId) -> Option<TextRange> {
        self.nodes[id.index()].range
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).children()
    }

    /// Source text of a node that still carries a range
    pub fn text<'s>(&self, id: NodeId, source: &'s str) -> Option<&'s str> {
        self.range(id).map(|range| range.slice(source))
    }

    /// Parent, grandparent ... up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// All nodes below `id` in pre-order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// Reachable from the current root
    pub fn is_attached(&self, id: NodeId) -> bool {
        !self.data(id).detached
    }

    /// Same kinds, payloads and shape, ignoring ids, ranges and origins
    pub fn structurally_eq(&self, a: NodeId, other: &SyntaxTree, b: NodeId) -> bool {
        let left = self.node(a);
        let right = other.node(b);
        if left.shape() != right.shape() {
            return false;
        }
        let left_children = left.children();
        let right_children = right.children();
        left_children.len() == right_children.len()
            && left_children
                .iter()
                .zip(&right_children)
                .all(|(l, r)| self.structurally_eq(*l, other, *r))
    }

    /// Splice `fragment` in place of `target`, or delete `target` when the
    /// fragment is `None`. Returns the new roots (a single tombstone for a
    /// deletion).
    pub(crate) fn apply_replacement(
        &mut self,
        target: NodeId,
        fragment: Option<Fragment>,
    ) -> Result<Vec<NodeId>, ShapeError> {
        let target_data = self.data(target).clone();
        let target_kind = target_data.kind();
        let list_kind = target_data
            .parent
            .and_then(|parent| self.node(parent).list_kind_of(target));

        match &fragment {
            None if list_kind.is_none() => {
                return Err(ShapeError::DeleteOutsideList { kind: target_kind });
            }
            Some(fragment) if fragment.roots().is_empty() => {
                return Err(ShapeError::EmptyReplacement);
            }
            Some(fragment) if fragment.roots().len() > 1 => {
                if target_data.parent.is_none() {
                    return Err(ShapeError::RootShape);
                }
                if !matches!(list_kind, Some(ListKind::Statements | ListKind::Members)) {
                    return Err(ShapeError::ExpansionOutsideList {
                        kind: target_kind,
                        count: fragment.roots().len(),
                    });
                }
            }
            _ => {}
        }

        let slot = target_data.slot.or(target_data.range);
        let generation = target_data.generation.saturating_add(1);

        let new_roots = match fragment {
            Some(fragment) => self.graft(fragment, generation),
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(NodeData {
                    node: Node::Removed,
                    parent: None,
                    origin: Origin::Constructed,
                    range: None,
                    trivia_start: target_data.trivia_start,
                    comments: None,
                    slot: None,
                    dirty: false,
                    detached: false,
                    generation,
                });
                vec![id]
            }
        };

        for root in &new_roots {
            let data = &mut self.nodes[root.index()];
            data.parent = target_data.parent;
            data.slot = slot;
            if data.trivia_start.is_none() || data.kind() == NodeKind::Removed {
                data.trivia_start = target_data.trivia_start;
            }
        }

        match target_data.parent {
            Some(parent) => {
                if !self.nodes[parent.index()].node.replace_child(target, &new_roots) {
                    return Err(ShapeError::Unlinked(target));
                }
                self.mark_dirty(parent);
            }
            None => self.root = new_roots[0],
        }

        self.detach(target);
        Ok(new_roots)
    }

    fn graft(&mut self, fragment: Fragment, generation: u8) -> Vec<NodeId> {
        let offset = self.nodes.len() as u32;
        let (nodes, roots) = fragment.into_parts();
        for mut data in nodes {
            data.node.for_each_child_mut(&mut |child| child.0 += offset);
            data.parent = data.parent.map(|p| NodeId(p.0 + offset));
            data.generation = generation;
            self.nodes.push(data);
        }
        roots.into_iter().map(|r| NodeId(r.0 + offset)).collect()
    }

    fn mark_dirty(&mut self, id: NodeId) {
        let mut next = Some(id);
        while let Some(current) = next {
            let data = &mut self.nodes[current.index()];
            data.dirty = true;
            next = data.parent;
        }
    }

    fn detach(&mut self, id: NodeId) {
        self.nodes[id.index()].detached = true;
        for descendant in self.descendants(id) {
            self.nodes[descendant.index()].detached = true;
        }
    }
}

pub struct Ancestors<'t> {
    tree: &'t SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
