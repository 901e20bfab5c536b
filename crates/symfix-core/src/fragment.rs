//! Detached subtrees built by rules
//!
//! A rule never mutates the tree it inspects. It builds replacement nodes in a
//! [`FragmentBuilder`], which has its own id space, and returns the finished
//! [`Fragment`]. The dispatcher grafts it into the tree.
//!
//! Children must be pushed before their parents and may be used by only one
//! parent; violations are reported by `finish`.

use thiserror::Error;

use crate::node::{
    AssignOperator, BinaryOperator, LiteralKind, Node, NodeId, NodeKind, UnaryOperator,
};
use crate::text::TextRange;
use crate::tree::{NodeData, Origin, SyntaxTree};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FragmentError {
    #[error("fragment has no root")]
    Empty,

    #[error("{0} does not exist in this fragment")]
    UnknownNode(NodeId),

    #[error("{0} is used as a child more than once")]
    MultipleParents(NodeId),

    #[error("root {0} is also a child of another node")]
    RootHasParent(NodeId),

    #[error("{0} is not reachable from any root")]
    Unreachable(NodeId),

    #[error("{0} is not in a statement or member list, it cannot be substituted by {1} nodes")]
    Expansion(NodeId, usize),
}

/// A finished replacement: nodes plus the ids of its roots, in order
#[derive(Debug, Clone)]
pub struct Fragment {
    nodes: Vec<NodeData>,
    roots: Vec<NodeId>,
}

impl Fragment {
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()].node
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<NodeData>, Vec<NodeId>) {
        (self.nodes, self.roots)
    }
}

#[derive(Debug, Default)]
pub struct FragmentBuilder {
    nodes: Vec<NodeData>,
    error: Option<FragmentError>,
}

impl FragmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()].node
    }

    /// Add a constructed node whose children were pushed earlier
    pub fn push(&mut self, node: Node) -> NodeId {
        self.push_data(NodeData {
            node,
            parent: None,
            origin: Origin::Constructed,
            range: None,
            trivia_start: None,
            comments: None,
            slot: None,
            dirty: false,
            detached: false,
            generation: 0,
        })
    }

    fn push_data(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in data.node.children() {
            match self.nodes.get_mut(child.index()) {
                None => {
                    self.error.get_or_insert(FragmentError::UnknownNode(child));
                }
                Some(child_data) if child_data.parent.is_some() => {
                    self.error.get_or_insert(FragmentError::MultipleParents(child));
                }
                Some(child_data) => child_data.parent = Some(id),
            }
        }
        self.nodes.push(data);
        id
    }

    /// Deep copy of a tree node. Copies keep the source range, so they print
    /// as the original text wherever that is possible.
    pub fn copy_of(&mut self, tree: &SyntaxTree, id: NodeId) -> NodeId {
        let data = tree.data(id);
        let mut node = data.node.clone();
        node.for_each_child_mut(&mut |child| *child = self.copy_of(tree, *child));
        self.push_data(NodeData {
            node,
            parent: None,
            origin: if data.range.is_some() {
                Origin::Copied
            } else {
                Origin::Constructed
            },
            range: data.range,
            trivia_start: data.trivia_start,
            comments: data.comments,
            slot: data.slot,
            dirty: data.dirty,
            detached: false,
            generation: 0,
        })
    }

    /// Deep copy like [`copy_of`](Self::copy_of), except that `substitute`
    /// may swap any node of the copied subtree for nodes it builds. A
    /// substitute takes over the slot of the node it stands for, so the
    /// copy still prints from source around it. Several substitutes are
    /// only allowed for a statement or member.
    pub fn copy_with(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        substitute: &mut dyn FnMut(&mut FragmentBuilder, NodeId) -> Option<Vec<NodeId>>,
    ) -> Vec<NodeId> {
        self.copy_substituted(tree, id, substitute).0
    }

    fn copy_substituted(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        substitute: &mut dyn FnMut(&mut FragmentBuilder, NodeId) -> Option<Vec<NodeId>>,
    ) -> (Vec<NodeId>, bool) {
        let data = tree.data(id);
        if let Some(roots) = substitute(self, id) {
            if roots.is_empty() {
                self.error.get_or_insert(FragmentError::Expansion(id, 0));
            }
            for root in &roots {
                if let Some(root_data) = self.nodes.get_mut(root.index()) {
                    root_data.slot = data.slot.or(data.range);
                    if root_data.trivia_start.is_none() {
                        root_data.trivia_start = data.trivia_start;
                    }
                }
            }
            return (roots, true);
        }

        let mut node = data.node.clone();
        let mut changed = false;
        let mut expansions = Vec::new();
        node.for_each_child_mut(&mut |child| {
            let (roots, child_changed) = self.copy_substituted(tree, *child, &mut *substitute);
            changed |= child_changed;
            if let Some(first) = roots.first() {
                *child = *first;
            }
            if roots.len() > 1 {
                expansions.push(roots);
            }
        });
        for roots in expansions {
            let spliced = node.lists_mut().into_iter().any(|list| {
                match list.iter().position(|c| *c == roots[0]) {
                    Some(position) => {
                        list.splice(position..=position, roots.iter().copied());
                        true
                    }
                    None => false,
                }
            });
            if !spliced {
                self.error
                    .get_or_insert(FragmentError::Expansion(roots[0], roots.len()));
            }
        }

        let copy = self.push_data(NodeData {
            node,
            parent: None,
            origin: if data.range.is_some() {
                Origin::Copied
            } else {
                Origin::Constructed
            },
            range: data.range,
            trivia_start: data.trivia_start,
            comments: data.comments,
            slot: data.slot,
            dirty: data.dirty || changed,
            detached: false,
            generation: 0,
        });
        (vec![copy], changed)
    }

    /// Print the comments in front of tree node `from` in front of `id`
    /// too, for a node rebuilt from scratch in place of `from`
    pub fn carry_comments(&mut self, id: NodeId, tree: &SyntaxTree, from: NodeId) {
        let data = tree.data(from);
        let comments = match (data.trivia_start, data.range) {
            (Some(start), Some(range)) if start < range.start => {
                Some(TextRange::new(start, range.start))
            }
            _ => data.comments,
        };
        if let Some(target) = self.nodes.get_mut(id.index()) {
            target.comments = comments;
        }
    }

    pub fn finish(self, root: NodeId) -> Result<Fragment, FragmentError> {
        self.finish_many(vec![root])
    }

    /// Finish a fragment with several roots, printed in order
    pub fn finish_many(self, roots: Vec<NodeId>) -> Result<Fragment, FragmentError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if roots.is_empty() {
            return Err(FragmentError::Empty);
        }
        for root in &roots {
            match self.nodes.get(root.index()) {
                None => return Err(FragmentError::UnknownNode(*root)),
                Some(data) if data.parent.is_some() => {
                    return Err(FragmentError::RootHasParent(*root));
                }
                Some(_) => {}
            }
        }
        for (index, data) in self.nodes.iter().enumerate() {
            let id = NodeId(index as u32);
            if data.parent.is_none() && !roots.contains(&id) {
                return Err(FragmentError::Unreachable(id));
            }
        }
        Ok(Fragment {
            nodes: self.nodes,
            roots,
        })
    }

    // Helpers for the nodes rules build most often

    pub fn literal(&mut self, kind: LiteralKind, raw: impl Into<String>) -> NodeId {
        self.push(Node::Literal {
            kind,
            raw: raw.into(),
        })
    }

    pub fn int(&mut self, value: i64) -> NodeId {
        self.literal(LiteralKind::Integer, value.to_string())
    }

    /// Single quoted string literal
    pub fn string(&mut self, value: &str) -> NodeId {
        let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
        self.literal(LiteralKind::String, format!("'{}'", escaped))
    }

    pub fn null(&mut self) -> NodeId {
        self.literal(LiteralKind::Null, "null")
    }

    pub fn identifier(&mut self, name: impl Into<String>) -> NodeId {
        self.push(Node::Identifier { name: name.into() })
    }

    pub fn name(&mut self, name: impl Into<String>) -> NodeId {
        self.push(Node::Name { name: name.into() })
    }

    pub fn variable(&mut self, name: impl Into<String>) -> NodeId {
        self.push(Node::Variable { name: name.into() })
    }

    /// `Class::CONSTANT`
    pub fn class_const_fetch(&mut self, class: &str, constant: &str) -> NodeId {
        let class = self.name(class);
        let name = self.identifier(constant);
        self.push(Node::ClassConstFetch { class, name })
    }

    pub fn argument(&mut self, value: NodeId) -> NodeId {
        self.push(Node::Argument {
            name: None,
            value,
            spread: false,
        })
    }

    pub fn named_argument(&mut self, name: &str, value: NodeId) -> NodeId {
        let name = self.identifier(name);
        self.push(Node::Argument {
            name: Some(name),
            value,
            spread: false,
        })
    }

    pub fn method_call(&mut self, object: NodeId, method: &str, args: Vec<NodeId>) -> NodeId {
        let name = self.identifier(method);
        self.push(Node::MethodCall {
            object,
            name,
            args,
            nullsafe: false,
        })
    }

    pub fn new_object(&mut self, class: &str, args: Vec<NodeId>) -> NodeId {
        let class = self.name(class);
        self.push(Node::New { class, args })
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.push(Node::Assign {
            op: AssignOperator::Assign,
            by_ref: false,
            target,
            value,
        })
    }

    pub fn binary(&mut self, op: BinaryOperator, left: NodeId, right: NodeId) -> NodeId {
        self.push(Node::BinaryOp { op, left, right })
    }

    pub fn unary(&mut self, op: UnaryOperator, operand: NodeId) -> NodeId {
        self.push(Node::UnaryOp { op, operand })
    }

    pub fn expression_statement(&mut self, expr: NodeId) -> NodeId {
        self.push(Node::ExpressionStatement { expr })
    }

    pub fn return_statement(&mut self, value: Option<NodeId>) -> NodeId {
        self.push(Node::Return { value })
    }

    pub fn block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.push(Node::Block { statements })
    }

    pub fn array(&mut self, items: Vec<NodeId>) -> NodeId {
        self.push(Node::Array { items, short: true })
    }

    pub fn array_item(&mut self, key: Option<NodeId>, value: NodeId) -> NodeId {
        self.push(Node::ArrayItem {
            key,
            value,
            by_ref: false,
            spread: false,
        })
    }

    /// Simple, nullable-free type such as `int` or `\Foo\Bar`
    pub fn simple_type(&mut self, name: &str) -> NodeId {
        let part = self.name(name);
        self.push(Node::Type {
            nullable: false,
            parts: vec![part],
            separator: crate::node::TypeSeparator::Union,
        })
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;

    #[test]
    fn test_children_before_parents() {
        let mut builder = FragmentBuilder::new();
        let fetch = builder.class_const_fetch("Response", "HTTP_OK");
        let fragment = builder.finish(fetch).unwrap();
        assert_eq!(fragment.len(), 3);
        assert_eq!(fragment.roots(), &[fetch]);
        assert!(matches!(fragment.node(fetch), Node::ClassConstFetch { .. }));
    }

    #[test]
    fn test_shared_child_rejected() {
        let mut builder = FragmentBuilder::new();
        let value = builder.int(1);
        let first = builder.argument(value);
        let second = builder.argument(value);
        let call = builder.name("f");
        let _ = (first, second, call);
        let err = builder.finish(first).unwrap_err();
        assert_eq!(err, FragmentError::MultipleParents(value));
    }

    #[test]
    fn test_unreachable_node_rejected() {
        let mut builder = FragmentBuilder::new();
        let stray = builder.int(1);
        let root = builder.int(2);
        let err = builder.finish(root).unwrap_err();
        assert_eq!(err, FragmentError::Unreachable(stray));
    }

    #[test]
    fn test_copy_keeps_ranges() {
        let file = SourceFile::parse("<?php foo($bar);").unwrap();
        let variable = file
            .tree
            .descendants(file.tree.root())
            .into_iter()
            .find(|id| file.tree.kind(*id) == NodeKind::Variable)
            .unwrap();

        let mut builder = FragmentBuilder::new();
        let copy = builder.copy_of(&file.tree, variable);
        let fragment = builder.finish(copy).unwrap();
        let (nodes, _) = fragment.into_parts();
        assert_eq!(nodes[0].origin, Origin::Copied);
        assert_eq!(nodes[0].range, file.tree.range(variable));
    }

    #[test]
    fn test_copy_with_substitutes_nested_nodes() {
        let file = SourceFile::parse("<?php\nif ($a) {\n    return 1;\n}\n").unwrap();
        let statement = file
            .tree
            .descendants(file.tree.root())
            .into_iter()
            .find(|id| file.tree.kind(*id) == NodeKind::If)
            .unwrap();

        let mut builder = FragmentBuilder::new();
        let roots = builder.copy_with(&file.tree, statement, &mut |builder, id| {
            if file.tree.kind(id) != NodeKind::Return {
                return None;
            }
            let first = builder.return_statement(None);
            let second = builder.return_statement(None);
            Some(vec![first, second])
        });
        assert_eq!(roots.len(), 1);
        let fragment = builder.finish(roots[0]).unwrap();
        let (nodes, _) = fragment.into_parts();
        let copy = nodes.last().unwrap();
        assert!(copy.dirty);
        let block = nodes
            .iter()
            .find(|data| data.kind() == NodeKind::Block)
            .unwrap();
        assert_eq!(block.node.children().len(), 2);
    }

    #[test]
    fn test_carry_comments_takes_leading_trivia() {
        let file = SourceFile::parse("<?php\n/** Doc */\nfoo();\n").unwrap();
        let statement = file
            .tree
            .descendants(file.tree.root())
            .into_iter()
            .find(|id| file.tree.kind(*id) == NodeKind::ExpressionStatement)
            .unwrap();

        let mut builder = FragmentBuilder::new();
        let value = builder.int(1);
        let rebuilt = builder.return_statement(Some(value));
        builder.carry_comments(rebuilt, &file.tree, statement);
        let fragment = builder.finish(rebuilt).unwrap();
        let (nodes, _) = fragment.into_parts();
        let comments = nodes[rebuilt.index()].comments.unwrap();
        assert_eq!(comments.slice(&file.text).trim(), "/** Doc */");
    }

    #[test]
    fn test_string_escaping() {
        let mut builder = FragmentBuilder::new();
        let s = builder.string("it's");
        assert_eq!(
            builder.node(s),
            &Node::Literal {
                kind: LiteralKind::String,
                raw: "'it\\'s'".to_string()
            }
        );
    }
}
