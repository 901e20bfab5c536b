//! Query/match primitives rules are written against
//!
//! Everything here is a pure function of the tree and, for type queries,
//! of the injected resolver.

use crate::node::{Node, NodeId, NodeKind};
use crate::tree::SyntaxTree;

/// Answer of a declared-type query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeResolution {
    pub is_of_type: bool,
    pub resolved_class_name: Option<String>,
}

/// Maps an expression to a best-effort declared type
pub trait TypeResolver: Send + Sync {
    /// `None` when the type cannot be determined
    fn resolve(&self, tree: &SyntaxTree, node: NodeId, type_query: &str)
        -> Option<TypeResolution>;
}

/// Is a call site inside a recognized controller
pub trait ControllerContext: Send + Sync {
    fn is_controller_context(&self, tree: &SyntaxTree, node: NodeId) -> bool;
}

/// Resolver that never knows anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTypes;

impl TypeResolver for NoTypes {
    fn resolve(&self, _tree: &SyntaxTree, _node: NodeId, _type_query: &str) -> Option<TypeResolution> {
        None
    }
}

/// No call site is ever in a controller
#[derive(Debug, Clone, Copy, Default)]
pub struct NoControllers;

impl ControllerContext for NoControllers {
    fn is_controller_context(&self, _tree: &SyntaxTree, _node: NodeId) -> bool {
        false
    }
}

pub fn matches_kind(tree: &SyntaxTree, node: NodeId, kind: NodeKind) -> bool {
    tree.kind(node) == kind
}

/// Match an identifier against a pattern. A trailing `*` matches any
/// suffix; otherwise the whole identifier must be equal. Case-sensitive.
pub fn name_matches(identifier: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => identifier.starts_with(prefix),
        None => identifier == pattern,
    }
}

/// Delegates to the resolver; unknown counts as "not of that type"
pub fn is_of_declared_type(
    tree: &SyntaxTree,
    node: NodeId,
    type_query: &str,
    resolver: &dyn TypeResolver,
) -> bool {
    resolver
        .resolve(tree, node, type_query)
        .is_some_and(|resolution| resolution.is_of_type)
}

/// Last segment of a qualified name: `\Foo\Bar` -> `Bar`
pub fn short_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

/// Name carried by an identifier, name or variable node
pub fn identifier_text(tree: &SyntaxTree, node: NodeId) -> Option<&str> {
    match tree.node(node) {
        Node::Identifier { name } | Node::Name { name } | Node::Variable { name } => {
            Some(name.as_str())
        }
        Node::ConstFetch { name } => identifier_text(tree, *name),
        _ => None,
    }
}

/// Method or function name of a call node
pub fn method_call_name(tree: &SyntaxTree, node: NodeId) -> Option<&str> {
    match tree.node(node) {
        Node::MethodCall { name, .. } | Node::StaticCall { name, .. } => {
            match tree.node(*name) {
                Node::Identifier { name } => Some(name.as_str()),
                _ => None,
            }
        }
        Node::Call { callee, .. } => match tree.node(*callee) {
            Node::Name { name } => Some(name.as_str()),
            _ => None,
        },
        _ => None,
    }
}

/// Arguments of a call-like node
pub fn call_args(tree: &SyntaxTree, node: NodeId) -> &[NodeId] {
    match tree.node(node) {
        Node::Call { args, .. }
        | Node::MethodCall { args, .. }
        | Node::StaticCall { args, .. }
        | Node::New { args, .. } => args,
        _ => &[],
    }
}

/// Value of the positional argument at `index`. Named and spread
/// arguments never count as positional.
pub fn argument_value(tree: &SyntaxTree, call: NodeId, index: usize) -> Option<NodeId> {
    let argument = *call_args(tree, call).get(index)?;
    match tree.node(argument) {
        Node::Argument {
            name: None,
            value,
            spread: false,
        } => Some(*value),
        _ => None,
    }
}

/// Value of the named argument `name: ...`
pub fn named_argument_value(tree: &SyntaxTree, call: NodeId, name: &str) -> Option<NodeId> {
    call_args(tree, call)
        .iter()
        .find_map(|argument| match tree.node(*argument) {
            Node::Argument {
                name: Some(arg_name),
                value,
                ..
            } if identifier_text(tree, *arg_name) == Some(name) => Some(*value),
            _ => None,
        })
}

/// Integer value of an integer literal, in any PHP notation
pub fn int_literal_value(tree: &SyntaxTree, node: NodeId) -> Option<i64> {
    match tree.node(node) {
        Node::Literal {
            kind: crate::node::LiteralKind::Integer,
            raw,
        } => parse_int(raw),
        _ => None,
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if lower.len() > 1 && lower.starts_with('0') {
        i64::from_str_radix(&lower[1..], 8).ok()
    } else {
        lower.parse().ok()
    }
}

fn is_class_like(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::ClassDecl
            | NodeKind::InterfaceDecl
            | NodeKind::TraitDecl
            | NodeKind::EnumDecl
            | NodeKind::AnonymousClass
    )
}

/// Innermost class, interface, trait or enum around `node`. Anonymous
/// classes count, so `$this` inside one never resolves to the outer class.
pub fn enclosing_class(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node).find(|id| is_class_like(tree.kind(*id)))
}

/// Innermost method or function around `node`
pub fn enclosing_method(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node).find(|id| {
        matches!(
            tree.kind(*id),
            NodeKind::MethodDecl | NodeKind::FunctionDecl
        )
    })
}

/// Declared name of a class-like, method or function node
pub fn class_name_of(tree: &SyntaxTree, node: NodeId) -> Option<&str> {
    match tree.node(node) {
        Node::ClassDecl { name, .. }
        | Node::InterfaceDecl { name, .. }
        | Node::TraitDecl { name, .. }
        | Node::EnumDecl { name, .. }
        | Node::MethodDecl { name, .. }
        | Node::FunctionDecl { name, .. } => identifier_text(tree, *name),
        _ => None,
    }
}

/// Does the class extend something whose short or full name matches
pub fn extends_matches(tree: &SyntaxTree, class: NodeId, pattern: &str) -> bool {
    match tree.node(class) {
        Node::ClassDecl {
            extends: Some(parent),
            ..
        } => identifier_text(tree, *parent).is_some_and(|name| qualified_matches(name, pattern)),
        Node::InterfaceDecl { extends, .. } => extends.iter().any(|parent| {
            identifier_text(tree, *parent).is_some_and(|name| qualified_matches(name, pattern))
        }),
        _ => false,
    }
}

/// Does the class implement an interface whose short or full name matches
pub fn implements_matches(tree: &SyntaxTree, class: NodeId, pattern: &str) -> bool {
    match tree.node(class) {
        Node::ClassDecl { implements, .. } => implements.iter().any(|interface| {
            identifier_text(tree, *interface)
                .is_some_and(|name| qualified_matches(name, pattern))
        }),
        _ => false,
    }
}

fn qualified_matches(name: &str, pattern: &str) -> bool {
    let trimmed = name.trim_start_matches('\\');
    let pattern = pattern.trim_start_matches('\\');
    name_matches(trimmed, pattern) || name_matches(short_name(trimmed), pattern)
}

/// `$this`
pub fn is_this(tree: &SyntaxTree, node: NodeId) -> bool {
    matches!(tree.node(node), Node::Variable { name } if name == "this")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;

    fn find(file: &SourceFile, kind: NodeKind) -> NodeId {
        file.tree
            .descendants(file.tree.root())
            .into_iter()
            .find(|id| file.tree.kind(*id) == kind)
            .unwrap()
    }

    struct Always(&'static str);

    impl TypeResolver for Always {
        fn resolve(&self, _: &SyntaxTree, _: NodeId, query: &str) -> Option<TypeResolution> {
            Some(TypeResolution {
                is_of_type: query == self.0,
                resolved_class_name: Some(self.0.to_string()),
            })
        }
    }

    #[test]
    fn test_name_matches() {
        assert!(name_matches("assertResponseCode", "assert*"));
        assert!(!name_matches("doAssert", "assert*"));
        assert!(name_matches("setStatusCode", "setStatusCode"));
        assert!(!name_matches("setStatusCodeX", "setStatusCode"));
        assert!(!name_matches("AssertSame", "assert*"));
        assert!(name_matches("anything", "*"));
    }

    #[test]
    fn test_declared_type_delegates() {
        let file = SourceFile::parse("<?php $r->send();").unwrap();
        let var = find(&file, NodeKind::Variable);
        assert!(is_of_declared_type(&file.tree, var, "Response", &Always("Response")));
        assert!(!is_of_declared_type(&file.tree, var, "Request", &Always("Response")));
        assert!(!is_of_declared_type(&file.tree, var, "Response", &NoTypes));
    }

    #[test]
    fn test_int_literal_notations() {
        for (source, expected) in [
            ("<?php f(200);", 200),
            ("<?php f(0x1F);", 31),
            ("<?php f(0b101);", 5),
            ("<?php f(0o17);", 15),
            ("<?php f(017);", 15),
            ("<?php f(1_000);", 1000),
        ] {
            let file = SourceFile::parse(source).unwrap();
            let literal = find(&file, NodeKind::Literal);
            assert_eq!(int_literal_value(&file.tree, literal), Some(expected), "{}", source);
        }
    }

    #[test]
    fn test_arguments() {
        let file = SourceFile::parse("<?php new Response('x', status: 404);").unwrap();
        let new = find(&file, NodeKind::New);
        let first = argument_value(&file.tree, new, 0).unwrap();
        assert_eq!(file.text_of(first), Some("'x'"));
        assert_eq!(argument_value(&file.tree, new, 1), None);
        let status = named_argument_value(&file.tree, new, "status").unwrap();
        assert_eq!(int_literal_value(&file.tree, status), Some(404));
    }

    #[test]
    fn test_enclosing_and_inheritance() {
        let file = SourceFile::parse(
            "<?php class HomeController extends \\Symfony\\Bundle\\FrameworkBundle\\Controller\\AbstractController implements Foo {
                public function index() { $this->render(); }
            }",
        )
        .unwrap();
        let call = find(&file, NodeKind::MethodCall);
        let class = enclosing_class(&file.tree, call).unwrap();
        let method = enclosing_method(&file.tree, call).unwrap();
        assert_eq!(class_name_of(&file.tree, class), Some("HomeController"));
        assert_eq!(class_name_of(&file.tree, method), Some("index"));
        assert_eq!(method_call_name(&file.tree, call), Some("render"));
        assert!(extends_matches(&file.tree, class, "AbstractController"));
        assert!(extends_matches(&file.tree, class, "Symfony\\Bundle\\*"));
        assert!(implements_matches(&file.tree, class, "Foo"));
        assert!(!implements_matches(&file.tree, class, "Bar"));
    }
}
