//! Best-effort type resolution from declarations in the same file
//!
//! Resolves:
//! - `$this` to the enclosing class
//! - `$var` from a parameter type hint of the enclosing function, or from
//!   an earlier `$var = new Foo(...)` in the same function
//! - `$this->prop` from a typed property or promoted constructor parameter
//! - `new Foo(...)` to `Foo`
//!
//! Short names are expanded through `use` imports. A class matches a type
//! query when its full or short name equals the query, or when one of its
//! parents does (parents come from class declarations in the file and from
//! a table of known framework classes).

use std::collections::{HashMap, HashSet};

use symfix_core::node::UseKind;
use symfix_core::query::{enclosing_class, identifier_text, is_this, short_name};
use symfix_core::{
    ControllerContext, Node, NodeId, NodeKind, SyntaxTree, TypeResolution, TypeResolver,
};

const RESPONSE_SUBCLASSES: &[&str] = &[
    "JsonResponse",
    "RedirectResponse",
    "BinaryFileResponse",
    "StreamedResponse",
    "StreamedJsonResponse",
];

/// Parent chains deeper than this are treated as cycles
const MAX_PARENT_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub struct LocalTypeResolver {
    /// Short class name -> short parent name
    parents: HashMap<String, String>,
}

impl LocalTypeResolver {
    pub fn new() -> Self {
        let parents = RESPONSE_SUBCLASSES
            .iter()
            .map(|child| (child.to_string(), "Response".to_string()))
            .collect();
        Self { parents }
    }

    /// Declare that `child` extends `parent`
    pub fn with_parent(mut self, child: &str, parent: &str) -> Self {
        self.parents
            .insert(short_name(child).to_string(), short_name(parent).to_string());
        self
    }

    /// Fully resolved class name of an expression, if declared nearby
    pub fn declared_class(&self, tree: &SyntaxTree, node: NodeId) -> Option<String> {
        match tree.node(node) {
            Node::Variable { name } if name == "this" => {
                let class = enclosing_class(tree, node)?;
                class_decl_name(tree, class).map(str::to_string)
            }
            Node::Variable { name } => self.variable_class(tree, node, name),
            Node::PropertyFetch { object, name, .. } if is_this(tree, *object) => {
                let property = match tree.node(*name) {
                    Node::Identifier { name } => name.as_str(),
                    _ => return None,
                };
                let class = enclosing_class(tree, node)?;
                property_class(tree, class, property)
                    .map(|declared| resolve_class_name(tree, declared))
            }
            Node::New { class, .. } => match tree.node(*class) {
                Node::Name { name } => Some(resolve_class_name(tree, name)),
                _ => None,
            },
            Node::Parenthesized { expr } => self.declared_class(tree, *expr),
            _ => None,
        }
    }

    fn variable_class(&self, tree: &SyntaxTree, node: NodeId, variable: &str) -> Option<String> {
        let scope = tree.ancestors(node).find(|id| is_function_like(tree.kind(*id)));

        if let Some(function) = scope {
            for param in function_params(tree, function) {
                let Node::Parameter { type_hint, var, .. } = tree.node(*param) else {
                    continue;
                };
                if identifier_text(tree, *var) != Some(variable) {
                    continue;
                }
                let declared = single_type_name(tree, (*type_hint)?)?;
                return Some(match declared.to_ascii_lowercase().as_str() {
                    "self" | "static" => {
                        let class = enclosing_class(tree, node)?;
                        class_decl_name(tree, class)?.to_string()
                    }
                    _ => resolve_class_name(tree, declared),
                });
            }
        }

        // Last `$variable = new Foo` before the use, inside the same scope
        let scope = scope.unwrap_or_else(|| tree.root());
        let before = tree.range(node)?.start;
        let mut found = None;
        for id in tree.descendants(scope) {
            let Node::Assign { target, value, .. } = tree.node(id) else {
                continue;
            };
            if identifier_text(tree, *target) != Some(variable)
                || tree.kind(*target) != NodeKind::Variable
            {
                continue;
            }
            if !tree.range(id).is_some_and(|range| range.start < before) {
                continue;
            }
            if innermost_function(tree, id) != innermost_function(tree, node) {
                continue;
            }
            if let Node::New { class, .. } = tree.node(*value) {
                if let Node::Name { name } = tree.node(*class) {
                    found = Some(resolve_class_name(tree, name));
                }
            }
        }
        found
    }

    /// Does `class` (or one of its parents) match `type_query`
    pub fn class_matches(&self, tree: &SyntaxTree, class: &str, type_query: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = class.trim_start_matches('\\').to_string();
        for _ in 0..MAX_PARENT_DEPTH {
            if type_name_matches(&current, type_query) {
                return true;
            }
            if !seen.insert(current.clone()) {
                return false;
            }
            match self.parent_of(tree, &current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    fn parent_of(&self, tree: &SyntaxTree, class: &str) -> Option<String> {
        let short = short_name(class);
        let declared = tree.descendants(tree.root()).into_iter().find_map(|id| {
            match tree.node(id) {
                Node::ClassDecl {
                    name,
                    extends: Some(parent),
                    ..
                } if identifier_text(tree, *name) == Some(short) => {
                    let parent_name = identifier_text(tree, *parent)?;
                    Some(resolve_class_name(tree, parent_name))
                }
                _ => None,
            }
        });
        declared.or_else(|| self.parents.get(short).cloned())
    }
}

impl Default for LocalTypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeResolver for LocalTypeResolver {
    fn resolve(&self, tree: &SyntaxTree, node: NodeId, type_query: &str) -> Option<TypeResolution> {
        let class = self.declared_class(tree, node)?;
        Some(TypeResolution {
            is_of_type: self.class_matches(tree, &class, type_query),
            resolved_class_name: Some(class),
        })
    }
}

/// Call sites inside `AbstractController` subclasses or classes named
/// `*Controller`
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassNameControllerContext;

impl ControllerContext for ClassNameControllerContext {
    fn is_controller_context(&self, tree: &SyntaxTree, node: NodeId) -> bool {
        let Some(class) = enclosing_class(tree, node) else {
            return false;
        };
        let Node::ClassDecl { name, extends, .. } = tree.node(class) else {
            return false;
        };
        let extends_controller = extends
            .and_then(|parent| identifier_text(tree, parent))
            .map(short_name)
            .is_some_and(|parent| parent == "AbstractController" || parent == "Controller");
        extends_controller
            || identifier_text(tree, *name).is_some_and(|name| name.ends_with("Controller"))
    }
}

fn is_function_like(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::FunctionDecl | NodeKind::MethodDecl | NodeKind::Closure | NodeKind::ArrowFunction
    )
}

fn innermost_function(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node).find(|id| is_function_like(tree.kind(*id)))
}

fn function_params(tree: &SyntaxTree, function: NodeId) -> &[NodeId] {
    match tree.node(function) {
        Node::FunctionDecl { params, .. }
        | Node::MethodDecl { params, .. }
        | Node::Closure { params, .. }
        | Node::ArrowFunction { params, .. } => params,
        _ => &[],
    }
}

/// Class name of a single, non-union type hint
fn single_type_name(tree: &SyntaxTree, type_hint: NodeId) -> Option<&str> {
    match tree.node(type_hint) {
        Node::Type { parts, .. } if parts.len() == 1 => identifier_text(tree, parts[0]),
        Node::Name { name } => Some(name.as_str()),
        _ => None,
    }
}

fn class_decl_name(tree: &SyntaxTree, class: NodeId) -> Option<&str> {
    match tree.node(class) {
        Node::ClassDecl { name, .. } => identifier_text(tree, *name),
        _ => None,
    }
}

/// Declared class of `$this->property` inside `class`
fn property_class<'t>(tree: &'t SyntaxTree, class: NodeId, property: &str) -> Option<&'t str> {
    let Node::ClassDecl { members, .. } = tree.node(class) else {
        return None;
    };
    for member in members {
        match tree.node(*member) {
            Node::PropertyDecl {
                type_hint: Some(type_hint),
                items,
                ..
            } => {
                let declares = items.iter().any(|item| match tree.node(*item) {
                    Node::PropertyItem { var, .. } => identifier_text(tree, *var) == Some(property),
                    _ => false,
                });
                if declares {
                    return single_type_name(tree, *type_hint);
                }
            }
            Node::MethodDecl { name, params, .. }
                if identifier_text(tree, *name)
                    .is_some_and(|name| name.eq_ignore_ascii_case("__construct")) =>
            {
                for param in params {
                    if let Node::Parameter {
                        modifiers,
                        type_hint: Some(type_hint),
                        var,
                        ..
                    } = tree.node(*param)
                    {
                        if !modifiers.is_empty() && identifier_text(tree, *var) == Some(property) {
                            return single_type_name(tree, *type_hint);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Class imports of the file as `(local name, fully qualified name)` pairs
///
/// Group imports (`use App\{Foo, Bar as Baz};`) are expanded against their
/// prefix.
fn class_imports(tree: &SyntaxTree) -> Vec<(&str, String)> {
    let mut imports = Vec::new();
    for id in tree.descendants(tree.root()) {
        let Node::Use {
            kind: UseKind::Class,
            prefix,
            items,
        } = tree.node(id)
        else {
            continue;
        };
        let prefix = prefix
            .and_then(|prefix| identifier_text(tree, prefix))
            .map(|prefix| prefix.trim_start_matches('\\'));
        for item in items {
            let Node::UseItem { name: imported, alias } = tree.node(*item) else {
                continue;
            };
            let Some(imported) = identifier_text(tree, *imported) else {
                continue;
            };
            let imported = imported.trim_start_matches('\\');
            let local = match alias {
                Some(alias) => identifier_text(tree, *alias).unwrap_or_default(),
                None => short_name(imported),
            };
            let qualified = match prefix {
                Some(prefix) => format!("{}\\{}", prefix, imported),
                None => imported.to_string(),
            };
            imports.push((local, qualified));
        }
    }
    imports
}

/// Expand a class name through the file's `use` imports
fn resolve_class_name(tree: &SyntaxTree, name: &str) -> String {
    if let Some(qualified) = name.strip_prefix('\\') {
        return qualified.to_string();
    }
    let (first, rest) = match name.split_once('\\') {
        Some((first, rest)) => (first, Some(rest)),
        None => (name, None),
    };
    for (local, imported) in class_imports(tree) {
        if local.eq_ignore_ascii_case(first) {
            return match rest {
                Some(rest) => format!("{}\\{}", imported, rest),
                None => imported,
            };
        }
    }
    name.to_string()
}

/// How code in this file refers to the class `qualified`
///
/// The local name of a matching `use` import (alias included), otherwise
/// the fully qualified name with a leading `\`.
pub fn class_reference(tree: &SyntaxTree, qualified: &str) -> String {
    let qualified = qualified.trim_start_matches('\\');
    class_imports(tree)
        .into_iter()
        .find(|(_, imported)| imported.eq_ignore_ascii_case(qualified))
        .map(|(local, _)| local.to_string())
        .unwrap_or_else(|| format!("\\{}", qualified))
}

/// Full-name or short-name equality, case-insensitive like PHP class names
fn type_name_matches(class: &str, type_query: &str) -> bool {
    let class = class.trim_start_matches('\\');
    let query = type_query.trim_start_matches('\\');
    if query.contains('\\') {
        class.eq_ignore_ascii_case(query)
    } else {
        short_name(class).eq_ignore_ascii_case(query)
    }
}
