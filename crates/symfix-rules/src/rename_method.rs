//! Rule: rename_method (Configurable)
//!
//! Renames method calls on receivers of a given type.
//!
//! Example configuration in the rule set:
//! ```yaml
//! method_renames:
//!   - type: Symfony\Component\HttpFoundation\Request
//!     old: get
//!     new: getPayload
//! ```
//!
//! Example transformation:
//! ```php
//! // Before
//! public function index(Request $request) { $request->get('q'); }
//!
//! // After
//! public function index(Request $request) { $request->getPayload('q'); }
//! ```
//!
//! Method names match case-insensitively; the new name is written as
//! configured. Receivers of unknown type are never renamed.

use symfix_core::{
    FragmentBuilder, Node, NodeId, NodeKind, Replacement, Rule, RuleContext, RuleFailure,
};

use crate::rule_set::MethodRename;

/// Configuration for the rename_method rule
#[derive(Debug, Clone, Default)]
pub struct RenameMethodConfig {
    pub renames: Vec<MethodRename>,
}

pub struct RenameMethodRule {
    config: RenameMethodConfig,
}

impl RenameMethodRule {
    pub fn new() -> Self {
        Self {
            config: RenameMethodConfig::default(),
        }
    }

    pub fn with_renames(renames: Vec<MethodRename>) -> Self {
        Self {
            config: RenameMethodConfig { renames },
        }
    }
}

impl Default for RenameMethodRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for RenameMethodRule {
    fn name(&self) -> &'static str {
        "rename_method"
    }

    fn description(&self) -> &'static str {
        "Rename methods on receivers of a configured type"
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::MethodCall]
    }

    fn apply(&self, ctx: &RuleContext<'_>, node: NodeId) -> Result<Option<Replacement>, RuleFailure> {
        if self.config.renames.is_empty() {
            return Ok(None);
        }
        let Node::MethodCall { object, name, .. } = ctx.tree.node(node) else {
            return Ok(None);
        };
        let Node::Identifier { name: method } = ctx.tree.node(*name) else {
            return Ok(None);
        };

        let rename = self.config.renames.iter().find(|rename| {
            rename.old.eq_ignore_ascii_case(method)
                && ctx.is_of_declared_type(*object, &rename.type_name)
        });
        let Some(rename) = rename else {
            return Ok(None);
        };

        let mut builder = FragmentBuilder::new();
        let identifier = builder.identifier(rename.new.as_str());
        Ok(Some(
            Replacement::replace(*name, builder.finish(identifier)?)
                .with_message(format!("Rename {}() to {}()", method, rename.new)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::LocalTypeResolver;
    use symfix_core::Engine;

    fn rename(type_name: &str, old: &str, new: &str) -> MethodRename {
        MethodRename {
            type_name: type_name.to_string(),
            old: old.to_string(),
            new: new.to_string(),
        }
    }

    fn transform_with(renames: Vec<MethodRename>, source: &str) -> String {
        let rule = RenameMethodRule::with_renames(renames);
        let resolver = LocalTypeResolver::new();
        Engine::new(vec![&rule])
            .with_resolver(&resolver)
            .rewrite(source)
            .unwrap()
            .text
    }

    // ==================== Basic Transformation Tests ====================

    #[test]
    fn test_simple_rename() {
        let source = r#"<?php
use Symfony\Component\HttpFoundation\Request;

class SearchController
{
    public function index(Request $request)
    {
        $query = $request->get('q');
    }
}
"#;
        let result = transform_with(
            vec![rename("Symfony\\Component\\HttpFoundation\\Request", "get", "getPayload")],
            source,
        );
        assert!(result.contains("$query = $request->getPayload('q');"));
        assert!(!result.contains("->get("));
    }

    #[test]
    fn test_case_insensitive_match() {
        let source = "<?php\nfunction f(Kernel $k) { $k->BOOT(); }\n";
        let result = transform_with(vec![rename("Kernel", "boot", "start")], source);
        assert_eq!(result, "<?php\nfunction f(Kernel $k) { $k->start(); }\n");
    }

    #[test]
    fn test_nullsafe_and_chained_calls() {
        let source = "<?php\nfunction f(?Kernel $k) { $k?->boot()->boot(); }\n";
        let result = transform_with(vec![rename("Kernel", "boot", "start")], source);
        assert_eq!(result, "<?php\nfunction f(?Kernel $k) { $k?->start()->boot(); }\n");
    }

    #[test]
    fn test_multiple_renames() {
        let source = "<?php\nfunction f(Kernel $k, Request $r) { $k->boot(); $r->get('a'); }\n";
        let result = transform_with(
            vec![rename("Kernel", "boot", "start"), rename("Request", "get", "fetch")],
            source,
        );
        assert!(result.contains("$k->start();"));
        assert!(result.contains("$r->fetch('a');"));
    }

    // ==================== Skip Cases ====================

    #[test]
    fn test_skip_other_type() {
        let source = "<?php\nfunction f(Cache $c) { $c->boot(); }\n";
        assert_eq!(transform_with(vec![rename("Kernel", "boot", "start")], source), source);
    }

    #[test]
    fn test_skip_unknown_type() {
        let source = "<?php\n$k->boot();\n";
        assert_eq!(transform_with(vec![rename("Kernel", "boot", "start")], source), source);
    }

    #[test]
    fn test_skip_static_and_function_calls() {
        let source = "<?php\nfunction f(Kernel $k) { Kernel::boot(); boot(); }\n";
        assert_eq!(transform_with(vec![rename("Kernel", "boot", "start")], source), source);
    }

    #[test]
    fn test_empty_config() {
        let source = "<?php\nfunction f(Kernel $k) { $k->boot(); }\n";
        assert_eq!(transform_with(Vec::new(), source), source);
    }
}
