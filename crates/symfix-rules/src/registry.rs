//! Registry of the built-in rules, in application order

use std::collections::HashSet;
use std::sync::Arc;

use symfix_core::Rule;
use tracing::debug;

use crate::add_return_type::AddReturnTypeRule;
use crate::logout_handler::{LogoutHandlerToSubscriberRule, LogoutSuccessHandlerToSubscriberRule};
use crate::rename_method::RenameMethodRule;
use crate::rule_set::RuleSet;
use crate::status_code_assertion::{StatusCodeAssertionConfig, StatusCodeAssertionRule};
use crate::status_code_comparison::StatusCodeComparisonRule;
use crate::status_code_constructor::StatusCodeConstructorRule;
use crate::status_code_redirect::StatusCodeRedirectRule;
use crate::status_code_setter::StatusCodeSetterRule;
use crate::status_codes::StatusCodeTable;

/// Registry of all available rewrite rules
///
/// Registration order is the order rules are offered a node, so it decides
/// which rule wins when several match.
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    /// Create a new registry with all built-in rules and default settings
    pub fn new() -> Self {
        Self::from_rule_set(&RuleSet::default())
    }

    /// Create the built-in rules configured by a rule set
    pub fn from_rule_set(rule_set: &RuleSet) -> Self {
        let table = Arc::new(StatusCodeTable::from_rule_set(rule_set));
        let mut registry = Self { rules: Vec::new() };

        registry.register(Box::new(StatusCodeSetterRule::new(table.clone())));
        registry.register(Box::new(StatusCodeAssertionRule::with_config(
            table.clone(),
            StatusCodeAssertionConfig {
                assertion_methods: rule_set.assertion_methods.clone(),
            },
        )));
        registry.register(Box::new(StatusCodeRedirectRule::new(table.clone())));
        registry.register(Box::new(StatusCodeConstructorRule::new(table.clone())));
        registry.register(Box::new(StatusCodeComparisonRule::new(table)));
        registry.register(Box::new(RenameMethodRule::with_renames(
            rule_set.method_renames.clone(),
        )));
        registry.register(Box::new(AddReturnTypeRule::with_entries(
            rule_set.return_types.clone(),
        )));
        registry.register(Box::new(LogoutHandlerToSubscriberRule));
        registry.register(Box::new(LogoutSuccessHandlerToSubscriberRule));

        debug!(rules = registry.rules.len(), "registered built-in rules");
        registry
    }

    /// Register a new rule after the existing ones
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Get all rule names
    pub fn all_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Every rule, in registration order
    pub fn all(&self) -> Vec<&dyn Rule> {
        self.rules.iter().map(|r| r.as_ref()).collect()
    }

    /// Get rules filtered by enabled names, in registration order
    pub fn get_enabled(&self, enabled: &HashSet<String>) -> Vec<&dyn Rule> {
        self.rules
            .iter()
            .filter(|r| enabled.contains(r.name()))
            .map(|r| r.as_ref())
            .collect()
    }

    /// Get all rules with their descriptions (for --list-rules)
    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules
            .iter()
            .map(|r| (r.name(), r.description()))
            .collect()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order() {
        let registry = RuleRegistry::new();
        assert_eq!(
            registry.all_names(),
            vec![
                "status_code_setter",
                "status_code_assertion",
                "status_code_redirect",
                "status_code_constructor",
                "status_code_comparison",
                "rename_method",
                "add_return_type",
                "logout_handler_to_subscriber",
                "logout_success_handler_to_subscriber",
            ]
        );
    }

    #[test]
    fn test_names_are_unique() {
        let registry = RuleRegistry::new();
        let names: HashSet<_> = registry.all_names().into_iter().collect();
        assert_eq!(names.len(), registry.all().len());
    }

    #[test]
    fn test_get_enabled_keeps_registry_order() {
        let registry = RuleRegistry::new();
        let enabled: HashSet<String> = ["add_return_type", "status_code_setter", "unknown"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let names: Vec<_> = registry.get_enabled(&enabled).iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["status_code_setter", "add_return_type"]);
    }

    #[test]
    fn test_list_rules_has_descriptions() {
        let registry = RuleRegistry::new();
        for (name, description) in registry.list_rules() {
            assert!(!name.is_empty());
            assert!(!description.is_empty(), "{} has no description", name);
        }
    }
}
