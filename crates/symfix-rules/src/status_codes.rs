//! HTTP status code -> `Response::HTTP_*` constant table
//!
//! Shared by every status code rule. The built-in entries mirror the
//! constants of `Symfony\Component\HttpFoundation\Response`.
//!
//! A namespaced class is written the way the file can reach it: through
//! the local name of a matching `use` import, or fully qualified with a
//! leading `\`. A bare configured name (`HttpStatus`) is written as is.

use std::collections::BTreeMap;

use symfix_core::query::{int_literal_value, short_name};
use symfix_core::{FragmentBuilder, NodeId, Replacement, RuleContext, RuleFailure, SyntaxTree};

use crate::resolver::class_reference;
use crate::rule_set::RuleSet;

pub const SYMFONY_RESPONSE: &str = "Symfony\\Component\\HttpFoundation\\Response";

const SYMFONY_STATUS_CODES: &[(u16, &str)] = &[
    (100, "HTTP_CONTINUE"),
    (101, "HTTP_SWITCHING_PROTOCOLS"),
    (102, "HTTP_PROCESSING"),
    (103, "HTTP_EARLY_HINTS"),
    (200, "HTTP_OK"),
    (201, "HTTP_CREATED"),
    (202, "HTTP_ACCEPTED"),
    (203, "HTTP_NON_AUTHORITATIVE_INFORMATION"),
    (204, "HTTP_NO_CONTENT"),
    (205, "HTTP_RESET_CONTENT"),
    (206, "HTTP_PARTIAL_CONTENT"),
    (207, "HTTP_MULTI_STATUS"),
    (208, "HTTP_ALREADY_REPORTED"),
    (226, "HTTP_IM_USED"),
    (300, "HTTP_MULTIPLE_CHOICES"),
    (301, "HTTP_MOVED_PERMANENTLY"),
    (302, "HTTP_FOUND"),
    (303, "HTTP_SEE_OTHER"),
    (304, "HTTP_NOT_MODIFIED"),
    (305, "HTTP_USE_PROXY"),
    (306, "HTTP_RESERVED"),
    (307, "HTTP_TEMPORARY_REDIRECT"),
    (308, "HTTP_PERMANENTLY_REDIRECT"),
    (400, "HTTP_BAD_REQUEST"),
    (401, "HTTP_UNAUTHORIZED"),
    (402, "HTTP_PAYMENT_REQUIRED"),
    (403, "HTTP_FORBIDDEN"),
    (404, "HTTP_NOT_FOUND"),
    (405, "HTTP_METHOD_NOT_ALLOWED"),
    (406, "HTTP_NOT_ACCEPTABLE"),
    (407, "HTTP_PROXY_AUTHENTICATION_REQUIRED"),
    (408, "HTTP_REQUEST_TIMEOUT"),
    (409, "HTTP_CONFLICT"),
    (410, "HTTP_GONE"),
    (411, "HTTP_LENGTH_REQUIRED"),
    (412, "HTTP_PRECONDITION_FAILED"),
    (413, "HTTP_REQUEST_ENTITY_TOO_LARGE"),
    (414, "HTTP_REQUEST_URI_TOO_LONG"),
    (415, "HTTP_UNSUPPORTED_MEDIA_TYPE"),
    (416, "HTTP_REQUESTED_RANGE_NOT_SATISFIABLE"),
    (417, "HTTP_EXPECTATION_FAILED"),
    (418, "HTTP_I_AM_A_TEAPOT"),
    (421, "HTTP_MISDIRECTED_REQUEST"),
    (422, "HTTP_UNPROCESSABLE_ENTITY"),
    (423, "HTTP_LOCKED"),
    (424, "HTTP_FAILED_DEPENDENCY"),
    (425, "HTTP_TOO_EARLY"),
    (426, "HTTP_UPGRADE_REQUIRED"),
    (428, "HTTP_PRECONDITION_REQUIRED"),
    (429, "HTTP_TOO_MANY_REQUESTS"),
    (431, "HTTP_REQUEST_HEADER_FIELDS_TOO_LARGE"),
    (451, "HTTP_UNAVAILABLE_FOR_LEGAL_REASONS"),
    (500, "HTTP_INTERNAL_SERVER_ERROR"),
    (501, "HTTP_NOT_IMPLEMENTED"),
    (502, "HTTP_BAD_GATEWAY"),
    (503, "HTTP_SERVICE_UNAVAILABLE"),
    (504, "HTTP_GATEWAY_TIMEOUT"),
    (505, "HTTP_VERSION_NOT_SUPPORTED"),
    (506, "HTTP_VARIANT_ALSO_NEGOTIATES_EXPERIMENTAL"),
    (507, "HTTP_INSUFFICIENT_STORAGE"),
    (508, "HTTP_LOOP_DETECTED"),
    (510, "HTTP_NOT_EXTENDED"),
    (511, "HTTP_NETWORK_AUTHENTICATION_REQUIRED"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCodeTable {
    /// Class name without a leading `\`
    class: String,
    /// `class` names a class outside the file's namespace
    qualified: bool,
    constants: BTreeMap<u16, String>,
}

impl StatusCodeTable {
    /// The Symfony constants on `Response`
    pub fn symfony() -> Self {
        Self {
            class: SYMFONY_RESPONSE.to_string(),
            qualified: true,
            constants: SYMFONY_STATUS_CODES
                .iter()
                .map(|(code, name)| (*code, name.to_string()))
                .collect(),
        }
    }

    /// Symfony constants plus the rule set's class and overrides
    pub fn from_rule_set(rule_set: &RuleSet) -> Self {
        let mut table = Self::symfony();
        let configured = rule_set.status_code_class.as_str();
        table.class = configured.trim_start_matches('\\').to_string();
        table.qualified = configured.contains('\\');
        for (code, constant) in &rule_set.status_codes {
            table.constants.insert(*code, constant.clone());
        }
        table
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// Unqualified class name, used as the receiver type query
    pub fn short_class_name(&self) -> &str {
        short_name(&self.class)
    }

    /// The class as code in `tree` has to spell it
    pub fn class_reference(&self, tree: &SyntaxTree) -> String {
        if self.qualified {
            class_reference(tree, &self.class)
        } else {
            self.class.clone()
        }
    }

    pub fn constant(&self, code: i64) -> Option<&str> {
        let code = u16::try_from(code).ok()?;
        self.constants.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Replace an integer literal holding a known status code with its
    /// constant. `None` for anything else, including an already replaced
    /// constant fetch.
    pub fn replace_literal(
        &self,
        ctx: &RuleContext<'_>,
        node: NodeId,
    ) -> Result<Option<Replacement>, RuleFailure> {
        let Some(code) = int_literal_value(ctx.tree, node) else {
            return Ok(None);
        };
        let Some(constant) = self.constant(code) else {
            return Ok(None);
        };

        let class = self.class_reference(ctx.tree);
        let mut builder = FragmentBuilder::new();
        let fetch = builder.class_const_fetch(&class, constant);
        let fragment = builder.finish(fetch)?;
        Ok(Some(Replacement::replace(node, fragment).with_message(format!(
            "Replace status code {} with {}::{}",
            code, class, constant
        ))))
    }
}

impl Default for StatusCodeTable {
    fn default() -> Self {
        Self::symfony()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symfix_core::SourceFile;

    #[test]
    fn test_symfony_table() {
        let table = StatusCodeTable::symfony();
        assert_eq!(table.constant(200), Some("HTTP_OK"));
        assert_eq!(table.constant(404), Some("HTTP_NOT_FOUND"));
        assert_eq!(table.constant(418), Some("HTTP_I_AM_A_TEAPOT"));
        assert_eq!(table.constant(299), None);
        assert_eq!(table.constant(-1), None);
        assert_eq!(table.constant(70_000), None);
        assert_eq!(table.len(), SYMFONY_STATUS_CODES.len());
    }

    #[test]
    fn test_rule_set_overrides() {
        let mut rule_set = RuleSet::default();
        rule_set.status_code_class = "\\App\\Http\\Status".to_string();
        rule_set.status_codes.insert(299, "HTTP_CUSTOM".to_string());
        rule_set.status_codes.insert(200, "HTTP_FINE".to_string());

        let table = StatusCodeTable::from_rule_set(&rule_set);
        assert_eq!(table.class_name(), "App\\Http\\Status");
        assert_eq!(table.short_class_name(), "Status");
        assert_eq!(table.constant(299), Some("HTTP_CUSTOM"));
        assert_eq!(table.constant(200), Some("HTTP_FINE"));
        assert_eq!(table.constant(404), Some("HTTP_NOT_FOUND"));
    }

    #[test]
    fn test_class_reference_follows_imports() {
        let table = StatusCodeTable::symfony();
        assert_eq!(table.class_name(), SYMFONY_RESPONSE);
        assert_eq!(table.short_class_name(), "Response");

        let imported = SourceFile::parse(
            "<?php\nnamespace App;\n\nuse Symfony\\Component\\HttpFoundation\\Response;\n",
        )
        .unwrap();
        assert_eq!(table.class_reference(&imported.tree), "Response");

        let bare = SourceFile::parse("<?php\nnamespace App;\n").unwrap();
        assert_eq!(
            table.class_reference(&bare.tree),
            "\\Symfony\\Component\\HttpFoundation\\Response"
        );
    }

    #[test]
    fn test_configured_class_spelling() {
        let file = SourceFile::parse("<?php\nnamespace App\\Controller;\n").unwrap();
        let mut rule_set = RuleSet::default();

        rule_set.status_code_class = "App\\Http\\Status".to_string();
        let table = StatusCodeTable::from_rule_set(&rule_set);
        assert_eq!(table.class_reference(&file.tree), "\\App\\Http\\Status");

        rule_set.status_code_class = "\\HttpStatus".to_string();
        let table = StatusCodeTable::from_rule_set(&rule_set);
        assert_eq!(table.class_reference(&file.tree), "\\HttpStatus");

        rule_set.status_code_class = "HttpStatus".to_string();
        let table = StatusCodeTable::from_rule_set(&rule_set);
        assert_eq!(table.class_reference(&file.tree), "HttpStatus");
    }
}
