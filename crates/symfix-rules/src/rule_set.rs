//! YAML rule set: configuration shared by the built-in rules
//!
//! ```yaml
//! status_code_class: Symfony\Component\HttpFoundation\Response
//! status_codes:
//!   299: HTTP_CUSTOM
//! assertion_methods:
//!   - assertResponseStatusCodeSame
//!   - assertStatusCode*
//! method_renames:
//!   - type: Symfony\Component\HttpFoundation\Request
//!     old: getSession
//!     new: getSessionOrFail
//! return_types:
//!   - parent: Command
//!     method: execute
//!     type: int
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a rule set
#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("Failed to read rule set {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rule set: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid rule set: {0}")]
    Invalid(String),
}

/// `$receiver->old()` becomes `$receiver->new()` when the receiver is of `type`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MethodRename {
    #[serde(rename = "type")]
    pub type_name: String,
    pub old: String,
    pub new: String,
}

/// Methods matching `method` in subclasses of `parent` get `return_type`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReturnTypeEntry {
    pub parent: String,
    pub method: String,
    #[serde(rename = "type")]
    pub return_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Class whose `HTTP_*` constants replace status code literals. A
    /// namespaced name is written through the file's imports or fully
    /// qualified; a bare name is written as is.
    pub status_code_class: String,
    /// Extra or overriding code -> constant entries
    pub status_codes: BTreeMap<u16, String>,
    /// `$this->...()` assertions whose first argument is a status code
    pub assertion_methods: Vec<String>,
    pub method_renames: Vec<MethodRename>,
    pub return_types: Vec<ReturnTypeEntry>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            status_code_class: crate::status_codes::SYMFONY_RESPONSE.to_string(),
            status_codes: BTreeMap::new(),
            assertion_methods: vec![
                "assertResponseStatusCodeSame".to_string(),
                "assertResponseCode*".to_string(),
                "assertStatusCode*".to_string(),
            ],
            method_renames: Vec::new(),
            return_types: vec![ReturnTypeEntry {
                parent: "Command".to_string(),
                method: "execute".to_string(),
                return_type: "int".to_string(),
            }],
        }
    }
}

impl RuleSet {
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleSetError> {
        let rule_set: RuleSet = serde_yaml::from_str(yaml)?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    pub fn from_file(path: &Path) -> Result<Self, RuleSetError> {
        let content = fs::read_to_string(path).map_err(|source| RuleSetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Reject entries that would produce invalid PHP or loop forever
    pub fn validate(&self) -> Result<(), RuleSetError> {
        if !is_class_name(&self.status_code_class) {
            return Err(RuleSetError::Invalid(format!(
                "status_code_class '{}' is not a class name",
                self.status_code_class
            )));
        }
        for (code, constant) in &self.status_codes {
            if !(100..=599).contains(code) {
                return Err(RuleSetError::Invalid(format!(
                    "status code {} is outside 100..=599",
                    code
                )));
            }
            if !is_identifier(constant) {
                return Err(RuleSetError::Invalid(format!(
                    "constant '{}' for status code {} is not an identifier",
                    constant, code
                )));
            }
        }
        for rename in &self.method_renames {
            if !is_identifier(&rename.old) || !is_identifier(&rename.new) {
                return Err(RuleSetError::Invalid(format!(
                    "method rename {} -> {} needs two method names",
                    rename.old, rename.new
                )));
            }
            if rename.old.eq_ignore_ascii_case(&rename.new) {
                return Err(RuleSetError::Invalid(format!(
                    "method rename {} -> {} does not change the name",
                    rename.old, rename.new
                )));
            }
            if !is_class_name(&rename.type_name) {
                return Err(RuleSetError::Invalid(format!(
                    "'{}' is not a class name",
                    rename.type_name
                )));
            }
        }
        for entry in &self.return_types {
            if entry.parent.is_empty() || entry.method.is_empty() || entry.return_type.is_empty() {
                return Err(RuleSetError::Invalid(
                    "return_types entries need parent, method and type".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_class_name(text: &str) -> bool {
    let trimmed = text.strip_prefix('\\').unwrap_or(text);
    !trimmed.is_empty() && trimmed.split('\\').all(is_identifier)
}
