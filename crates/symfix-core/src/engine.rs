//! Parse, dispatch and print in one call

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dispatcher::{AppliedChange, Dispatcher, DEFAULT_VISIT_BUDGET};
use crate::error::RewriteError;
use crate::printer::{self, PrinterConfig};
use crate::query::{ControllerContext, NoControllers, NoTypes, TypeResolver};
use crate::rule::Rule;
use crate::source::SourceFile;

static NO_TYPES: NoTypes = NoTypes;
static NO_CONTROLLERS: NoControllers = NoControllers;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How many times one source slot may be offered to rules
    pub visit_budget: u8,
    pub printer: PrinterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            visit_budget: DEFAULT_VISIT_BUDGET,
            printer: PrinterConfig::default(),
        }
    }
}

/// Result of rewriting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutput {
    pub text: String,
    pub changes: Vec<AppliedChange>,
}

impl RewriteOutput {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// An ordered rule list plus the collaborators rules query
pub struct Engine<'r> {
    rules: Vec<&'r dyn Rule>,
    resolver: &'r dyn TypeResolver,
    controllers: &'r dyn ControllerContext,
    config: EngineConfig,
}

impl<'r> Engine<'r> {
    pub fn new(rules: Vec<&'r dyn Rule>) -> Self {
        Self {
            rules,
            resolver: &NO_TYPES,
            controllers: &NO_CONTROLLERS,
            config: EngineConfig::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: &'r dyn TypeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_controllers(mut self, controllers: &'r dyn ControllerContext) -> Self {
        self.controllers = controllers;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rewrite one file. The input is returned unchanged when no rule
    /// matched.
    pub fn rewrite(&self, source: &str) -> Result<RewriteOutput, RewriteError> {
        let mut file = SourceFile::parse(source)?;
        let dispatcher = Dispatcher::new(&self.rules, self.config.visit_budget);
        let changes = dispatcher.run(&mut file, self.resolver, self.controllers)?;

        if changes.is_empty() {
            return Ok(RewriteOutput {
                text: source.to_string(),
                changes,
            });
        }

        let text = printer::print(&file, &self.config.printer)?;
        debug!(changes = changes.len(), "rewrote file");
        Ok(RewriteOutput { text, changes })
    }

    /// Rewrite independent files in parallel, results in input order
    pub fn rewrite_many(&self, sources: &[&str]) -> Vec<Result<RewriteOutput, RewriteError>> {
        sources.par_iter().map(|source| self.rewrite(source)).collect()
    }
}
