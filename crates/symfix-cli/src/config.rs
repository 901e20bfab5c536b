//! Configuration file support for symfix
//!
//! Loads `.symfix.toml` from the current directory or its parents.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use symfix_core::EngineConfig;

pub const CONFIG_FILE_NAME: &str = ".symfix.toml";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rules: RulesConfig,
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub engine: EngineSection,
    pub printer: PrinterSection,
    pub rule_set: RuleSetSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// If set, only these rules will run
    pub enabled: Option<Vec<String>>,
    /// Rules to exclude (applied after enabled)
    pub disabled: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Glob patterns to exclude from directory walks
    pub exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text", "json" or "diff"
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub visit_budget: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PrinterSection {
    pub reuse_source_text: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuleSetSection {
    /// YAML rule set, relative to the config file
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load config from `.symfix.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;

        if let (Some(rule_set), Some(dir)) = (&config.rule_set.path, path.parent()) {
            if rule_set.is_relative() {
                config.rule_set.path = Some(dir.join(rule_set));
            }
        }
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.engine.visit_budget == Some(0) {
            bail!("[engine] visit_budget must be at least 1");
        }
        for pattern in &self.paths.exclude {
            if pattern.ends_with('/') {
                continue;
            }
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid exclude pattern '{}'", pattern))?;
        }
        Ok(())
    }

    /// Engine settings with config overrides applied
    pub fn engine_config(&self) -> EngineConfig {
        let mut engine = EngineConfig::default();
        if let Some(budget) = self.engine.visit_budget {
            engine.visit_budget = budget;
        }
        if let Some(reuse) = self.printer.reuse_source_text {
            engine.printer.reuse_source_text = reuse;
        }
        engine
    }

    /// Compute the effective set of enabled rules
    pub fn effective_rules(&self, all_rules: &[&str], cli_rules: &[String]) -> HashSet<String> {
        // CLI rules override config completely
        if !cli_rules.is_empty() {
            return cli_rules.iter().cloned().collect();
        }

        let mut rules: HashSet<String> = match &self.rules.enabled {
            Some(enabled) => enabled.iter().cloned().collect(),
            None => all_rules.iter().map(|s| s.to_string()).collect(),
        };

        for disabled in &self.rules.disabled {
            rules.remove(disabled);
        }

        rules
    }

    /// Rule names mentioned in the config that no registered rule carries
    pub fn unknown_rules<'a>(&'a self, all_rules: &[&str]) -> Vec<&'a str> {
        self.rules
            .enabled
            .iter()
            .flatten()
            .chain(&self.rules.disabled)
            .map(String::as_str)
            .filter(|name| !all_rules.contains(name))
            .collect()
    }

    /// Check if a path should be excluded based on config patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        self.paths.exclude.iter().any(|pattern| {
            if let Some(dir_pattern) = pattern.strip_suffix('/') {
                return path_str.contains(&format!("/{}/", dir_pattern))
                    || path_str.starts_with(&format!("{}/", dir_pattern));
            }

            let Ok(glob_pattern) = glob::Pattern::new(pattern) else {
                return false;
            };
            glob_pattern.matches(&path_str)
                || path
                    .file_name()
                    .is_some_and(|name| glob_pattern.matches(&name.to_string_lossy()))
        })
    }
}
