//! symfix CLI - Symfony upgrade rewrites for PHP sources
//!
//! Available rules:
//! - status_code_setter: `setStatusCode(404)` to `Response::HTTP_NOT_FOUND`
//! - status_code_assertion: status codes in functional test assertions
//! - status_code_redirect: status codes in controller redirects
//! - status_code_constructor: status codes in `new Response(...)`
//! - status_code_comparison: literals compared with `getStatusCode()`
//! - rename_method: configured method renames
//! - add_return_type: return types required by parent signatures
//! - logout_handler_to_subscriber: logout handlers to `LogoutEvent` subscribers
//! - logout_success_handler_to_subscriber: logout success handlers to subscribers

mod config;
mod logging;
mod output;
mod process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

use config::Config;
use output::{ChangeInfo, OutputFormat, Reporter};
use process::{discover, process_file, write_file};
use symfix_core::Engine;
use symfix_rules::{ClassNameControllerContext, LocalTypeResolver, RuleRegistry, RuleSet};

#[derive(Parser)]
#[command(name = "symfix")]
#[command(version)]
#[command(about = "Structural Symfony upgrade rewrites for PHP sources")]
struct Cli {
    /// Files or directories to process
    #[arg(required_unless_present = "list_rules")]
    paths: Vec<PathBuf>,

    /// Apply fixes to files (default is to report pending changes)
    #[arg(long)]
    fix: bool,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Rules to run (can be specified multiple times). Overrides config file.
    #[arg(long, short = 'r', value_name = "RULE")]
    rule: Vec<String>,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Path to config file (default: auto-detect .symfix.toml)
    #[arg(long, value_name = "PATH", conflicts_with = "no_config")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,

    /// YAML rule set (overrides the config file's [rule_set] path)
    #[arg(long, value_name = "PATH")]
    rule_set: Option<PathBuf>,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Also write logs to a file (timestamped file in the temp dir if no path)
    #[arg(long, value_name = "PATH")]
    log_file: Option<Option<PathBuf>>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_path = logging::init(
        cli.verbose,
        cli.log_file.as_ref().map(|path| path.as_deref()),
    )?;
    if let Some(path) = &log_path {
        info!(path = %path.display(), "writing log file");
    }

    let (config, config_path) = load_config(&cli)?;
    if let Some(path) = &config_path {
        debug!(path = %path.display(), "loaded config");
    }

    let rule_set = load_rule_set(cli.rule_set.as_deref().or(config.rule_set.path.as_deref()))?;
    let registry = RuleRegistry::from_rule_set(&rule_set);

    if cli.list_rules {
        println!("{}", "Available rules:".bold());
        for (name, description) in registry.list_rules() {
            println!("  {} - {}", name.green(), description);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let format_name = cli
        .format
        .as_deref()
        .or(config.output.format.as_deref())
        .unwrap_or("text");
    let output_format = OutputFormat::from_str(format_name).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid output format '{}'. Valid options: text, json, diff",
            format_name
        )
    })?;

    let all_rules = registry.all_names();
    for rule in &cli.rule {
        if !all_rules.contains(&rule.as_str()) {
            bail!(
                "Unknown rule '{}'. Use --list-rules to see available rules.",
                rule
            );
        }
    }
    for rule in config.unknown_rules(&all_rules) {
        warn!(rule, "config names an unknown rule");
    }

    let enabled_rules = config.effective_rules(&all_rules, &cli.rule);
    if enabled_rules.is_empty() {
        bail!("No rules enabled");
    }

    let fix_mode = cli.fix;
    let check_mode = !fix_mode;

    if cli.verbose && output_format == OutputFormat::Text {
        if let Some(path) = &config_path {
            println!("{}: {}", "Using config".bold(), path.display());
        }
        println!("{}: {}", "Mode".bold(), if fix_mode { "fix" } else { "check" });
        let mut names: Vec<_> = enabled_rules.iter().map(String::as_str).collect();
        names.sort_unstable();
        println!("{}: {}", "Rules".bold(), names.join(", "));
        println!();
    }

    let discovered = discover(&cli.paths, &config);
    for path in &discovered.missing {
        eprintln!("{}: Path does not exist: {}", "Warning".yellow(), path.display());
    }

    let resolver = LocalTypeResolver::new();
    let controllers = ClassNameControllerContext;
    let engine = Engine::new(registry.get_enabled(&enabled_rules))
        .with_resolver(&resolver)
        .with_controllers(&controllers)
        .with_config(config.engine_config());

    // Files are independent; results come back in discovery (sorted) order
    let results: Vec<FileOutcome> = discovered
        .files
        .par_iter()
        .map(|path| process_to_outcome(path, &engine))
        .collect();

    let mut reporter = Reporter::new(output_format, cli.verbose);
    for (outcome, path) in results.into_iter().zip(&discovered.files) {
        report_outcome(path, outcome, fix_mode, &mut reporter);
    }

    let summary = reporter.summary();
    let exit_code = if summary.errors > 0 || !discovered.missing.is_empty() {
        ExitCode::from(1)
    } else if check_mode && summary.files_with_changes > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish(check_mode)?;
    Ok(exit_code)
}

fn load_config(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    if cli.no_config {
        return Ok((Config::default(), None));
    }
    if let Some(path) = &cli.config {
        return Ok((Config::load_path(path)?, Some(path.clone())));
    }
    Ok(match Config::load()? {
        Some((config, path)) => (config, Some(path)),
        None => (Config::default(), None),
    })
}

fn load_rule_set(path: Option<&Path>) -> Result<RuleSet> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading rule set");
            RuleSet::from_file(path)
                .with_context(|| format!("Failed to load rule set {}", path.display()))
        }
        None => Ok(RuleSet::default()),
    }
}

/// Result of processing a single file, before any write
enum FileOutcome {
    Unchanged,
    Changed {
        changes: Vec<ChangeInfo>,
        old_source: String,
        new_source: String,
    },
    Error(String),
}

fn process_to_outcome(path: &Path, engine: &Engine<'_>) -> FileOutcome {
    match process_file(path, engine) {
        Ok(result) => match result.new_source {
            Some(new_source) => FileOutcome::Changed {
                changes: result.changes,
                old_source: result.old_source,
                new_source,
            },
            None => FileOutcome::Unchanged,
        },
        Err(e) => FileOutcome::Error(format!("{:#}", e)),
    }
}

/// Report a file outcome, writing the fix in fix mode
fn report_outcome(path: &Path, outcome: FileOutcome, fix_mode: bool, reporter: &mut Reporter) {
    match outcome {
        FileOutcome::Unchanged => reporter.report_unchanged(path),
        FileOutcome::Changed {
            changes,
            old_source,
            new_source,
        } => {
            if !fix_mode {
                reporter.report_check(path, changes, &old_source, &new_source);
                return;
            }
            match write_file(path, &new_source) {
                Ok(()) => reporter.report_fix(path, changes),
                Err(e) => reporter.report_error(path, &format!("{:#}", e)),
            }
        }
        FileOutcome::Error(msg) => reporter.report_error(path, &msg),
    }
}
