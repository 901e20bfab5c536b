//! File discovery and per-file rewriting

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use symfix_core::text::offset_to_line_column;
use symfix_core::{AppliedChange, Engine};

use crate::config::Config;
use crate::output::ChangeInfo;

/// Result of processing a single file
#[derive(Debug)]
pub struct ProcessResult {
    pub changes: Vec<ChangeInfo>,
    pub old_source: String,
    /// Rewritten text, only when a rule matched
    pub new_source: Option<String>,
}

/// Files to process, plus the given paths that do not exist
pub struct Discovered {
    pub files: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

/// Expand the command-line paths into PHP files
///
/// Files named explicitly are always processed; files found by walking a
/// directory are filtered by extension and the config's exclude patterns.
pub fn discover(paths: &[PathBuf], config: &Config) -> Discovered {
    let mut files = Vec::new();
    let mut missing = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !config.should_exclude(e.path()))
            {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(error = %err, "skipping unreadable entry");
                        continue;
                    }
                };
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "php")
                {
                    files.push(entry.into_path());
                }
            }
        } else {
            missing.push(path.clone());
        }
    }

    files.sort();
    files.dedup();
    debug!(files = files.len(), "discovered files");
    Discovered { files, missing }
}

/// Rewrite a single file in memory
pub fn process_file(path: &Path, engine: &Engine<'_>) -> Result<ProcessResult> {
    let source_code = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let output = engine
        .rewrite(&source_code)
        .with_context(|| format!("Failed to rewrite {}", path.display()))?;

    if !output.has_changes() {
        return Ok(ProcessResult {
            changes: vec![],
            old_source: source_code,
            new_source: None,
        });
    }

    let changes = output
        .changes
        .into_iter()
        .map(|change| change_info(&source_code, change))
        .collect();

    Ok(ProcessResult {
        changes,
        old_source: source_code,
        new_source: Some(output.text),
    })
}

fn change_info(source: &str, change: AppliedChange) -> ChangeInfo {
    let position = change
        .range
        .map(|range| offset_to_line_column(source, range.start as usize));
    ChangeInfo {
        rule: change.rule,
        line: position.map(|(line, _)| line),
        column: position.map(|(_, column)| column),
        message: change.message,
    }
}

/// Write the processed result to the file
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use std::fs;
    use symfix_rules::{LocalTypeResolver, RuleRegistry};
    use tempfile::TempDir;

    #[test]
    fn test_discover_walks_php_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/Controller")).unwrap();
        fs::create_dir_all(root.join("vendor/symfony")).unwrap();
        fs::write(root.join("src/Controller/HomeController.php"), "<?php\n").unwrap();
        fs::write(root.join("src/Kernel.php"), "<?php\n").unwrap();
        fs::write(root.join("src/README.md"), "docs").unwrap();
        fs::write(root.join("vendor/symfony/Response.php"), "<?php\n").unwrap();
        fs::write(root.join("src/Entity.generated.php"), "<?php\n").unwrap();

        let config = Config {
            paths: PathsConfig {
                exclude: vec!["vendor/".to_string(), "*.generated.php".to_string()],
            },
            ..Default::default()
        };
        let discovered = discover(&[root.to_path_buf(), root.join("missing")], &config);

        assert_eq!(
            discovered.files,
            vec![
                root.join("src/Controller/HomeController.php"),
                root.join("src/Kernel.php"),
            ]
        );
        assert_eq!(discovered.missing, vec![root.join("missing")]);
    }

    #[test]
    fn test_explicit_file_is_not_excluded() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Legacy.generated.php");
        fs::write(&file, "<?php\n").unwrap();
        let config = Config {
            paths: PathsConfig {
                exclude: vec!["*.generated.php".to_string()],
            },
            ..Default::default()
        };

        let discovered = discover(std::slice::from_ref(&file), &config);
        assert_eq!(discovered.files, vec![file]);
    }

    #[test]
    fn test_process_file_reports_positions() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("NotFound.php");
        fs::write(
            &file,
            "<?php\nuse Symfony\\Component\\HttpFoundation\\Response;\nfunction notFound(Response $r)\n{\n    $r->setStatusCode(404);\n}\n",
        )
        .unwrap();

        let registry = RuleRegistry::new();
        let resolver = LocalTypeResolver::new();
        let engine = Engine::new(registry.all()).with_resolver(&resolver);
        let result = process_file(&file, &engine).unwrap();

        assert_eq!(result.changes.len(), 1);
        let change = &result.changes[0];
        assert_eq!(change.rule, "status_code_setter");
        assert_eq!(change.line, Some(5));
        assert_eq!(change.column, Some(23));
        assert_eq!(
            result.new_source.as_deref(),
            Some("<?php\nuse Symfony\\Component\\HttpFoundation\\Response;\nfunction notFound(Response $r)\n{\n    $r->setStatusCode(Response::HTTP_NOT_FOUND);\n}\n")
        );
    }

    #[test]
    fn test_process_file_without_changes() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Plain.php");
        fs::write(&file, "<?php\necho 'hi';\n").unwrap();

        let registry = RuleRegistry::new();
        let engine = Engine::new(registry.all());
        let result = process_file(&file, &engine).unwrap();

        assert!(result.changes.is_empty());
        assert!(result.new_source.is_none());
        assert_eq!(result.old_source, "<?php\necho 'hi';\n");
    }

    #[test]
    fn test_process_file_syntax_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Broken.php");
        fs::write(&file, "<?php\nfunction (\n").unwrap();

        let registry = RuleRegistry::new();
        let engine = Engine::new(registry.all());
        let err = process_file(&file, &engine).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to rewrite"));
    }
}
