//! Tracing subscriber setup
//!
//! Logs go to stderr, filtered by `RUST_LOG` when set. `--log-file` adds an
//! un-colored copy at the given path or at a timestamped file in the temp
//! directory.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a run
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "symfix=debug"
    } else {
        "warn"
    }
}

/// Timestamped log file name used when `--log-file` has no value
pub fn default_log_path() -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    std::env::temp_dir().join(format!("symfix-{}.log", timestamp))
}

/// Install the global subscriber; returns the log file path, if any
///
/// `log_file` is `None` without `--log-file`, `Some(None)` for the bare flag.
pub fn init(verbose: bool, log_file: Option<Option<&Path>>) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let log_path = log_file.map(|path| path.map_or_else(default_log_path, Path::to_path_buf));
    let file_layer = match &log_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "symfix=debug");
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }

    #[test]
    fn test_default_log_path() {
        let path = default_log_path();
        assert!(path.starts_with(std::env::temp_dir()));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("symfix-"));
        assert!(name.ends_with(".log"));
    }
}
