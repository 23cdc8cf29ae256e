//! # Logging Initialization
//!
//! Installs the global `tracing` subscriber for the `fanin` binary.
//!
//! - **Environment filter**: `RUST_LOG` wins when set; otherwise the given level
//!   applies to everything, with `debug` for the `fanin` and `fanin_common` crates.
//! - **Stderr** (default): ANSI colored output.
//! - **File** (`log_to_file = true`): a daily rolling file in the user cache
//!   directory, without colors. Falls back to stderr when that directory cannot be
//!   determined or written.
//!
//! Initialization runs at most once per process; later calls are ignored.

use anyhow::Result;
use directories::ProjectDirs;
use std::{io::stderr, path::Path, sync::Once};
use tracing_subscriber::{EnvFilter, fmt::layer, prelude::*};

static INIT: Once = Once::new();

pub const LOG_FILE_PREFIX: &str = "fanin.log";

/// Initialize verbose logging for tests.
///
/// This configures a `trace`-level subscriber that logs to stderr.
pub fn init_test_logging() {
    init_logging("trace", false).expect("Failed to initialize test logging");
}

/// Default filter directive used when `RUST_LOG` is not set
pub fn default_filter(log_level: &str) -> String {
    format!("{log_level},fanin=debug,fanin_common=debug")
}

/// Initializes the logging system.
///
/// Logs to stderr with colors, or to a daily rolling file when `log_to_file` is set.
pub fn init_logging(log_level: &str, log_to_file: bool) -> Result<()> {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

        if log_to_file
            && let Some(proj_dirs) = ProjectDirs::from("com", "Fanin", "fanin")
            && can_write_to(proj_dirs.cache_dir())
        {
            let file_appender =
                tracing_appender::rolling::daily(proj_dirs.cache_dir(), LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer().with_writer(non_blocking).with_ansi(false))
                .init();
            // Leaked so buffered lines are flushed until process exit.
            Box::leak(Box::new(guard));
            return;
        }

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer().with_writer(stderr).with_ansi(true))
            .init();
    });

    Ok(())
}

/// Test if we can write to the given directory, creating it if needed.
///
/// `tracing_appender::rolling::daily` panics on permission errors, so check first.
fn can_write_to(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }

    let probe = dir.join(".fanin_log_test");
    match std::fs::write(&probe, "test") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_format() {
        assert_eq!(
            default_filter("info"),
            "info,fanin=debug,fanin_common=debug"
        );
        assert_eq!(
            default_filter("warn"),
            "warn,fanin=debug,fanin_common=debug"
        );
    }

    #[test]
    fn test_can_write_to_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_dir = temp_dir.path().join("nested").join("logs");
        assert!(can_write_to(&log_dir));
        assert!(log_dir.exists());
        assert!(!log_dir.join(".fanin_log_test").exists());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_test_logging();
        assert!(init_logging("info", false).is_ok());
    }
}
