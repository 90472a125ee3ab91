use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// The CLI log level supplies the default directive; a `RUST_LOG`
/// environment variable takes precedence when set, so per-module filtering
/// stays available without extra flags.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive_for(log_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer().with_target(false).with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();

    Ok(())
}

/// Map the CLI's uppercase level names to tracing directives.
fn directive_for(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

// ── Output directory bootstrap ─────────────────────────────────────────────────

/// Create the report output directory (and any missing parents) up front,
/// so a bad `--output-dir` fails the run before any block is processed.
pub fn ensure_output_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directive_for_maps_cli_levels() {
        assert_eq!(directive_for("DEBUG"), "debug");
        assert_eq!(directive_for("INFO"), "info");
        assert_eq!(directive_for("WARNING"), "warn");
        assert_eq!(directive_for("ERROR"), "error");
    }

    #[test]
    fn test_directive_for_is_case_insensitive() {
        assert_eq!(directive_for("warning"), "warn");
        assert_eq!(directive_for("Debug"), "debug");
    }

    #[test]
    fn test_directive_for_unknown_falls_back_to_info() {
        assert_eq!(directive_for("VERBOSE"), "info");
    }

    #[test]
    fn test_ensure_output_dir_creates_nested() {
        let tmp = TempDir::new().expect("tempdir");
        let nested = tmp.path().join("reports").join("2025");

        ensure_output_dir(&nested).expect("ensure_output_dir should succeed");

        assert!(nested.is_dir(), "output dir must exist");
    }
}
