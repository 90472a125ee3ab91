use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the metering pipeline crates.
///
/// Per-line and per-file faults (malformed lines, unreadable meter files,
/// counter regressions) are absorbed into diagnostic counters and never
/// surface here; only container-contract and precondition violations, plus
/// genuine I/O trouble outside the parsing path, propagate as errors.
#[derive(Error, Debug)]
pub enum MeteringError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raw readings were requested from a block container after release.
    #[error("Raw data for block {0} is no longer available (released)")]
    DataNotAvailable(u32),

    /// Block aggregation was invoked outside its lifecycle contract.
    #[error("Aggregation precondition violated for block {block}: {reason}")]
    AggregationPrecondition { block: u32, reason: String },

    /// A report file could not be created or written.
    #[error("Failed to write report {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the metering crates.
pub type Result<T> = std::result::Result<T, MeteringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = MeteringError::FileRead {
            path: PathBuf::from("/data/J_B_80_01/readings.txt"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/J_B_80_01/readings.txt"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_data_not_available() {
        let err = MeteringError::DataNotAvailable(80);
        assert_eq!(
            err.to_string(),
            "Raw data for block 80 is no longer available (released)"
        );
    }

    #[test]
    fn test_error_display_aggregation_precondition() {
        let err = MeteringError::AggregationPrecondition {
            block: 82,
            reason: "already aggregated".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("block 82"));
        assert!(msg.contains("already aggregated"));
    }

    #[test]
    fn test_error_display_report_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = MeteringError::ReportWrite {
            path: PathBuf::from("/reports/block_80_2025_10.txt"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to write report"));
        assert!(msg.contains("block_80_2025_10.txt"));
    }

    #[test]
    fn test_error_display_config() {
        let err = MeteringError::Config("month must be 1-12".to_string());
        assert_eq!(err.to_string(), "Configuration error: month must be 1-12");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: MeteringError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }
}
