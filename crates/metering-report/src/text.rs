//! Shared plumbing for the plain-text report writers.

use std::path::Path;

use metering_core::error::{MeteringError, Result};

/// Width of every section divider in the text reports.
pub(crate) const LINE_WIDTH: usize = 80;

pub(crate) fn separator() -> String {
    "=".repeat(LINE_WIDTH)
}

/// One `label: value` statistics line: two-space indent, label padded to a
/// 24-column field, value right-aligned in 15. `suffix` carries the `%` or
/// billing tag outside the aligned field.
pub(crate) fn stat_line(label: &str, value: &str, suffix: &str) -> String {
    format!("  {label:<24}{value:>15}{suffix}\n")
}

/// Timestamp line for report headers, local wall-clock time.
pub(crate) fn generated_line() -> String {
    format!(
        "Generated: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

pub(crate) fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| MeteringError::ReportWrite {
        path: dir.to_path_buf(),
        source: e,
    })
}

pub(crate) fn write_report_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| MeteringError::ReportWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
