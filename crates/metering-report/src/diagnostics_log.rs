//! Per-block diagnostics log for maintenance follow-up.
//!
//! Where the block report carries billing figures, this file carries the
//! parse health of every meter file: line counts, faulty percentages,
//! corrupted lines, counter regressions and the failure/recovery timestamp
//! lists the health tracker collected.

use std::path::PathBuf;

use metering_core::error::Result;
use metering_core::formatting::format_number;
use metering_core::models::FileDiagnostics;
use metering_core::settings::PipelineConfig;
use metering_runtime::block_processor::BlockOutcome;
use tracing::debug;

use crate::text::{ensure_output_dir, generated_line, separator, stat_line, write_report_file};

// ── Public API ────────────────────────────────────────────────────────────────

/// Render and write one block's diagnostics log under the configured output
/// directory. Returns the written path.
pub fn write_diagnostics_log(config: &PipelineConfig, outcome: &BlockOutcome) -> Result<PathBuf> {
    ensure_output_dir(&config.output_dir)?;
    let path = config.output_dir.join(format!(
        "diagnostics_{}_{}_{}.txt",
        outcome.block_number, config.target_year, config.target_month
    ));
    let contents = render_diagnostics_log(outcome, config.target_month, config.target_year);
    write_report_file(&path, &contents)?;
    debug!("Diagnostics log written: {}", path.display());
    Ok(path)
}

/// The diagnostics text for one block outcome.
pub fn render_diagnostics_log(outcome: &BlockOutcome, month: u32, year: i32) -> String {
    let sep = separator();
    let runtime = outcome.elapsed.as_secs_f64();
    let mut out = String::new();

    out.push_str(&sep);
    out.push('\n');
    out.push_str("DIAGNOSTIC LOG\n");
    out.push_str(&format!("Block: {}\n", outcome.block_number));
    out.push_str(&format!("Month: {month}/{year}\n"));
    out.push_str(&generated_line());
    out.push_str(&format!(
        "Block Runtime: {:.2} seconds ({:.2} minutes)\n",
        runtime,
        runtime / 60.0
    ));
    out.push_str(&sep);
    out.push('\n');

    if outcome.diagnostics.is_empty() {
        out.push_str("\nNo diagnostics recorded for this block.\n");
    }
    for diagnostic in &outcome.diagnostics {
        push_diagnostic_entry(&mut out, diagnostic);
    }

    if !outcome.failed_files.is_empty() {
        out.push('\n');
        out.push_str(&"-".repeat(crate::text::LINE_WIDTH));
        out.push('\n');
        out.push_str("FAILED FILES (deadline expired before processing)\n");
        for path in &outcome.failed_files {
            out.push_str(&format!("  {}\n", path.display()));
        }
    }

    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn push_diagnostic_entry(out: &mut String, diagnostic: &FileDiagnostics) {
    out.push('\n');
    out.push_str(&format!("METER: {}\n", diagnostic.meter_name));
    out.push_str(&format!("File: {}\n", diagnostic.file_name));
    out.push_str(&stat_line(
        "Raw Line Count:",
        &format_number(diagnostic.raw_line_count as f64, 0),
        "",
    ));
    out.push_str(&stat_line(
        "Total Readings:",
        &format_number(diagnostic.total_readings as f64, 0),
        "",
    ));
    out.push_str(&stat_line(
        "Healthy Readings:",
        &format_number(diagnostic.healthy_count as f64, 0),
        "",
    ));
    out.push_str(&stat_line(
        "Faulty Readings:",
        &format_number(diagnostic.faulty_count as f64, 0),
        "",
    ));
    out.push_str(&stat_line(
        "Faulty Percentage:",
        &format_number(diagnostic.faulty_percentage, 2),
        "%",
    ));
    out.push_str(&stat_line(
        "Corrupted Lines:",
        &format_number(diagnostic.corrupted_line_count as f64, 0),
        "",
    ));
    out.push_str(&stat_line(
        "Counter Regression:",
        if diagnostic.counter_regression {
            "yes"
        } else {
            "no"
        },
        "",
    ));
    out.push_str(&list_line("Failure Timestamps:", &diagnostic.failure_timestamps));
    out.push_str(&list_line(
        "Recovery Timestamps:",
        &diagnostic.recovery_timestamps,
    ));
}

/// Timestamp lists keep the label column but flow free-form to the right,
/// `none` when empty.
fn list_line(label: &str, items: &[String]) -> String {
    if items.is_empty() {
        format!("  {label:<24}none\n")
    } else {
        format!("  {label:<24}{}\n", items.join(", "))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
