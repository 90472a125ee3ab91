//! Per-block analysis report, the primary operator-facing text output.
//!
//! One file per block and month: a block-level summary section followed by
//! one section per meter, RT and RTH statistics each in their own
//! sub-section. Numeric columns are right-aligned with thousands
//! separators, four decimals for values and two for hours and percentages.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use metering_core::error::Result;
use metering_core::formatting::format_number;
use metering_core::models::{BlockStatistics, MeterEntry, MeterStatistics, RtStats, RthStats};
use metering_core::settings::PipelineConfig;
use metering_core::time_utils::format_diag_timestamp;
use metering_runtime::block_processor::BlockOutcome;
use tracing::debug;

use crate::text::{ensure_output_dir, generated_line, separator, stat_line, write_report_file};

// ── Public API ────────────────────────────────────────────────────────────────

/// Render and write one block's report under the configured output
/// directory, creating it if needed. Returns the written path.
pub fn write_block_report(config: &PipelineConfig, outcome: &BlockOutcome) -> Result<PathBuf> {
    ensure_output_dir(&config.output_dir)?;
    let path = config.output_dir.join(format!(
        "block_{}_{}_{}.txt",
        outcome.block_number, config.target_year, config.target_month
    ));
    let contents = render_block_report(outcome, config.target_month, config.target_year);
    write_report_file(&path, &contents)?;
    debug!("Block report written: {}", path.display());
    Ok(path)
}

/// The report text for one block outcome.
///
/// A block without statistics (no meters, or no readings anywhere) still
/// renders the full header and footer around a single explanatory line.
pub fn render_block_report(outcome: &BlockOutcome, month: u32, year: i32) -> String {
    let sep = separator();
    let mut out = String::new();

    out.push_str(&sep);
    out.push('\n');
    out.push_str("METERING DATA ANALYSIS REPORT\n");
    out.push_str(&format!("Block: {}\n", outcome.block_number));
    out.push_str(&format!("Month: {month}/{year}\n"));
    out.push_str(&generated_line());
    out.push_str(&sep);
    out.push('\n');

    match &outcome.statistics {
        Some(stats) if !stats.meter_statistics.is_empty() => {
            push_block_summary(&mut out, &sep, stats);
            for name in stats.sorted_meter_names() {
                if let Some(entry) = stats.meter_statistics.get(name) {
                    push_meter_section(&mut out, &sep, name, entry);
                }
            }
        }
        _ => {
            out.push_str("\nNo meter data available for this block.\n");
        }
    }

    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    out.push_str("END OF REPORT\n");
    out.push_str(&sep);
    out.push('\n');
    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn push_block_summary(out: &mut String, sep: &str, stats: &BlockStatistics) {
    out.push('\n');
    out.push_str(sep);
    out.push('\n');
    out.push_str(&format!("BLOCK {} - SUMMARY\n", stats.block_number));
    out.push_str(sep);
    out.push('\n');

    out.push_str("\n--- Block RT Statistics ---\n");
    out.push_str(&stat_line(
        "Number of Meters:",
        &stats.rt.meter_count.to_string(),
        "",
    ));
    out.push_str(&stat_line(
        "Block Totalized Value:",
        &format_number(stats.rt.totalized_value, 4),
        "",
    ));
    out.push_str(&stat_line(
        "Block Average Value:",
        &format_number(stats.rt.average_value, 4),
        "",
    ));
    out.push_str(&stat_line(
        "Total Operating Hours:",
        &format_number(stats.rt.total_operating_hours, 2),
        "",
    ));
    out.push_str(&stat_line(
        "Data Completeness:",
        &format_number(stats.rt.completeness_pct, 2),
        "%",
    ));

    out.push_str("\n--- Block RTH Statistics ---\n");
    out.push_str(&stat_line(
        "Number of Meters:",
        &stats.rth.meter_count.to_string(),
        "",
    ));
    out.push_str(&stat_line(
        "Monthly Consumption:",
        &format_number(stats.rth.monthly_consumption, 4),
        "  (BILLING)",
    ));
    out.push_str(&stat_line(
        "Block Totalized Value:",
        &format_number(stats.rth.totalized_value, 4),
        "",
    ));
    out.push_str(&stat_line(
        "Data Completeness:",
        &format_number(stats.rth.completeness_pct, 2),
        "%",
    ));
}

fn push_meter_section(out: &mut String, sep: &str, name: &str, entry: &MeterEntry) {
    out.push('\n');
    out.push_str(sep);
    out.push('\n');
    out.push_str(&format!("METER: {name}\n"));
    out.push_str(sep);
    out.push('\n');

    if let Some(meter) = &entry.rt {
        if let Some(rt) = meter.rt() {
            push_rt_section(out, meter, rt);
        }
    }
    if let Some(meter) = &entry.rth {
        if let Some(rth) = meter.rth() {
            push_rth_section(out, meter, rth);
        }
    }
}

fn push_rt_section(out: &mut String, meter: &MeterStatistics, rt: &RtStats) {
    out.push_str("\n--- RT Statistics ---\n");
    out.push_str(&stat_line(
        "Totalized Value:",
        &format_number(rt.totalized_value, 4),
        "",
    ));
    out.push_str(&stat_line(
        "Average Value:",
        &format_number(rt.average_value, 4),
        "",
    ));
    out.push_str(&stat_line(
        "Operating Hours:",
        &format_number(rt.operating_hours, 2),
        "",
    ));
    push_count_lines(out, meter);
}

fn push_rth_section(out: &mut String, meter: &MeterStatistics, rth: &RthStats) {
    out.push_str("\n--- RTH Statistics ---\n");
    out.push_str(&stat_line(
        "Monthly Consumption:",
        &format_number(rth.monthly_consumption, 4),
        "  (BILLING)",
    ));
    out.push_str(&stat_line(
        "Totalized Value:",
        &format_number(rth.totalized_value, 4),
        "",
    ));
    out.push_str(&stat_line(
        "First Value:",
        &format_number(rth.first_healthy_value, 4),
        "",
    ));
    out.push_str(&stat_line(
        "First Timestamp:",
        &timestamp_or_na(rth.first_healthy_timestamp),
        "",
    ));
    out.push_str(&stat_line(
        "Last Value:",
        &format_number(rth.last_healthy_value, 4),
        "",
    ));
    out.push_str(&stat_line(
        "Last Timestamp:",
        &timestamp_or_na(rth.last_healthy_timestamp),
        "",
    ));
    push_count_lines(out, meter);
}

fn push_count_lines(out: &mut String, meter: &MeterStatistics) {
    out.push_str(&stat_line(
        "Healthy Data Points:",
        &format_number(meter.healthy_count as f64, 0),
        "",
    ));
    out.push_str(&stat_line(
        "Faulty Data Points:",
        &format_number(meter.faulty_count as f64, 0),
        "",
    ));
    out.push_str(&stat_line(
        "Data Completeness:",
        &format_number(meter.completeness_pct, 2),
        "%",
    ));
}

fn timestamp_or_na(ts: Option<NaiveDateTime>) -> String {
    ts.map(format_diag_timestamp)
        .unwrap_or_else(|| "N/A".to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
