//! District summary, written once per run and mirrored to the log.

use std::path::PathBuf;

use metering_core::error::Result;
use metering_core::settings::PipelineConfig;
use metering_runtime::district::DistrictSummary;
use tracing::{debug, info};

use crate::text::{ensure_output_dir, generated_line, separator, write_report_file};

// ── Public API ────────────────────────────────────────────────────────────────

/// Emit the district summary through the log, one formatted block.
pub fn log_district_summary(summary: &DistrictSummary) {
    info!("District summary:\n{}", render_district_summary(summary));
}

/// Render and write the district summary under the configured output
/// directory, creating it if needed. Returns the written path.
pub fn write_district_summary(
    config: &PipelineConfig,
    summary: &DistrictSummary,
) -> Result<PathBuf> {
    ensure_output_dir(&config.output_dir)?;
    let path = config.output_dir.join(format!(
        "district_summary_{}_{}.txt",
        config.target_year, config.target_month
    ));
    write_report_file(&path, &render_district_summary(summary))?;
    debug!("District summary written: {}", path.display());
    Ok(path)
}

/// The district summary text: run counts, district-wide RT/RTH totals over
/// the successful blocks, then a block-by-block breakdown with each block's
/// status.
pub fn render_district_summary(summary: &DistrictSummary) -> String {
    let sep = separator();
    let runtime = summary.elapsed.as_secs_f64();
    let mut out = String::new();

    out.push_str(&sep);
    out.push('\n');
    out.push_str("DISTRICT-LEVEL SUMMARY\n");
    out.push_str(&format!(
        "Month: {}/{}\n",
        summary.target_month, summary.target_year
    ));
    out.push_str(&generated_line());
    out.push_str(&sep);
    out.push('\n');
    out.push('\n');

    out.push_str(&format!(
        "Total Meters Processed: {}\n",
        summary.total_meters
    ));
    out.push_str(&format!(
        "Successful Blocks: {}\n",
        summary.successful_blocks
    ));
    out.push_str(&format!("Empty Blocks: {}\n", summary.no_meter_blocks));
    out.push_str(&format!("No Data Blocks: {}\n", summary.no_data_blocks));
    if !summary.failed_blocks.is_empty() {
        let failed: Vec<String> = summary.failed_blocks.iter().map(u32::to_string).collect();
        out.push_str(&format!("Failed Blocks: {}\n", failed.join(", ")));
    }
    out.push_str(&format!(
        "Total Runtime: {:.2} seconds ({:.2} minutes)\n",
        runtime,
        runtime / 60.0
    ));
    out.push('\n');

    out.push_str("--- RT Statistics (District) ---\n");
    out.push_str(&district_line(
        "Total Totalized Value:",
        &format!("{:.4}", summary.rt_totalized),
        "",
    ));
    out.push_str(&district_line(
        "Total Operating Hours:",
        &format!("{:.2}", summary.rt_operating_hours),
        "",
    ));
    out.push_str(&district_line(
        "Average Data Completeness:",
        &format!("{:.2}", summary.rt_avg_completeness_pct),
        "%",
    ));
    out.push('\n');

    out.push_str("--- RTH Statistics (District) ---\n");
    out.push_str(&district_line(
        "Total Monthly Consumption:",
        &format!("{:.4}", summary.rth_consumption),
        "  (BILLING)",
    ));
    out.push_str(&district_line(
        "Total Totalized Value:",
        &format!("{:.4}", summary.rth_totalized),
        "",
    ));
    out.push_str(&district_line(
        "Average Data Completeness:",
        &format!("{:.2}", summary.rth_avg_completeness_pct),
        "%",
    ));
    out.push('\n');

    out.push_str(&sep);
    out.push('\n');
    out.push_str("BLOCK-BY-BLOCK BREAKDOWN\n");
    out.push_str(&sep);
    out.push('\n');

    for row in &summary.rows {
        out.push('\n');
        out.push_str(&format!(
            "Block {} [{}]:\n",
            row.block_number,
            row.status.as_str()
        ));
        out.push_str(&format!("  Meters: {}\n", row.number_of_meters));
        out.push_str(&format!("  RT Totalized: {:.4}\n", row.rt_totalized));
        out.push_str(&format!(
            "  RTH Monthly Consumption: {:.4}\n",
            row.rth_consumption
        ));
        out.push_str(&format!(
            "  RT Completeness: {:.2}%\n",
            row.rt_completeness_pct
        ));
        out.push_str(&format!(
            "  RTH Completeness: {:.2}%\n",
            row.rth_completeness_pct
        ));
    }

    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// District totals use a wider label column than the per-block reports.
fn district_line(label: &str, value: &str, suffix: &str) -> String {
    format!("  {label:<30}{value:>20}{suffix}\n")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use metering_core::settings::TextEncoding;
    use metering_runtime::block_processor::BlockStatus;
    use metering_runtime::district::BlockSummaryRow;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn test_config(root: &Path) -> PipelineConfig {
        PipelineConfig {
            data_root: root.to_path_buf(),
            output_dir: root.join("reports"),
            target_month: 10,
            target_year: 2025,
            blocks: vec![80, 82, 84],
            folder_prefixes: vec!["J_B_".to_string()],
            rt_postfix: "BTUREADINGS11MIN.txt".to_string(),
            rth_postfix: "ACCBTUReadingS11MIN.txt".to_string(),
            sample_interval_hours: 11.0 / 60.0,
            encoding: TextEncoding::Utf8,
            health_markers_enabled: true,
            workers: 2,
            block_deadline: None,
            write_csv: false,
        }
    }

    fn make_summary() -> DistrictSummary {
        DistrictSummary {
            target_month: 10,
            target_year: 2025,
            blocks_processed: 3,
            successful_blocks: 2,
            no_meter_blocks: 1,
            no_data_blocks: 0,
            failed_blocks: Vec::new(),
            total_meters: 2,
            rt_totalized: 100.0,
            rt_operating_hours: 1.1,
            rt_avg_completeness_pct: 98.5,
            rth_consumption: 110.0,
            rth_totalized: 410.0,
            rth_avg_completeness_pct: 99.25,
            rows: vec![
                BlockSummaryRow {
                    block_number: 80,
                    status: BlockStatus::Success,
                    number_of_meters: 1,
                    rt_totalized: 30.0,
                    rt_completeness_pct: 100.0,
                    rth_consumption: 50.0,
                    rth_completeness_pct: 100.0,
                },
                BlockSummaryRow {
                    block_number: 82,
                    status: BlockStatus::Success,
                    number_of_meters: 1,
                    rt_totalized: 70.0,
                    rt_completeness_pct: 97.0,
                    rth_consumption: 60.0,
                    rth_completeness_pct: 98.5,
                },
                BlockSummaryRow {
                    block_number: 84,
                    status: BlockStatus::NoMeters,
                    number_of_meters: 0,
                    rt_totalized: 0.0,
                    rt_completeness_pct: 0.0,
                    rth_consumption: 0.0,
                    rth_completeness_pct: 0.0,
                },
            ],
            elapsed: Duration::from_secs(90),
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    #[test]
    fn test_render_counts_and_totals() {
        let text = render_district_summary(&make_summary());

        assert!(text.contains("DISTRICT-LEVEL SUMMARY"));
        assert!(text.contains("Month: 10/2025"));
        assert!(text.contains("Total Meters Processed: 2"));
        assert!(text.contains("Successful Blocks: 2"));
        assert!(text.contains("Empty Blocks: 1"));
        assert!(text.contains("No Data Blocks: 0"));
        assert!(!text.contains("Failed Blocks:"));
        assert!(text.contains("Total Runtime: 90.00 seconds (1.50 minutes)"));
        assert!(text.contains("--- RT Statistics (District) ---"));
        assert!(text.contains("--- RTH Statistics (District) ---"));
        assert_eq!(text.matches("(BILLING)").count(), 1);
    }

    #[test]
    fn test_render_breakdown_rows_with_status() {
        let text = render_district_summary(&make_summary());

        assert!(text.contains("BLOCK-BY-BLOCK BREAKDOWN"));
        assert!(text.contains("Block 80 [success]:"));
        assert!(text.contains("  RT Totalized: 30.0000"));
        assert!(text.contains("  RTH Monthly Consumption: 50.0000"));
        assert!(text.contains("  RT Completeness: 97.00%"));
        assert!(text.contains("Block 84 [no_meters]:"));
        assert!(text.contains("  Meters: 0"));

        // Rows keep run order.
        let first = text.find("Block 80 ").unwrap();
        let last = text.find("Block 84 ").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_render_failed_blocks_line() {
        let mut summary = make_summary();
        summary.failed_blocks = vec![86, 88];
        let text = render_district_summary(&summary);
        assert!(text.contains("Failed Blocks: 86, 88"));
    }

    #[test]
    fn test_render_district_alignment() {
        let text = render_district_summary(&make_summary());

        let totalized = text
            .lines()
            .find(|l| l.trim_start().starts_with("Total Totalized Value:"))
            .unwrap();
        // 2 indent + 30 label field + 20 value field.
        assert_eq!(totalized.len(), 52);
        assert!(totalized.ends_with("100.0000"));

        let completeness = text
            .lines()
            .find(|l| l.trim_start().starts_with("Average Data Completeness:"))
            .unwrap();
        assert!(completeness.ends_with("98.50%"));
    }

    // ── Writing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_write_district_summary_creates_dir_and_file() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());

        let path = write_district_summary(&config, &make_summary()).unwrap();

        assert_eq!(path.file_name().unwrap(), "district_summary_2025_10.txt");
        assert!(path.starts_with(&config.output_dir));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("DISTRICT-LEVEL SUMMARY"));
        assert!(written.contains("BLOCK-BY-BLOCK BREAKDOWN"));
    }
}
