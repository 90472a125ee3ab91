//! Machine-readable CSV exports of the block and meter statistics.
//!
//! Values are written plain (no thousands separators) so the files load
//! cleanly into spreadsheets and downstream tooling. Cells that do not
//! apply to a row's kind or status stay empty rather than carrying zeros.

use std::path::{Path, PathBuf};

use metering_core::error::{MeteringError, Result};
use metering_core::models::KindStats;
use metering_core::settings::PipelineConfig;
use metering_core::time_utils::format_diag_timestamp;
use metering_runtime::block_processor::BlockOutcome;
use tracing::debug;

use crate::text::ensure_output_dir;

const BLOCK_HEADER: [&str; 10] = [
    "Block",
    "Status",
    "Number_of_Meters",
    "RT_Totalized",
    "RT_Average",
    "RT_Operating_Hours",
    "RT_Data_Completeness",
    "RTH_Monthly_Consumption",
    "RTH_Totalized",
    "RTH_Data_Completeness",
];

const METER_HEADER: [&str; 16] = [
    "Block",
    "Meter_Name",
    "Kind",
    "Healthy_Count",
    "Faulty_Count",
    "Data_Completeness",
    "RT_Totalized",
    "RT_Average",
    "RT_Operating_Hours",
    "RTH_Monthly_Consumption",
    "RTH_Totalized",
    "RTH_First_Value",
    "RTH_First_Timestamp",
    "RTH_Last_Value",
    "RTH_Last_Timestamp",
    "Counter_Regression",
];

// ── Public API ────────────────────────────────────────────────────────────────

/// Write `block_statistics.csv`: one row per processed block, in run order.
/// Blocks without statistics keep their status row with empty value cells.
pub fn write_block_csv(config: &PipelineConfig, outcomes: &[BlockOutcome]) -> Result<PathBuf> {
    ensure_output_dir(&config.output_dir)?;
    let path = config.output_dir.join("block_statistics.csv");

    let mut writer = csv::Writer::from_path(&path).map_err(|e| csv_error(&path, e))?;
    writer
        .write_record(BLOCK_HEADER)
        .map_err(|e| csv_error(&path, e))?;

    for outcome in outcomes {
        let mut record = vec![
            outcome.block_number.to_string(),
            outcome.status.as_str().to_string(),
        ];
        match &outcome.statistics {
            Some(stats) => record.extend([
                stats.number_of_meters.to_string(),
                cell4(stats.rt.totalized_value),
                cell4(stats.rt.average_value),
                cell2(stats.rt.total_operating_hours),
                cell2(stats.rt.completeness_pct),
                cell4(stats.rth.monthly_consumption),
                cell4(stats.rth.totalized_value),
                cell2(stats.rth.completeness_pct),
            ]),
            None => record.extend(std::iter::repeat(String::new()).take(8)),
        }
        writer
            .write_record(&record)
            .map_err(|e| csv_error(&path, e))?;
    }

    writer.flush().map_err(|e| MeteringError::ReportWrite {
        path: path.clone(),
        source: e,
    })?;
    debug!("Block CSV written: {}", path.display());
    Ok(path)
}

/// Write `meter_statistics.csv`: one row per ingested meter record, so a
/// meter with both kinds contributes an RT row and an RTH row.
pub fn write_meter_csv(config: &PipelineConfig, outcomes: &[BlockOutcome]) -> Result<PathBuf> {
    ensure_output_dir(&config.output_dir)?;
    let path = config.output_dir.join("meter_statistics.csv");

    let mut writer = csv::Writer::from_path(&path).map_err(|e| csv_error(&path, e))?;
    writer
        .write_record(METER_HEADER)
        .map_err(|e| csv_error(&path, e))?;

    for outcome in outcomes {
        let stats = match &outcome.statistics {
            Some(stats) => stats,
            None => continue,
        };
        for name in stats.sorted_meter_names() {
            let entry = match stats.meter_statistics.get(name) {
                Some(entry) => entry,
                None => continue,
            };
            for meter in entry.records() {
                let mut record = vec![
                    outcome.block_number.to_string(),
                    meter.meter_name.clone(),
                    meter.kind().as_str().to_string(),
                    meter.healthy_count.to_string(),
                    meter.faulty_count.to_string(),
                    cell2(meter.completeness_pct),
                ];
                match &meter.kind_stats {
                    KindStats::Rt(rt) => {
                        record.extend([
                            cell4(rt.totalized_value),
                            cell4(rt.average_value),
                            cell2(rt.operating_hours),
                        ]);
                        record.extend(std::iter::repeat(String::new()).take(7));
                    }
                    KindStats::Rth(rth) => {
                        record.extend(std::iter::repeat(String::new()).take(3));
                        record.extend([
                            cell4(rth.monthly_consumption),
                            cell4(rth.totalized_value),
                            cell4(rth.first_healthy_value),
                            rth.first_healthy_timestamp
                                .map(format_diag_timestamp)
                                .unwrap_or_default(),
                            cell4(rth.last_healthy_value),
                            rth.last_healthy_timestamp
                                .map(format_diag_timestamp)
                                .unwrap_or_default(),
                            rth.counter_regression.to_string(),
                        ]);
                    }
                }
                writer
                    .write_record(&record)
                    .map_err(|e| csv_error(&path, e))?;
            }
        }
    }

    writer.flush().map_err(|e| MeteringError::ReportWrite {
        path: path.clone(),
        source: e,
    })?;
    debug!("Meter CSV written: {}", path.display());
    Ok(path)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn cell4(value: f64) -> String {
    format!("{value:.4}")
}

fn cell2(value: f64) -> String {
    format!("{value:.2}")
}

fn csv_error(path: &Path, e: csv::Error) -> MeteringError {
    MeteringError::ReportWrite {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
