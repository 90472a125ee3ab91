use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which aggregation formula set applies to a meter's readings.
///
/// A meter is ingested as exactly one kind per pass; the kind comes from the
/// file-name convention resolved by discovery, never from the data itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeasurementKind {
    /// Instantaneous sample (e.g. flow rate), aggregated by summing and
    /// averaging the healthy values.
    Rt,
    /// Accumulated counter, monotonically non-decreasing while healthy;
    /// consumption is derived from the first and last healthy values.
    Rth,
}

impl MeasurementKind {
    /// Short uppercase label used in file names, reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementKind::Rt => "RT",
            MeasurementKind::Rth => "RTH",
        }
    }
}

/// A single decoded meter sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Local timestamp of the sample, exactly as written in the log.
    pub timestamp: NaiveDateTime,
    /// Measured value; forced to `0.0` while the sensor is unhealthy.
    pub value: f64,
    /// Health state in effect when this line was read.
    pub is_healthy: bool,
}

/// Per-file parse diagnostics for one meter.
///
/// `raw_line_count` counts every non-empty line consumed (markers, comments
/// and corrupt lines included), so it is always >= `total_readings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDiagnostics {
    /// Meter (folder) name this file belongs to.
    pub meter_name: String,
    /// File name the readings were parsed from.
    pub file_name: String,
    /// Number of readings produced (`healthy_count + faulty_count`).
    pub total_readings: u64,
    /// Every non-empty line consumed, including markers and corrupt lines.
    pub raw_line_count: u64,
    /// Readings produced while the sensor was healthy.
    pub healthy_count: u64,
    /// Readings produced while the sensor was unhealthy.
    pub faulty_count: u64,
    /// `faulty_count / total_readings * 100`, rounded to two decimals.
    pub faulty_percentage: f64,
    /// Timestamps (ISO `yyyy-MM-dd HH:mm:ss`) of the last healthy reading
    /// before each `#stop` marker.
    #[serde(default)]
    pub failure_timestamps: Vec<String>,
    /// Timestamps of the first reading after each `#start` marker.
    #[serde(default)]
    pub recovery_timestamps: Vec<String>,
    /// Lines dropped because they could not be decoded.
    pub corrupted_line_count: u64,
    /// Set when an accumulated counter ran backwards over the month.
    #[serde(default)]
    pub counter_regression: bool,
}

impl FileDiagnostics {
    /// Zero-filled diagnostics carrying only the meter and file names.
    ///
    /// Returned for files that could not be opened, so the missing meter
    /// still shows up in diagnostic output.
    pub fn empty(meter_name: &str, file_name: &str) -> Self {
        FileDiagnostics {
            meter_name: meter_name.to_string(),
            file_name: file_name.to_string(),
            ..Default::default()
        }
    }
}

/// Monthly aggregates for an instantaneous (RT) meter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RtStats {
    /// Sum of all healthy sample values over the month.
    pub totalized_value: f64,
    /// Mean healthy sample value; `0.0` when no healthy samples exist.
    pub average_value: f64,
    /// Healthy sample count times the configured sample interval, in hours.
    pub operating_hours: f64,
}

/// Monthly aggregates for an accumulated (RTH) meter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RthStats {
    /// Value of the first healthy reading in the month.
    pub first_healthy_value: f64,
    /// Timestamp of the first healthy reading, if any exists.
    pub first_healthy_timestamp: Option<NaiveDateTime>,
    /// Value of the last healthy reading in the month.
    pub last_healthy_value: f64,
    /// Timestamp of the last healthy reading, if any exists.
    pub last_healthy_timestamp: Option<NaiveDateTime>,
    /// `last_healthy_value - first_healthy_value`, clamped to zero.
    pub monthly_consumption: f64,
    /// The running cumulative reading, i.e. the last healthy value.
    pub totalized_value: f64,
    /// Set when the counter ran backwards (`last < first`).
    #[serde(default)]
    pub counter_regression: bool,
}

/// The kind-specific half of a meter's statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum KindStats {
    Rt(RtStats),
    Rth(RthStats),
}

/// Monthly statistics for one meter, keyed by `(meter_name, block_number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterStatistics {
    /// Meter (folder) name.
    pub meter_name: String,
    /// Building block this meter belongs to.
    pub block_number: u32,
    /// Readings taken while the sensor was healthy.
    pub healthy_count: u64,
    /// Readings taken while the sensor was unhealthy.
    pub faulty_count: u64,
    /// `healthy_count + faulty_count`.
    pub total_count: u64,
    /// `healthy_count / total_count * 100`, rounded to two decimals.
    pub completeness_pct: f64,
    /// RT or RTH aggregates, depending on how the meter was ingested.
    pub kind_stats: KindStats,
}

impl MeterStatistics {
    /// The measurement kind this meter was ingested as.
    pub fn kind(&self) -> MeasurementKind {
        match self.kind_stats {
            KindStats::Rt(_) => MeasurementKind::Rt,
            KindStats::Rth(_) => MeasurementKind::Rth,
        }
    }

    /// RT aggregates, if this meter was ingested as RT.
    pub fn rt(&self) -> Option<&RtStats> {
        match &self.kind_stats {
            KindStats::Rt(stats) => Some(stats),
            KindStats::Rth(_) => None,
        }
    }

    /// RTH aggregates, if this meter was ingested as RTH.
    pub fn rth(&self) -> Option<&RthStats> {
        match &self.kind_stats {
            KindStats::Rt(_) => None,
            KindStats::Rth(stats) => Some(stats),
        }
    }

    /// Whether the meter's accumulated counter ran backwards this month.
    /// Always `false` for RT meters.
    pub fn counter_regression(&self) -> bool {
        self.rth().map(|s| s.counter_regression).unwrap_or(false)
    }
}

/// One meter's slot in a block's statistics map.
///
/// A meter folder normally carries both an RT and an RTH file, so the same
/// meter name contributes one record per ingested kind to its block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterEntry {
    /// Statistics from the meter's RT ingestion pass, if one ran.
    pub rt: Option<MeterStatistics>,
    /// Statistics from the meter's RTH ingestion pass, if one ran.
    pub rth: Option<MeterStatistics>,
}

impl MeterEntry {
    /// Stores `stats` in the slot matching its kind, replacing any earlier
    /// record of the same kind.
    pub fn insert(&mut self, stats: MeterStatistics) {
        match stats.kind() {
            MeasurementKind::Rt => self.rt = Some(stats),
            MeasurementKind::Rth => self.rth = Some(stats),
        }
    }

    /// The records present for this meter, RT before RTH.
    pub fn records(&self) -> impl Iterator<Item = &MeterStatistics> {
        self.rt.iter().chain(self.rth.iter())
    }
}

/// Block-wide rollup of the RT meters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockRtTotals {
    /// Sum of the per-meter totalized values.
    pub totalized_value: f64,
    /// `totalized_value / meter_count`; `0.0` when no RT meters exist.
    pub average_value: f64,
    /// Sum of the per-meter operating hours.
    pub total_operating_hours: f64,
    /// Healthy readings summed over all RT meters.
    pub healthy_count: u64,
    /// Faulty readings summed over all RT meters.
    pub faulty_count: u64,
    /// Recomputed from the summed counts, not averaged per meter.
    pub completeness_pct: f64,
    /// Number of meters ingested as RT.
    pub meter_count: usize,
}

/// Block-wide rollup of the RTH meters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockRthTotals {
    /// Sum of the per-meter monthly consumptions.
    pub monthly_consumption: f64,
    /// Sum of the per-meter last-healthy cumulative values.
    pub totalized_value: f64,
    /// Healthy readings summed over all RTH meters.
    pub healthy_count: u64,
    /// Faulty readings summed over all RTH meters.
    pub faulty_count: u64,
    /// Recomputed from the summed counts, not averaged per meter.
    pub completeness_pct: f64,
    /// Number of meters ingested as RTH.
    pub meter_count: usize,
}

/// Monthly rollup for one building block, keyed by
/// `(block_number, target_month, target_year)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStatistics {
    /// Numeric block code from the folder naming convention.
    pub block_number: u32,
    /// Billing month (1-12).
    pub target_month: u32,
    /// Billing year.
    pub target_year: i32,
    /// Distinct meters contributing to either kind.
    pub number_of_meters: usize,
    /// RT rollup over the meters ingested as RT.
    pub rt: BlockRtTotals,
    /// RTH rollup over the meters ingested as RTH.
    pub rth: BlockRthTotals,
    /// The per-meter records the rollup was computed from, one entry per
    /// meter name, kept for detail reporting.
    pub meter_statistics: HashMap<String, MeterEntry>,
}

impl BlockStatistics {
    /// Meter names in a deterministic order for report output.
    pub fn sorted_meter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.meter_statistics.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Round to two decimal places, the precision used for all percentages.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / total * 100` rounded to two decimals; `0.0` for an empty scope.
///
/// Used for both completeness (healthy over total) and the faulty
/// percentage (faulty over total).
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}
