//! Per-meter monthly aggregation.
//!
//! One entry point parameterized by measurement kind. The RT and RTH
//! formula sets differ, but the surrounding counting and completeness logic
//! is shared, so the parsing path upstream never forks per kind.

use metering_core::models::{
    percentage, KindStats, MeasurementKind, MeterStatistics, Reading, RtStats, RthStats,
};
use metering_core::settings::PipelineConfig;
use tracing::warn;

// ── Public API ────────────────────────────────────────────────────────────────

/// Aggregate one meter's ordered readings into its monthly statistics.
pub fn aggregate_meter(
    meter_name: &str,
    block_number: u32,
    kind: MeasurementKind,
    readings: &[Reading],
    config: &PipelineConfig,
) -> MeterStatistics {
    let healthy_count = readings.iter().filter(|r| r.is_healthy).count() as u64;
    let total_count = readings.len() as u64;
    let faulty_count = total_count - healthy_count;

    let kind_stats = match kind {
        MeasurementKind::Rt => KindStats::Rt(aggregate_rt(readings, healthy_count, config)),
        MeasurementKind::Rth => KindStats::Rth(aggregate_rth(meter_name, readings)),
    };

    MeterStatistics {
        meter_name: meter_name.to_string(),
        block_number,
        healthy_count,
        faulty_count,
        total_count,
        completeness_pct: percentage(healthy_count, total_count),
        kind_stats,
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// RT: sum and mean of the healthy values; operating hours follow the
/// configured sample cadence.
fn aggregate_rt(readings: &[Reading], healthy_count: u64, config: &PipelineConfig) -> RtStats {
    let totalized_value: f64 = readings
        .iter()
        .filter(|r| r.is_healthy)
        .map(|r| r.value)
        .sum();
    let average_value = if healthy_count > 0 {
        totalized_value / healthy_count as f64
    } else {
        0.0
    };

    RtStats {
        totalized_value,
        average_value,
        operating_hours: healthy_count as f64 * config.sample_interval_hours,
    }
}

/// RTH: consumption from the first and last healthy cumulative readings.
///
/// The counter is expected to be monotonic while healthy; a negative delta
/// means it was reset or replaced mid-month, so consumption is clamped to
/// zero and the regression is flagged for the diagnostic log.
fn aggregate_rth(meter_name: &str, readings: &[Reading]) -> RthStats {
    let mut healthy = readings.iter().filter(|r| r.is_healthy);
    let first = match healthy.next() {
        Some(r) => r,
        None => return RthStats::default(),
    };
    let last = healthy.last().unwrap_or(first);

    let delta = last.value - first.value;
    let counter_regression = delta < 0.0;
    if counter_regression {
        warn!(
            "Meter {}: accumulated counter ran backwards ({} -> {})",
            meter_name, first.value, last.value
        );
    }

    RthStats {
        first_healthy_value: first.value,
        first_healthy_timestamp: Some(first.timestamp),
        last_healthy_value: last.value,
        last_healthy_timestamp: Some(last.timestamp),
        monthly_consumption: if counter_regression { 0.0 } else { delta },
        totalized_value: last.value,
        counter_regression,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use metering_core::settings::TextEncoding;
    use std::path::PathBuf;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn reading(minute: u32, value: f64, healthy: bool) -> Reading {
        Reading {
            timestamp: ts(0, minute),
            value,
            is_healthy: healthy,
        }
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            data_root: PathBuf::from("/data"),
            output_dir: PathBuf::from("./reports"),
            target_month: 10,
            target_year: 2025,
            blocks: vec![80],
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

    // ── RT ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_rt_formulas() {
        let readings = vec![
            reading(0, 5.0, true),
            reading(11, 10.0, true),
            reading(22, 0.0, false),
            reading(33, 15.0, true),
        ];
        let stats = aggregate_meter(
            "J_B_80_01",
            80,
            MeasurementKind::Rt,
            &readings,
            &test_config(),
        );

        assert_eq!(stats.healthy_count, 3);
        assert_eq!(stats.faulty_count, 1);
        assert_eq!(stats.total_count, 4);
        assert!((stats.completeness_pct - 75.0).abs() < f64::EPSILON);

        let rt = stats.rt().expect("RT stats");
        assert!((rt.totalized_value - 30.0).abs() < 1e-9);
        assert!((rt.average_value - 10.0).abs() < 1e-9);
        // 3 samples at 11 minutes each.
        assert!((rt.operating_hours - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_rt_no_healthy_readings() {
        let readings = vec![reading(0, 0.0, false), reading(11, 0.0, false)];
        let stats = aggregate_meter(
            "J_B_80_01",
            80,
            MeasurementKind::Rt,
            &readings,
            &test_config(),
        );

        let rt = stats.rt().expect("RT stats");
        assert_eq!(rt.totalized_value, 0.0);
        assert_eq!(rt.average_value, 0.0);
        assert_eq!(rt.operating_hours, 0.0);
        assert_eq!(stats.completeness_pct, 0.0);
    }

    #[test]
    fn test_rt_empty_readings() {
        let stats = aggregate_meter("J_B_80_01", 80, MeasurementKind::Rt, &[], &test_config());
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.completeness_pct, 0.0);
    }

    // ── RTH ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_rth_consumption_from_first_and_last() {
        let readings = vec![
            reading(0, 100.0, true),
            reading(11, 0.0, false),
            reading(22, 120.0, true),
            reading(33, 150.0, true),
        ];
        let stats = aggregate_meter(
            "J_B_80_02",
            80,
            MeasurementKind::Rth,
            &readings,
            &test_config(),
        );

        let rth = stats.rth().expect("RTH stats");
        assert!((rth.first_healthy_value - 100.0).abs() < f64::EPSILON);
        assert!((rth.last_healthy_value - 150.0).abs() < f64::EPSILON);
        assert!((rth.monthly_consumption - 50.0).abs() < 1e-9);
        assert!((rth.totalized_value - 150.0).abs() < f64::EPSILON);
        assert_eq!(rth.first_healthy_timestamp, Some(ts(0, 0)));
        assert_eq!(rth.last_healthy_timestamp, Some(ts(0, 33)));
        assert!(!rth.counter_regression);
    }

    #[test]
    fn test_rth_counter_regression_clamps_to_zero() {
        let readings = vec![reading(0, 100.0, true), reading(11, 50.0, true)];
        let stats = aggregate_meter(
            "J_B_80_02",
            80,
            MeasurementKind::Rth,
            &readings,
            &test_config(),
        );

        let rth = stats.rth().expect("RTH stats");
        assert_eq!(rth.monthly_consumption, 0.0);
        assert!(rth.counter_regression);
        assert!(stats.counter_regression());
    }

    #[test]
    fn test_rth_single_healthy_reading() {
        let readings = vec![reading(0, 100.0, true)];
        let stats = aggregate_meter(
            "J_B_80_02",
            80,
            MeasurementKind::Rth,
            &readings,
            &test_config(),
        );

        let rth = stats.rth().expect("RTH stats");
        assert_eq!(rth.monthly_consumption, 0.0);
        assert!((rth.totalized_value - 100.0).abs() < f64::EPSILON);
        assert_eq!(rth.first_healthy_timestamp, rth.last_healthy_timestamp);
        assert!(!rth.counter_regression);
    }

    #[test]
    fn test_rth_no_healthy_readings() {
        let readings = vec![reading(0, 0.0, false)];
        let stats = aggregate_meter(
            "J_B_80_02",
            80,
            MeasurementKind::Rth,
            &readings,
            &test_config(),
        );

        let rth = stats.rth().expect("RTH stats");
        assert_eq!(*rth, RthStats::default());
        assert!(rth.first_healthy_timestamp.is_none());
        assert_eq!(stats.completeness_pct, 0.0);
    }
}
