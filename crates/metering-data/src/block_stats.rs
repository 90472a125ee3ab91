//! Block-level rollup over per-meter statistics.

use std::collections::HashMap;

use metering_core::models::{
    percentage, BlockRtTotals, BlockRthTotals, BlockStatistics, MeterEntry, MeterStatistics,
};
use tracing::debug;

// ── Public API ────────────────────────────────────────────────────────────────

/// Roll one block's per-meter records up into block-level totals.
///
/// RT aggregates cover only the meters ingested as RT, RTH aggregates only
/// those ingested as RTH. Completeness is recomputed from the summed counts
/// rather than averaged over per-meter percentages, so a meter with a
/// handful of samples cannot skew it.
pub fn aggregate_block(
    block_number: u32,
    target_month: u32,
    target_year: i32,
    meters: Vec<MeterStatistics>,
) -> BlockStatistics {
    let mut rt = BlockRtTotals::default();
    let mut rth = BlockRthTotals::default();
    let mut meter_statistics: HashMap<String, MeterEntry> = HashMap::new();

    for stats in meters {
        if let Some(rt_stats) = stats.rt() {
            rt.totalized_value += rt_stats.totalized_value;
            rt.total_operating_hours += rt_stats.operating_hours;
            rt.healthy_count += stats.healthy_count;
            rt.faulty_count += stats.faulty_count;
            rt.meter_count += 1;
        }
        if let Some(rth_stats) = stats.rth() {
            rth.monthly_consumption += rth_stats.monthly_consumption;
            rth.totalized_value += rth_stats.totalized_value;
            rth.healthy_count += stats.healthy_count;
            rth.faulty_count += stats.faulty_count;
            rth.meter_count += 1;
        }
        meter_statistics
            .entry(stats.meter_name.clone())
            .or_default()
            .insert(stats);
    }

    // Average is per meter, not per data point.
    if rt.meter_count > 0 {
        rt.average_value = rt.totalized_value / rt.meter_count as f64;
    }
    rt.completeness_pct = percentage(rt.healthy_count, rt.healthy_count + rt.faulty_count);
    rth.completeness_pct = percentage(rth.healthy_count, rth.healthy_count + rth.faulty_count);

    let number_of_meters = meter_statistics.len();
    debug!(
        "Block {}: {} meters ({} RT, {} RTH records)",
        block_number, number_of_meters, rt.meter_count, rth.meter_count
    );

    BlockStatistics {
        block_number,
        target_month,
        target_year,
        number_of_meters,
        rt,
        rth,
        meter_statistics,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
