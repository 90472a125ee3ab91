//! District-level orchestration and rollup across all configured blocks.
//!
//! Blocks run concurrently, all drawing file-parse permits from one shared
//! pool so the configured worker count caps the district-wide parse
//! concurrency. One misbehaving block never stops the run; it is logged,
//! recorded and skipped in the totals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metering_core::settings::PipelineConfig;
use tokio::sync::Semaphore;

use crate::block_processor::{process_block, BlockOutcome, BlockStatus};

// ── Run types ─────────────────────────────────────────────────────────────────

/// Everything one district run produced, in configured block order.
#[derive(Debug)]
pub struct DistrictRun {
    pub outcomes: Vec<BlockOutcome>,
    /// Blocks whose processing errored out entirely (lifecycle violation or
    /// aborted task). Their numbers are kept so the summary can name them.
    pub failed_blocks: Vec<u32>,
    /// Wall-clock time for the whole run.
    pub elapsed: Duration,
}

/// One line of the per-block summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSummaryRow {
    pub block_number: u32,
    pub status: BlockStatus,
    pub number_of_meters: usize,
    pub rt_totalized: f64,
    pub rt_completeness_pct: f64,
    pub rth_consumption: f64,
    pub rth_completeness_pct: f64,
}

/// District totals over the successful blocks plus the per-block table.
///
/// Averages are taken over successful blocks only and are `0.0` when none
/// succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictSummary {
    pub target_month: u32,
    pub target_year: i32,
    pub blocks_processed: usize,
    pub successful_blocks: usize,
    pub no_meter_blocks: usize,
    pub no_data_blocks: usize,
    pub failed_blocks: Vec<u32>,
    /// Distinct meters summed over successful blocks.
    pub total_meters: usize,
    pub rt_totalized: f64,
    pub rt_operating_hours: f64,
    pub rt_avg_completeness_pct: f64,
    pub rth_consumption: f64,
    pub rth_totalized: f64,
    pub rth_avg_completeness_pct: f64,
    pub rows: Vec<BlockSummaryRow>,
    pub elapsed: Duration,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Run every configured block and collect the outcomes in configured order.
pub async fn run_district(config: Arc<PipelineConfig>) -> DistrictRun {
    let started = Instant::now();
    let pool = Arc::new(Semaphore::new(config.workers));

    tracing::info!(
        "Starting district run for {}/{}: {} blocks, {} workers",
        config.target_month,
        config.target_year,
        config.blocks.len(),
        config.workers
    );

    let mut handles = Vec::with_capacity(config.blocks.len());
    for &block in &config.blocks {
        handles.push((
            block,
            tokio::spawn(process_block(block, Arc::clone(&config), Arc::clone(&pool))),
        ));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    let mut failed_blocks = Vec::new();
    for (block, handle) in handles {
        match handle.await {
            Ok(Ok(outcome)) => outcomes.push(outcome),
            Ok(Err(e)) => {
                tracing::warn!(block, error = %e, "Block processing failed");
                failed_blocks.push(block);
            }
            Err(e) => {
                tracing::warn!(block, error = %e, "Block task aborted");
                failed_blocks.push(block);
            }
        }
    }

    let elapsed = started.elapsed();
    tracing::info!(
        "District run finished: {} blocks in {:.2}s",
        outcomes.len(),
        elapsed.as_secs_f64()
    );

    DistrictRun {
        outcomes,
        failed_blocks,
        elapsed,
    }
}

/// Roll a run's outcomes up into the district summary.
pub fn summarize(run: &DistrictRun, config: &PipelineConfig) -> DistrictSummary {
    let mut summary = DistrictSummary {
        target_month: config.target_month,
        target_year: config.target_year,
        blocks_processed: run.outcomes.len(),
        successful_blocks: 0,
        no_meter_blocks: 0,
        no_data_blocks: 0,
        failed_blocks: run.failed_blocks.clone(),
        total_meters: 0,
        rt_totalized: 0.0,
        rt_operating_hours: 0.0,
        rt_avg_completeness_pct: 0.0,
        rth_consumption: 0.0,
        rth_totalized: 0.0,
        rth_avg_completeness_pct: 0.0,
        rows: Vec::with_capacity(run.outcomes.len()),
        elapsed: run.elapsed,
    };

    let mut rt_completeness_sum = 0.0;
    let mut rth_completeness_sum = 0.0;

    for outcome in &run.outcomes {
        match outcome.status {
            BlockStatus::Success => summary.successful_blocks += 1,
            BlockStatus::NoMeters => summary.no_meter_blocks += 1,
            BlockStatus::NoData => summary.no_data_blocks += 1,
        }

        match &outcome.statistics {
            Some(stats) => {
                summary.total_meters += stats.number_of_meters;
                summary.rt_totalized += stats.rt.totalized_value;
                summary.rt_operating_hours += stats.rt.total_operating_hours;
                summary.rth_consumption += stats.rth.monthly_consumption;
                summary.rth_totalized += stats.rth.totalized_value;
                rt_completeness_sum += stats.rt.completeness_pct;
                rth_completeness_sum += stats.rth.completeness_pct;

                summary.rows.push(BlockSummaryRow {
                    block_number: outcome.block_number,
                    status: outcome.status,
                    number_of_meters: stats.number_of_meters,
                    rt_totalized: stats.rt.totalized_value,
                    rt_completeness_pct: stats.rt.completeness_pct,
                    rth_consumption: stats.rth.monthly_consumption,
                    rth_completeness_pct: stats.rth.completeness_pct,
                });
            }
            None => summary.rows.push(BlockSummaryRow {
                block_number: outcome.block_number,
                status: outcome.status,
                number_of_meters: 0,
                rt_totalized: 0.0,
                rt_completeness_pct: 0.0,
                rth_consumption: 0.0,
                rth_completeness_pct: 0.0,
            }),
        }
    }

    if summary.successful_blocks > 0 {
        let successful = summary.successful_blocks as f64;
        summary.rt_avg_completeness_pct = rt_completeness_sum / successful;
        summary.rth_avg_completeness_pct = rth_completeness_sum / successful;
    }

    summary
}

// ── Tests ─────────────────────────────────────────────────────────────────────
