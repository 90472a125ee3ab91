//! Worker-pool execution of one block's ingestion plan.
//!
//! Every (meter, kind) file of the block is parsed and aggregated on the
//! blocking-task pool, bounded by a semaphore shared across all blocks.
//! Results flow back over a channel so an optional deadline can abandon
//! stragglers without losing the units that already finished.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metering_core::error::Result;
use metering_core::models::{BlockStatistics, FileDiagnostics, MeterStatistics, Reading};
use metering_core::settings::PipelineConfig;
use metering_data::block_data::BlockData;
use metering_data::discovery::{self, WorkUnit};
use metering_data::meter_stats::aggregate_meter;
use metering_data::parser::{parse_meter_file, ParsedStream};
use tokio::sync::{mpsc, Semaphore};

// ── Outcome types ─────────────────────────────────────────────────────────────

/// How a block's processing ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// At least one file yielded readings and the rollup exists.
    Success,
    /// Discovery found no meter folders carrying this block's code.
    NoMeters,
    /// Meter folders exist but no file yielded a single reading.
    NoData,
}

impl BlockStatus {
    /// Lowercase label used in summaries and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStatus::Success => "success",
            BlockStatus::NoMeters => "no_meters",
            BlockStatus::NoData => "no_data",
        }
    }
}

/// Everything one block run produced.
#[derive(Debug, Clone)]
pub struct BlockOutcome {
    pub block_number: u32,
    pub status: BlockStatus,
    /// Present only on [`BlockStatus::Success`].
    pub statistics: Option<BlockStatistics>,
    /// Per-file diagnostics for every unit that finished, in meter order.
    pub diagnostics: Vec<FileDiagnostics>,
    /// Files abandoned because the block deadline expired first.
    pub failed_files: Vec<PathBuf>,
    /// Wall-clock time from planning to rollup.
    pub elapsed: Duration,
}

/// One finished unit travelling back from the worker pool.
struct UnitResult {
    unit: WorkUnit,
    stream: ParsedStream,
    statistics: MeterStatistics,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Process one block end to end: plan, parse every file on the shared pool,
/// aggregate, release the raw readings.
///
/// Per-file trouble never fails the block; it lands in diagnostics or, past
/// the deadline, in `failed_files`. The only error path is a violated block
/// data lifecycle, which cannot happen for the fresh container built here
/// but is propagated rather than swallowed.
pub async fn process_block(
    block: u32,
    config: Arc<PipelineConfig>,
    pool: Arc<Semaphore>,
) -> Result<BlockOutcome> {
    let started = Instant::now();

    let units = discovery::plan_block(block, &config);
    if units.is_empty() {
        tracing::info!("Block {}: no meter folders found", block);
        return Ok(BlockOutcome {
            block_number: block,
            status: BlockStatus::NoMeters,
            statistics: None,
            diagnostics: Vec::new(),
            failed_files: Vec::new(),
            elapsed: started.elapsed(),
        });
    }

    tracing::info!(
        "Block {}: processing {} files across {} meters",
        block,
        units.len(),
        units.len() / 2
    );

    let (results_tx, results_rx) = mpsc::channel(units.len());
    for unit in units.iter().cloned() {
        tokio::spawn(run_unit(
            unit,
            Arc::clone(&config),
            Arc::clone(&pool),
            results_tx.clone(),
        ));
    }
    // Workers hold the only remaining senders; the channel closes once the
    // last one finishes.
    drop(results_tx);

    let mut finished = collect_results(results_rx, units.len(), config.block_deadline).await;

    let finished_keys: HashSet<String> = finished.iter().map(|r| r.unit.stream_key()).collect();
    let mut failed_files = Vec::new();
    for unit in &units {
        if !finished_keys.contains(&unit.stream_key()) {
            tracing::warn!(
                "Block {}: deadline expired before {} was processed",
                block,
                unit.path.display()
            );
            failed_files.push(unit.path.clone());
        }
    }

    // Completion order is scheduling noise; report in plan order.
    finished.sort_by(|a, b| {
        (a.unit.meter_name.as_str(), a.unit.kind.as_str())
            .cmp(&(b.unit.meter_name.as_str(), b.unit.kind.as_str()))
    });

    let mut raw: HashMap<String, Vec<Reading>> = HashMap::with_capacity(finished.len());
    let mut meters: Vec<MeterStatistics> = Vec::with_capacity(finished.len());
    let mut diagnostics: Vec<FileDiagnostics> = Vec::with_capacity(finished.len());
    let mut total_readings: u64 = 0;

    for result in finished {
        total_readings += result.stream.diagnostics.total_readings;
        let mut diagnostic = result.stream.diagnostics;
        diagnostic.counter_regression = result.statistics.counter_regression();
        diagnostics.push(diagnostic);
        raw.insert(result.unit.stream_key(), result.stream.readings);
        meters.push(result.statistics);
    }

    if total_readings == 0 {
        tracing::info!("Block {}: no readings in any meter file", block);
        return Ok(BlockOutcome {
            block_number: block,
            status: BlockStatus::NoData,
            statistics: None,
            diagnostics,
            failed_files,
            elapsed: started.elapsed(),
        });
    }

    let mut data = BlockData::new(block, raw);
    data.aggregate(config.target_month, config.target_year, meters)?;
    data.release()?;
    let statistics = data.into_statistics();

    let elapsed = started.elapsed();
    tracing::info!(
        "Block {}: aggregated {} readings in {:.2}s",
        block,
        total_readings,
        elapsed.as_secs_f64()
    );

    Ok(BlockOutcome {
        block_number: block,
        status: BlockStatus::Success,
        statistics,
        diagnostics,
        failed_files,
        elapsed,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Parse and aggregate one unit under a pool permit, then send the result.
///
/// A dropped receiver means the deadline already expired; the send error is
/// ignored because the unit is reported as failed on the other side.
async fn run_unit(
    unit: WorkUnit,
    config: Arc<PipelineConfig>,
    pool: Arc<Semaphore>,
    results: mpsc::Sender<UnitResult>,
) {
    let _permit = match pool.acquire_owned().await {
        Ok(permit) => permit,
        // The pool is only closed on shutdown; the unit then surfaces as a
        // failed file.
        Err(_) => return,
    };

    let worker_unit = unit.clone();
    let worker_config = Arc::clone(&config);
    let outcome = tokio::task::spawn_blocking(move || {
        let stream = parse_meter_file(&worker_unit.path, &worker_unit.meter_name, &worker_config);
        let statistics = aggregate_meter(
            &worker_unit.meter_name,
            worker_unit.block_number,
            worker_unit.kind,
            &stream.readings,
            &worker_config,
        );
        (stream, statistics)
    })
    .await;

    match outcome {
        Ok((stream, statistics)) => {
            let _ = results
                .send(UnitResult {
                    unit,
                    stream,
                    statistics,
                })
                .await;
        }
        Err(e) => {
            tracing::warn!("Worker for {} failed: {}", unit.path.display(), e);
        }
    }
}

/// Receive finished units until all are in, the channel closes, or the
/// deadline runs out, whichever comes first.
async fn collect_results(
    mut results: mpsc::Receiver<UnitResult>,
    expected: usize,
    deadline: Option<Duration>,
) -> Vec<UnitResult> {
    let cutoff = deadline.map(|d| Instant::now() + d);
    let mut finished = Vec::with_capacity(expected);

    while finished.len() < expected {
        let next = match cutoff {
            Some(at) => {
                let remaining = at.saturating_duration_since(Instant::now());
                match tokio::time::timeout(remaining, results.recv()).await {
                    Ok(next) => next,
                    Err(_) => break,
                }
            }
            None => results.recv().await,
        };
        match next {
            Some(result) => finished.push(result),
            None => break,
        }
    }

    finished
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use metering_core::settings::TextEncoding;
    use std::path::Path;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn test_config(root: &Path) -> PipelineConfig {
        PipelineConfig {
            data_root: root.to_path_buf(),
            output_dir: root.join("reports"),
            target_month: 10,
            target_year: 2025,
            blocks: vec![80, 82],
            folder_prefixes: vec!["J_B_".to_string(), "X01_01_".to_string()],
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

    fn write_meter(root: &Path, folder: &str, rt_lines: &[&str], rth_lines: &[&str]) {
        let dir = root.join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        if !rt_lines.is_empty() {
            std::fs::write(
                dir.join("X01_01_202510BTUREADINGS11MIN.txt"),
                rt_lines.join("\n"),
            )
            .unwrap();
        }
        if !rth_lines.is_empty() {
            std::fs::write(
                dir.join("X01_01_202510ACCBTUReadingS11MIN.txt"),
                rth_lines.join("\n"),
            )
            .unwrap();
        }
    }

    fn pool(permits: usize) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(permits))
    }

    // ── process_block ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_process_block_success() {
        let dir = TempDir::new().unwrap();
        write_meter(
            dir.path(),
            "J_B_80_01",
            &[
                "01.10.2025 00:00:00 5.0",
                "01.10.2025 00:11:00 10.0",
                "01.10.2025 00:22:00 15.0",
            ],
            &["01.10.2025 00:00:00 100.0", "01.10.2025 00:11:00 150.0"],
        );
        let config = Arc::new(test_config(dir.path()));

        let outcome = process_block(80, Arc::clone(&config), pool(2)).await.unwrap();

        assert_eq!(outcome.block_number, 80);
        assert_eq!(outcome.status, BlockStatus::Success);
        assert!(outcome.failed_files.is_empty());
        assert_eq!(outcome.diagnostics.len(), 2);

        let stats = outcome.statistics.unwrap();
        assert_eq!(stats.number_of_meters, 1);
        assert!((stats.rt.totalized_value - 30.0).abs() < 1e-9);
        assert!((stats.rt.average_value - 30.0).abs() < 1e-9);
        assert!((stats.rth.monthly_consumption - 50.0).abs() < 1e-9);
        assert!((stats.rth.totalized_value - 150.0).abs() < 1e-9);

        // Diagnostics arrive in plan order: RT before RTH.
        assert_eq!(outcome.diagnostics[0].total_readings, 3);
        assert_eq!(outcome.diagnostics[1].total_readings, 2);
    }

    #[tokio::test]
    async fn test_process_block_no_meters() {
        let dir = TempDir::new().unwrap();
        let config = Arc::new(test_config(dir.path()));

        let outcome = process_block(80, config, pool(2)).await.unwrap();

        assert_eq!(outcome.status, BlockStatus::NoMeters);
        assert!(outcome.statistics.is_none());
        assert!(outcome.diagnostics.is_empty());
        assert!(outcome.failed_files.is_empty());
    }

    #[tokio::test]
    async fn test_process_block_missing_files_is_no_data() {
        let dir = TempDir::new().unwrap();
        // Folder exists, readings files do not.
        std::fs::create_dir_all(dir.path().join("J_B_80_01")).unwrap();
        let config = Arc::new(test_config(dir.path()));

        let outcome = process_block(80, config, pool(2)).await.unwrap();

        assert_eq!(outcome.status, BlockStatus::NoData);
        assert!(outcome.statistics.is_none());
        // Both planned units still produced a zeroed diagnostics record.
        assert_eq!(outcome.diagnostics.len(), 2);
        assert!(outcome.diagnostics.iter().all(|d| d.total_readings == 0));
        assert!(outcome.failed_files.is_empty());
    }

    // Paused clock: the zero deadline elapses on its first poll, before the
    // scheduler can hand the CPU to any worker, regardless of machine speed.
    #[tokio::test(start_paused = true)]
    async fn test_process_block_zero_deadline_fails_all_units() {
        let dir = TempDir::new().unwrap();
        write_meter(
            dir.path(),
            "J_B_80_01",
            &["01.10.2025 00:00:00 5.0"],
            &["01.10.2025 00:00:00 100.0"],
        );
        let mut config = test_config(dir.path());
        config.block_deadline = Some(Duration::ZERO);

        // On the single-threaded test runtime no worker can run before the
        // zero deadline is checked, so every unit is abandoned.
        let outcome = process_block(80, Arc::new(config), pool(2)).await.unwrap();

        assert_eq!(outcome.status, BlockStatus::NoData);
        assert_eq!(outcome.failed_files.len(), 2);
        assert!(outcome.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_process_block_mirrors_counter_regression() {
        let dir = TempDir::new().unwrap();
        write_meter(
            dir.path(),
            "J_B_80_01",
            &["01.10.2025 00:00:00 5.0"],
            &["01.10.2025 00:00:00 150.0", "01.10.2025 00:11:00 100.0"],
        );
        let config = Arc::new(test_config(dir.path()));

        let outcome = process_block(80, config, pool(2)).await.unwrap();

        assert_eq!(outcome.status, BlockStatus::Success);
        let rth_diag = outcome
            .diagnostics
            .iter()
            .find(|d| d.file_name.contains("ACCBTU"))
            .unwrap();
        assert!(rth_diag.counter_regression);

        let stats = outcome.statistics.unwrap();
        assert!((stats.rth.monthly_consumption - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_block_status_labels() {
        assert_eq!(BlockStatus::Success.as_str(), "success");
        assert_eq!(BlockStatus::NoMeters.as_str(), "no_meters");
        assert_eq!(BlockStatus::NoData.as_str(), "no_data");
    }
}
