use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::error::{MeteringError, Result};
use crate::naming;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly ingestion and aggregation of BTU meter logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "btu-metering",
    about = "Monthly ingestion and aggregation of BTU meter logs",
    version
)]
pub struct Settings {
    /// Root directory containing the meter folders
    #[arg(long)]
    pub data_root: PathBuf,

    /// Directory the report files are written to
    #[arg(long, default_value = "./reports")]
    pub output_dir: PathBuf,

    /// Billing month (1-12)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: u32,

    /// Billing year
    #[arg(long)]
    pub year: i32,

    /// Block numbers to process
    #[arg(long, value_delimiter = ',', default_values_t = default_blocks())]
    pub blocks: Vec<u32>,

    /// Folder-name prefixes identifying meter folders
    #[arg(long, value_delimiter = ',', default_values_t = default_prefixes())]
    pub folder_prefixes: Vec<String>,

    /// File-name postfix of instantaneous (RT) readings files
    #[arg(long, default_value = naming::DEFAULT_RT_POSTFIX)]
    pub rt_postfix: String,

    /// File-name postfix of accumulated (RTH) readings files
    #[arg(long, default_value = naming::DEFAULT_RTH_POSTFIX)]
    pub rth_postfix: String,

    /// Minutes between consecutive samples
    #[arg(long, default_value = "11", value_parser = clap::value_parser!(u32).range(1..=1440))]
    pub sample_interval_minutes: u32,

    /// Text encoding of the readings files
    #[arg(long, default_value = "utf8", value_parser = ["utf8", "latin1"])]
    pub encoding: String,

    /// Ignore #start/#stop health markers (every reading counts as healthy)
    #[arg(long)]
    pub disable_health_markers: bool,

    /// Worker pool size (defaults to the number of CPU cores)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Abandon a block's unfinished file reads after this many seconds
    #[arg(long)]
    pub block_deadline_secs: Option<u64>,

    /// Also write block and meter statistics as CSV
    #[arg(long)]
    pub csv: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// The district's block codes: even numbers 80 through 98.
fn default_blocks() -> Vec<u32> {
    (80..=98).step_by(2).collect()
}

fn default_prefixes() -> Vec<String> {
    naming::DEFAULT_FOLDER_PREFIXES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Settings {
    /// Log level with the `--debug` override applied.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// Validate and freeze these settings into the immutable
    /// [`PipelineConfig`] passed through the pipeline.
    pub fn into_config(self) -> Result<PipelineConfig> {
        if self.blocks.is_empty() {
            return Err(MeteringError::Config("no blocks configured".to_string()));
        }

        let encoding = match self.encoding.as_str() {
            "utf8" => TextEncoding::Utf8,
            "latin1" => TextEncoding::Latin1,
            other => {
                return Err(MeteringError::Config(format!(
                    "unknown encoding \"{other}\""
                )))
            }
        };

        let workers = self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or_else(|_| {
                    warn!("Could not detect CPU count, defaulting worker pool to 4");
                    4
                })
        });
        if workers == 0 {
            return Err(MeteringError::Config(
                "worker pool size must be at least 1".to_string(),
            ));
        }

        Ok(PipelineConfig {
            data_root: self.data_root,
            output_dir: self.output_dir,
            target_month: self.month,
            target_year: self.year,
            blocks: self.blocks,
            folder_prefixes: self.folder_prefixes,
            rt_postfix: self.rt_postfix,
            rth_postfix: self.rth_postfix,
            sample_interval_hours: f64::from(self.sample_interval_minutes) / 60.0,
            encoding,
            health_markers_enabled: !self.disable_health_markers,
            workers,
            block_deadline: self.block_deadline_secs.map(Duration::from_secs),
            write_csv: self.csv,
        })
    }
}

// ── TextEncoding ───────────────────────────────────────────────────────────────

/// Text encoding of the raw readings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// UTF-8, decoded lossily so a stray byte never skips a whole file.
    Utf8,
    /// ISO-8859-1; every byte maps to the Unicode scalar of the same value.
    Latin1,
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Immutable configuration threaded by reference through every component.
///
/// Constructed exactly once from [`Settings`]; nothing in the pipeline
/// mutates it and no process-wide state exists beside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory the meter folders live under.
    pub data_root: PathBuf,
    /// Directory report files are written to.
    pub output_dir: PathBuf,
    /// Billing month (1-12).
    pub target_month: u32,
    /// Billing year.
    pub target_year: i32,
    /// Block codes to process, in run order.
    pub blocks: Vec<u32>,
    /// Folder-name prefixes identifying meter folders.
    pub folder_prefixes: Vec<String>,
    /// File-name postfix of RT readings files.
    pub rt_postfix: String,
    /// File-name postfix of RTH readings files.
    pub rth_postfix: String,
    /// Hours between consecutive samples (11-minute cadence → 11/60).
    pub sample_interval_hours: f64,
    /// Text encoding of the readings files.
    pub encoding: TextEncoding,
    /// Whether `#start`/`#stop` markers drive the health state machine.
    pub health_markers_enabled: bool,
    /// Fixed worker-pool size for per-file ingestion tasks.
    pub workers: usize,
    /// Optional per-block deadline; expired file reads are reported failed.
    pub block_deadline: Option<Duration>,
    /// Whether CSV exports are written alongside the text reports.
    pub write_csv: bool,
}
