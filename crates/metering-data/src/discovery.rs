//! Meter-folder discovery and per-block work planning.
//!
//! Walks the data root one level deep, recognises meter folders by their
//! naming convention, and pairs every meter with its RT and RTH files for
//! the target month. Discovery absorbs filesystem problems the same way the
//! parser does: a warning and an empty result, never an error.

use std::path::PathBuf;

use metering_core::models::MeasurementKind;
use metering_core::naming;
use metering_core::settings::PipelineConfig;
use tracing::{debug, warn};

// ── MeterFolder ───────────────────────────────────────────────────────────────

/// One recognised meter folder under the data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterFolder {
    /// Folder name, used as the meter's display name throughout.
    pub name: String,
    /// Block code parsed out of the folder name.
    pub block_number: u32,
    pub path: PathBuf,
}

// ── WorkUnit ──────────────────────────────────────────────────────────────────

/// One (meter, kind, file) ingestion unit of a block's plan.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkUnit {
    pub meter_name: String,
    pub block_number: u32,
    pub kind: MeasurementKind,
    /// Path the readings file is expected at. It may not exist; the unit is
    /// scheduled anyway so the missing file surfaces in diagnostics instead
    /// of silently vanishing from the report.
    pub path: PathBuf,
}

impl WorkUnit {
    /// Key under which this unit's raw readings are stored in a block's
    /// data container. A meter contributes one RT and one RTH stream, so
    /// the meter name alone would collide.
    pub fn stream_key(&self) -> String {
        format!("{}_{}", self.meter_name, self.kind.as_str())
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Sorted meter folders under the data root matching a configured prefix.
///
/// Folders that match a prefix but not the naming convention are skipped
/// with a warning; a missing root yields an empty list.
pub fn list_meter_folders(config: &PipelineConfig) -> Vec<MeterFolder> {
    let root = &config.data_root;
    if !root.exists() {
        warn!("Data root does not exist: {}", root.display());
        return Vec::new();
    }

    let mut folders: Vec<MeterFolder> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !config
                .folder_prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()))
            {
                return None;
            }
            if !naming::is_meter_folder(&name) {
                warn!("Skipping folder outside the meter naming convention: {}", name);
                return None;
            }
            let block_number = naming::block_number(&name)?;
            Some(MeterFolder {
                name,
                block_number,
                path: entry.into_path(),
            })
        })
        .collect();

    folders.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Found {} meter folders under {}", folders.len(), root.display());
    folders
}

/// The RT and RTH readings-file paths for one meter folder.
///
/// A side whose file is absent resolves to `<folder>/<postfix>`, which does
/// not exist; parsing then reports it missing and the meter still gets a
/// zeroed diagnostics record for that kind.
pub fn find_meter_files(folder: &MeterFolder, config: &PipelineConfig) -> (PathBuf, PathBuf) {
    let mut rt_path: Option<PathBuf> = None;
    let mut rth_path: Option<PathBuf> = None;

    match std::fs::read_dir(&folder.path) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();

            for file_name in names {
                match naming::kind_for_file(&file_name, &config.rt_postfix, &config.rth_postfix) {
                    Some(MeasurementKind::Rt) => rt_path = Some(folder.path.join(&file_name)),
                    Some(MeasurementKind::Rth) => rth_path = Some(folder.path.join(&file_name)),
                    None => {}
                }
            }
        }
        Err(e) => {
            warn!("Failed to list meter folder {}: {}", folder.path.display(), e);
        }
    }

    (
        rt_path.unwrap_or_else(|| folder.path.join(&config.rt_postfix)),
        rth_path.unwrap_or_else(|| folder.path.join(&config.rth_postfix)),
    )
}

/// Build one block's work list: an RT unit and an RTH unit for every meter
/// folder carrying the block's code.
pub fn plan_block(block: u32, config: &PipelineConfig) -> Vec<WorkUnit> {
    let folders = list_meter_folders(config);
    plan_for_folders(block, &folders, config)
}

/// Plan over an already-listed folder set, so a district run can walk the
/// data root once and plan every block from the same listing.
pub fn plan_for_folders(
    block: u32,
    folders: &[MeterFolder],
    config: &PipelineConfig,
) -> Vec<WorkUnit> {
    let mut units = Vec::new();
    for folder in folders.iter().filter(|f| f.block_number == block) {
        let (rt_path, rth_path) = find_meter_files(folder, config);
        units.push(WorkUnit {
            meter_name: folder.name.clone(),
            block_number: block,
            kind: MeasurementKind::Rt,
            path: rt_path,
        });
        units.push(WorkUnit {
            meter_name: folder.name.clone(),
            block_number: block,
            kind: MeasurementKind::Rth,
            path: rth_path,
        });
    }

    debug!(
        "Block {}: planned {} units over {} meters",
        block,
        units.len(),
        units.len() / 2
    );
    units
}

// ── Tests ─────────────────────────────────────────────────────────────────────
