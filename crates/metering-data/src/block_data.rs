//! Transient ownership of one block's raw readings.
//!
//! Raw per-meter streams are large (a month of 11-minute samples per
//! meter), so the container holds them only until the block's statistics
//! exist, then frees them on an explicit release while the statistics live
//! on. After release, raw access fails loudly instead of returning empty
//! data, keeping "not yet aggregated" and "aggregated then freed" apart.

use std::collections::HashMap;

use metering_core::error::{MeteringError, Result};
use metering_core::models::{BlockStatistics, MeterStatistics, Reading};

use crate::block_stats::aggregate_block;

// ── BlockData ─────────────────────────────────────────────────────────────────

/// One block's raw readings and statistics across the
/// `Loaded -> Aggregated -> Released` lifecycle.
#[derive(Debug)]
pub struct BlockData {
    block_number: u32,
    state: State,
}

/// Raw data lives in `Loaded` and `Aggregated`; dropping it with the old
/// state on release is the entire memory story, there is no separate
/// reclamation step.
#[derive(Debug)]
enum State {
    Loaded {
        raw: HashMap<String, Vec<Reading>>,
    },
    Aggregated {
        raw: HashMap<String, Vec<Reading>>,
        statistics: BlockStatistics,
    },
    Released {
        statistics: BlockStatistics,
    },
}

impl BlockData {
    /// A freshly loaded block: raw readings keyed by stream (one key per
    /// meter and kind), no statistics yet.
    pub fn new(block_number: u32, raw: HashMap<String, Vec<Reading>>) -> Self {
        BlockData {
            block_number,
            state: State::Loaded { raw },
        }
    }

    pub fn block_number(&self) -> u32 {
        self.block_number
    }

    /// Roll the supplied per-meter records up into this block's statistics
    /// (`Loaded -> Aggregated`).
    ///
    /// Re-invoking on an aggregated or released block is a contract
    /// violation and fails without touching the stored state.
    pub fn aggregate(
        &mut self,
        target_month: u32,
        target_year: i32,
        meters: Vec<MeterStatistics>,
    ) -> Result<()> {
        let raw = match &mut self.state {
            State::Loaded { raw } => std::mem::take(raw),
            State::Aggregated { .. } => {
                return Err(MeteringError::AggregationPrecondition {
                    block: self.block_number,
                    reason: "block is already aggregated".to_string(),
                })
            }
            State::Released { .. } => {
                return Err(MeteringError::AggregationPrecondition {
                    block: self.block_number,
                    reason: "raw data was already released".to_string(),
                })
            }
        };

        let statistics = aggregate_block(self.block_number, target_month, target_year, meters);
        self.state = State::Aggregated { raw, statistics };
        Ok(())
    }

    /// The raw reading streams, while they are still held.
    pub fn raw_data(&self) -> Result<&HashMap<String, Vec<Reading>>> {
        match &self.state {
            State::Loaded { raw } | State::Aggregated { raw, .. } => Ok(raw),
            State::Released { .. } => Err(MeteringError::DataNotAvailable(self.block_number)),
        }
    }

    /// The block statistics, once aggregation has run.
    pub fn statistics(&self) -> Option<&BlockStatistics> {
        match &self.state {
            State::Loaded { .. } => None,
            State::Aggregated { statistics, .. } | State::Released { statistics } => {
                Some(statistics)
            }
        }
    }

    /// Free the raw readings (`Aggregated -> Released`). Idempotent; fails
    /// only when statistics do not exist yet.
    pub fn release(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, State::Loaded { raw: HashMap::new() });
        match state {
            State::Loaded { raw } => {
                self.state = State::Loaded { raw };
                Err(MeteringError::AggregationPrecondition {
                    block: self.block_number,
                    reason: "release before aggregation".to_string(),
                })
            }
            // The raw map is dropped with the old state.
            State::Aggregated { statistics, .. } | State::Released { statistics } => {
                self.state = State::Released { statistics };
                Ok(())
            }
        }
    }

    /// Consume the container, keeping only the statistics.
    pub fn into_statistics(self) -> Option<BlockStatistics> {
        match self.state {
            State::Loaded { .. } => None,
            State::Aggregated { statistics, .. } | State::Released { statistics } => {
                Some(statistics)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
