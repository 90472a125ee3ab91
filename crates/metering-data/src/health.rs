//! Sensor health bookkeeping driven by `#start` / `#stop` markers.
//!
//! Marker lines carry no timestamp of their own, so transition instants are
//! stamped with data-line timestamps instead: a failure gets the timestamp
//! of the last healthy reading before the `#stop`, a recovery the timestamp
//! of the first reading after the `#start`.

use chrono::NaiveDateTime;

use metering_core::time_utils::format_diag_timestamp;

// ── HealthState ───────────────────────────────────────────────────────────────

/// Sensor health as signalled by the log's control markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

// ── HealthTracker ─────────────────────────────────────────────────────────────

/// Tracks the marker-driven health state across one file pass.
///
/// The initial state is `Healthy`, so a `#start` at the head of a file is a
/// no-op; only a real `Unhealthy -> Healthy` transition arms the recovery
/// stamp. Symmetrically, a repeated `#stop` records at most one failure.
#[derive(Debug)]
pub struct HealthTracker {
    state: HealthState,
    /// When false, markers decode normally but never change state.
    markers_enabled: bool,
    /// Timestamp and health of the most recent data line.
    last_reading: Option<(NaiveDateTime, bool)>,
    /// Armed by a state-changing `#start`; cleared when the next healthy
    /// reading stamps the recovery instant.
    pending_recovery: bool,
    failure_timestamps: Vec<String>,
    recovery_timestamps: Vec<String>,
}

impl HealthTracker {
    pub fn new(markers_enabled: bool) -> Self {
        HealthTracker {
            state: HealthState::Healthy,
            markers_enabled,
            last_reading: None,
            pending_recovery: false,
            failure_timestamps: Vec::new(),
            recovery_timestamps: Vec::new(),
        }
    }

    /// Handle a `#start` marker.
    pub fn on_start_marker(&mut self) {
        if !self.markers_enabled {
            return;
        }
        if self.state == HealthState::Unhealthy {
            self.state = HealthState::Healthy;
            self.pending_recovery = true;
        }
    }

    /// Handle a `#stop` marker: the failure instant is the timestamp of the
    /// last healthy reading, if one exists.
    pub fn on_stop_marker(&mut self) {
        if !self.markers_enabled {
            return;
        }
        if self.state == HealthState::Healthy {
            if let Some((timestamp, true)) = self.last_reading {
                self.failure_timestamps
                    .push(format_diag_timestamp(timestamp));
            }
            self.state = HealthState::Unhealthy;
        }
    }

    /// Record a data line and return whether it is healthy under the
    /// current state.
    pub fn on_data_line(&mut self, timestamp: NaiveDateTime) -> bool {
        let healthy = self.state == HealthState::Healthy;
        if self.pending_recovery && healthy {
            self.recovery_timestamps
                .push(format_diag_timestamp(timestamp));
            self.pending_recovery = false;
        }
        self.last_reading = Some((timestamp, healthy));
        healthy
    }

    pub fn is_healthy(&self) -> bool {
        self.state == HealthState::Healthy
    }

    /// Consume the tracker, yielding `(failure, recovery)` timestamp lists.
    pub fn into_timestamps(self) -> (Vec<String>, Vec<String>) {
        (self.failure_timestamps, self.recovery_timestamps)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
