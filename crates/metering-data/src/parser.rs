//! Whole-file parsing of monthly meter logs.
//!
//! Composes the line decoder and the health tracker over a single
//! left-to-right pass, producing typed readings plus per-file diagnostics.
//! Per-line faults are absorbed into the diagnostics; even a file that
//! cannot be opened is reported rather than raised, so one broken meter
//! never takes down its block.

use std::path::Path;

use metering_core::models::{percentage, FileDiagnostics, Reading};
use metering_core::settings::{PipelineConfig, TextEncoding};
use tracing::{debug, warn};

use crate::decoder::{decode_line, DecodedLine};
use crate::health::HealthTracker;

// ── ParsedStream ──────────────────────────────────────────────────────────────

/// Ordered readings plus diagnostics from one meter file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStream {
    pub readings: Vec<Reading>,
    pub diagnostics: FileDiagnostics,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse one meter's monthly log file.
///
/// A missing or unreadable file is reported, not fatal: the result carries
/// zero readings and zero-filled diagnostics so the meter still shows up in
/// the diagnostic log.
pub fn parse_meter_file(path: &Path, meter_name: &str, config: &PipelineConfig) -> ParsedStream {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!("Failed to read file {}: {}", path.display(), e);
            return ParsedStream {
                readings: Vec::new(),
                diagnostics: FileDiagnostics::empty(meter_name, &file_name),
            };
        }
    };

    let text = decode_bytes(&bytes, config.encoding);
    parse_lines(text.lines(), meter_name, &file_name, config)
}

/// Parse an in-memory sequence of lines.
///
/// Split out of [`parse_meter_file`] so the pass itself is testable without
/// touching the filesystem. The parser holds no state across calls:
/// re-running it on the same input yields identical output.
pub fn parse_lines<'a, I>(
    lines: I,
    meter_name: &str,
    file_name: &str,
    config: &PipelineConfig,
) -> ParsedStream
where
    I: IntoIterator<Item = &'a str>,
{
    let mut readings: Vec<Reading> = Vec::new();
    let mut tracker = HealthTracker::new(config.health_markers_enabled);
    let mut raw_line_count = 0u64;
    let mut corrupted_line_count = 0u64;

    for line in lines {
        match decode_line(line) {
            DecodedLine::Blank => {}
            DecodedLine::Comment => {
                raw_line_count += 1;
            }
            DecodedLine::StartMarker => {
                raw_line_count += 1;
                tracker.on_start_marker();
            }
            DecodedLine::StopMarker => {
                raw_line_count += 1;
                tracker.on_stop_marker();
            }
            DecodedLine::Malformed => {
                raw_line_count += 1;
                corrupted_line_count += 1;
            }
            DecodedLine::Data { timestamp, value } => {
                raw_line_count += 1;
                let is_healthy = tracker.on_data_line(timestamp);
                readings.push(Reading {
                    timestamp,
                    // Unhealthy readings never carry a meaningful value.
                    value: if is_healthy { value } else { 0.0 },
                    is_healthy,
                });
            }
        }
    }

    let healthy_count = readings.iter().filter(|r| r.is_healthy).count() as u64;
    let total_readings = readings.len() as u64;
    let faulty_count = total_readings - healthy_count;
    let (failure_timestamps, recovery_timestamps) = tracker.into_timestamps();

    debug!(
        "File {}: {} lines, {} readings ({} healthy, {} faulty), {} corrupted",
        file_name, raw_line_count, total_readings, healthy_count, faulty_count,
        corrupted_line_count,
    );

    ParsedStream {
        readings,
        diagnostics: FileDiagnostics {
            meter_name: meter_name.to_string(),
            file_name: file_name.to_string(),
            total_readings,
            raw_line_count,
            healthy_count,
            faulty_count,
            faulty_percentage: percentage(faulty_count, total_readings),
            failure_timestamps,
            recovery_timestamps,
            corrupted_line_count,
            counter_regression: false,
        },
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Decode raw file bytes under the configured encoding.
///
/// UTF-8 decodes lossily: a stray invalid byte mangles its own line (which
/// then counts as corrupted) instead of skipping the whole file. Latin-1
/// maps every byte to the Unicode scalar with the same value.
fn decode_bytes(bytes: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
