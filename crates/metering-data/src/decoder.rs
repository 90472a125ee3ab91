//! Stateless classification of raw meter-log lines.
//!
//! One line in, one [`DecodedLine`] out. The decoder holds no state of its
//! own; marker bookkeeping lives in [`crate::health`].

use chrono::NaiveDateTime;

use metering_core::time_utils::parse_raw_timestamp;

// ── DecodedLine ───────────────────────────────────────────────────────────────

/// The outcome of classifying one raw log line.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    /// `#start` marker: the sensor came back online.
    StartMarker,
    /// `#stop` marker: the sensor went offline.
    StopMarker,
    /// Any other line beginning with `#`; ignored, not corruption.
    Comment,
    /// Empty or whitespace-only line.
    Blank,
    /// A parseable data record.
    Data { timestamp: NaiveDateTime, value: f64 },
    /// A line that could not be decoded (too few tokens or a bad
    /// timestamp); dropped and counted as corrupted.
    Malformed,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Classify one raw log line.
///
/// Data lines are `<dd.MM.yyyy> <HH:mm:ss> [<value>]` with fields separated
/// by runs of whitespace. The value token is optional and defaults to
/// `0.0`; a value that fails to parse as a number also becomes `0.0` rather
/// than corrupting the line (quirk of the source format, kept on purpose).
pub fn decode_line(line: &str) -> DecodedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return DecodedLine::Blank;
    }
    if trimmed == "#start" {
        return DecodedLine::StartMarker;
    }
    if trimmed == "#stop" {
        return DecodedLine::StopMarker;
    }
    if trimmed.starts_with('#') {
        return DecodedLine::Comment;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() < 2 {
        return DecodedLine::Malformed;
    }

    let stamp = format!("{} {}", tokens[0], tokens[1]);
    match parse_raw_timestamp(&stamp) {
        Some(timestamp) => DecodedLine::Data {
            timestamp,
            value: value_or_default(tokens.get(2).copied()),
        },
        None => DecodedLine::Malformed,
    }
}

/// Numeric value of the optional third token: `0.0` when the token is
/// absent or does not parse as a float.
pub fn value_or_default(token: Option<&str>) -> f64 {
    token.and_then(|t| t.parse::<f64>().ok()).unwrap_or(0.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
