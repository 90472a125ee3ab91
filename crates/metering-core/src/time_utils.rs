use chrono::NaiveDateTime;

// ── Fixed timestamp layouts ───────────────────────────────────────────────────

/// Layout written by the meter loggers, e.g. `01.10.2025 00:11:00`.
pub const RAW_TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Layout used in diagnostics and reports, e.g. `2025-10-01 00:11:00`.
pub const DIAG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a raw-log timestamp (`dd.MM.yyyy HH:mm:ss`).
///
/// Returns `None` for anything that does not match the fixed layout; the
/// caller decides whether that makes the whole line malformed. The logs carry
/// no timezone, so the result stays naive.
pub fn parse_raw_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, RAW_TIMESTAMP_FORMAT).ok()
}

/// Render a timestamp in the diagnostics layout (`yyyy-MM-dd HH:mm:ss`).
pub fn format_diag_timestamp(ts: NaiveDateTime) -> String {
    ts.format(DIAG_TIMESTAMP_FORMAT).to_string()
}
