//! Shared formatting helpers.
//!
//! Pure functions used by the stat values, the reporters and the daemon's
//! log lines. Nothing here touches I/O.

use chrono::{DateTime, Local};
use std::time::Duration;

/// Timestamp layout used in both report formats. Carries seconds so records
/// taken within the same minute stay distinct.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date layout used for per-day output file names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Report values
// ---------------------------------------------------------------------------

/// Format an elapsed time in whole minutes as `H:MM`.
///
/// Hours are unbounded (`"125:07"`), minutes are always two digits.
/// Negative input is clamped to `"0:00"`.
pub fn format_elapsed(total_minutes: i64) -> String {
    let total_minutes = total_minutes.max(0);
    format!("{}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// Format a local timestamp for a report record.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Log lines
// ---------------------------------------------------------------------------

/// Format a polling span compactly: `"24h"`, `"15m"`, `"1h30m"`, `"45s"`.
pub fn format_span(span: Duration) -> String {
    let secs = span.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m, s) {
        (0, 0, s) => format!("{}s", s),
        (0, m, 0) => format!("{}m", m),
        (h, 0, 0) => format!("{}h", h),
        (h, m, 0) => format!("{}h{}m", h, m),
        (0, m, s) => format!("{}m{}s", m, s),
        (h, m, s) => format!("{}h{}m{}s", h, m, s),
    }
}
