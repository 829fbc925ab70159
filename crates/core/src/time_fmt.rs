// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp and duration formatting.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

/// Format epoch milliseconds as an RFC 3339 UTC timestamp with second
/// precision, e.g. `2026-01-30T08:14:09Z`.
pub fn format_utc(epoch_ms: u64) -> String {
    let dt = i64::try_from(epoch_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Seconds rounded to two decimal places.
pub fn round_secs(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 100.0).round() / 100.0
}

/// Short human form: `850ms`, `4.2s`, `3m12s`.
pub fn format_elapsed(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m{}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
