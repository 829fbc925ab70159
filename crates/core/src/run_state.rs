// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run mutable state: request telemetry, pagination cursor, run log.
//!
//! A `RunState` is created fresh for every run and passed by reference
//! through the pipeline. Nothing in it is shared between runs.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::time_fmt::format_utc;

/// Severity of a run-log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

crate::simple_display! {
    LogLevel {
        Info => "INFO",
        Warn => "WARN",
        Error => "ERROR",
    }
}

/// One run-log line with the context that was current when it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub epoch_ms: u64,
    pub level: LogLevel,
    pub task_id: String,
    pub page: usize,
    pub request: usize,
    pub message: String,
}

impl LogEntry {
    /// Render as a `run.log` line (no trailing newline).
    ///
    /// Format: `2026-01-30T08:14:09Z INFO [task_id=T1] [page=1] [request=2] message`
    pub fn render(&self) -> String {
        format!(
            "{} {} [task_id={}] [page={}] [request={}] {}",
            format_utc(self.epoch_ms),
            self.level,
            self.task_id,
            self.page,
            self.request,
            self.message
        )
    }
}

/// Request accounting for the data endpoint across one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStats {
    /// Attempts issued, retries included
    pub requests_total: usize,
    /// Attempts beyond the first per logical fetch
    pub retries_total: usize,
    pub http_429: usize,
    pub http_500: usize,
}

/// Mutable state for exactly one run.
#[derive(Debug, Clone)]
pub struct RunState {
    run_id: String,
    task_id: String,
    pub stats: RequestStats,
    /// Page number used as log context (offset mode: `offset / page_size + 1`)
    pub current_page: usize,
    /// Raw cursor of the last data request: a page number or a row offset
    pub cursor: usize,
    /// Ordinal of the most recent request on the wire, configure included
    pub request_ordinal: usize,
    /// Successful data responses, the terminal empty page included
    pub pages_fetched: usize,
    started_at: Instant,
    started_epoch_ms: u64,
    log: Vec<LogEntry>,
}

impl RunState {
    /// Start a run: zeroed counters, empty log, start time stamped from `clock`.
    pub fn start(run_id: impl Into<String>, task_id: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            run_id: run_id.into(),
            task_id: task_id.into(),
            stats: RequestStats::default(),
            current_page: 0,
            cursor: 0,
            request_ordinal: 0,
            pages_fetched: 0,
            started_at: clock.now(),
            started_epoch_ms: clock.epoch_ms(),
            log: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn started_epoch_ms(&self) -> u64 {
        self.started_epoch_ms
    }

    pub fn elapsed(&self, clock: &impl Clock) -> Duration {
        clock.now().saturating_duration_since(self.started_at)
    }

    /// Count one attempt against the data endpoint.
    pub fn begin_request(&mut self) {
        self.request_ordinal += 1;
        self.stats.requests_total += 1;
    }

    /// Count a request that is not a data fetch (e.g. remote configuration).
    pub fn begin_side_request(&mut self) {
        self.request_ordinal += 1;
    }

    pub fn record_retry(&mut self) {
        self.stats.retries_total += 1;
    }

    /// Tally a retryable status code; other codes are not counted.
    pub fn record_status(&mut self, status: u16) {
        match status {
            429 => self.stats.http_429 += 1,
            500 => self.stats.http_500 += 1,
            _ => {}
        }
    }

    /// Append a log entry stamped with the current context; returns it.
    pub fn push_log(&mut self, epoch_ms: u64, level: LogLevel, message: impl Into<String>) -> &LogEntry {
        let entry = LogEntry {
            epoch_ms,
            level,
            task_id: self.task_id.clone(),
            page: self.current_page,
            request: self.request_ordinal,
            message: message.into(),
        };
        self.log.push(entry);
        &self.log[self.log.len() - 1]
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// All entries rendered, one per line, with a trailing newline.
    pub fn render_log(&self) -> String {
        let mut out = String::new();
        for entry in &self.log {
            out.push_str(&entry.render());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
#[path = "run_state_tests.rs"]
mod tests;
