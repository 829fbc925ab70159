// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.
//!
//! Command-line flags take precedence; these are the fallbacks.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REMOTE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TASKS_FILE: &str = "tasks.toml";
pub const DEFAULT_OUTPUT_ROOT: &str = "_output";

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Base URL of the remote data service: `SLUICE_REMOTE_URL` > default
pub fn remote_url() -> String {
    non_empty("SLUICE_REMOTE_URL").unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string())
}

/// Task catalog file: `SLUICE_TASKS_FILE` > `tasks.toml`
pub fn tasks_file() -> PathBuf {
    non_empty("SLUICE_TASKS_FILE").map_or_else(|| PathBuf::from(DEFAULT_TASKS_FILE), PathBuf::from)
}

/// Root for per-task output directories: `SLUICE_OUTPUT_ROOT` > `_output`
pub fn output_root() -> PathBuf {
    non_empty("SLUICE_OUTPUT_ROOT").map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT), PathBuf::from)
}

/// Readiness wait override (`SLUICE_READY_TIMEOUT_MS`)
pub fn ready_timeout() -> Option<Duration> {
    non_empty("SLUICE_READY_TIMEOUT_MS")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Retry bound override (`SLUICE_MAX_RETRIES`)
pub fn max_retries() -> Option<u32> {
    non_empty("SLUICE_MAX_RETRIES").and_then(|s| s.parse::<u32>().ok())
}

/// Liveness path override (`SLUICE_LIVENESS_PATH`)
pub fn liveness_path() -> Option<String> {
    non_empty("SLUICE_LIVENESS_PATH")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
