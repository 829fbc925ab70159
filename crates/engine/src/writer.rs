// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output writer: `data.jsonl`, `metadata.json` and `run.log`.
//!
//! Each file is written to a temp path and renamed into place, so a file is
//! either complete or absent. The three files are not one transaction: a
//! failure on a later file leaves earlier ones on disk.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sluice_core::{DedupKey, PagingMode, RequestStats, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::paginate::StopReason;
use crate::process::TOTALS_RULE;
use crate::retry::RetryPolicy;

pub const DATA_FILE: &str = "data.jsonl";
pub const METADATA_FILE: &str = "metadata.json";
pub const LOG_FILE: &str = "run.log";

/// Errors from writing the output bundle
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: std::io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: std::io::Error },

    #[error("failed to serialize {what}: {source}")]
    Serialize { what: &'static str, source: serde_json::Error },
}

/// Pagination outcome as recorded in metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationStats {
    pub paging_mode: PagingMode,
    pub page_size: usize,
    pub pages_fetched: usize,
    pub stop_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicyInfo {
    pub max_retries: u32,
    pub backoff: String,
    /// Integer when the base is whole seconds
    pub base_seconds: Value,
}

impl From<&RetryPolicy> for RetryPolicyInfo {
    fn from(policy: &RetryPolicy) -> Self {
        let base_seconds = if policy.base.subsec_nanos() == 0 {
            Value::from(policy.base.as_secs())
        } else {
            Value::from(policy.base.as_secs_f64())
        };
        Self { max_retries: policy.max_retries, backoff: "exponential".to_string(), base_seconds }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsHandling {
    pub enabled: bool,
    pub rows_dropped: usize,
    pub rule: String,
}

impl TotalsHandling {
    pub fn new(enabled: bool, rows_dropped: usize) -> Self {
        Self { enabled, rows_dropped, rule: TOTALS_RULE.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputHashes {
    pub data_sha256: String,
}

/// The `metadata.json` document. Field order is the on-disk order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub task_id: String,
    pub run_id: String,
    pub query: Value,
    pub row_count: usize,
    pub schema: Vec<String>,
    pub dedup_key: DedupKey,
    pub sorted_by: DedupKey,
    pub pagination_stats: PaginationStats,
    pub request_count: usize,
    pub execution_time_seconds: f64,
    pub request_stats: RequestStats,
    pub retry_policy: RetryPolicyInfo,
    pub totals_handling: TotalsHandling,
    pub output_hashes: OutputHashes,
    pub created_at: String,
    pub tool_versions: BTreeMap<String, String>,
}

impl Metadata {
    pub fn pagination(
        paging_mode: PagingMode,
        page_size: usize,
        pages_fetched: usize,
        stop_reason: StopReason,
    ) -> PaginationStats {
        PaginationStats { paging_mode, page_size, pages_fetched, stop_reason: stop_reason.to_string() }
    }

    pub fn tool_versions() -> BTreeMap<String, String> {
        BTreeMap::from([("sluice".to_string(), env!("CARGO_PKG_VERSION").to_string())])
    }
}

/// Field names of the first row, in its order; empty when there are no rows.
pub fn schema_of(rows: &[Row]) -> Vec<String> {
    rows.first().map(|row| row.keys().cloned().collect()).unwrap_or_default()
}

/// Result of writing `data.jsonl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    pub path: PathBuf,
    pub rows: usize,
    pub sha256: String,
}

/// Writes the bundle files into one directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory and its parents.
    pub fn prepare(&self) -> Result<(), WriteError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|source| WriteError::CreateDir { path: self.dir.clone(), source })
    }

    /// Write one JSON object per line, each terminated by `\n`. With no rows
    /// the file is a single `\n`, so it still ends with a newline.
    pub fn write_data(&self, rows: &[Row]) -> Result<DataFile, WriteError> {
        let mut bytes = Vec::new();
        for row in rows {
            serde_json::to_writer(&mut bytes, row)
                .map_err(|source| WriteError::Serialize { what: "row", source })?;
            bytes.push(b'\n');
        }
        if bytes.is_empty() {
            bytes.push(b'\n');
        }
        let sha256 = format!("{:x}", Sha256::digest(&bytes));
        let path = self.write_file(DATA_FILE, &bytes)?;
        Ok(DataFile { path, rows: rows.len(), sha256 })
    }

    /// Write pretty-printed metadata with a trailing newline.
    pub fn write_metadata(&self, metadata: &Metadata) -> Result<PathBuf, WriteError> {
        let mut json = serde_json::to_string_pretty(metadata)
            .map_err(|source| WriteError::Serialize { what: "metadata", source })?;
        json.push('\n');
        self.write_file(METADATA_FILE, json.as_bytes())
    }

    pub fn write_log(&self, rendered: &str) -> Result<PathBuf, WriteError> {
        self.write_file(LOG_FILE, rendered.as_bytes())
    }

    fn write_file(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, WriteError> {
        let path = self.dir.join(name);
        let tmp_path = self.dir.join(format!(".{}.tmp", name));
        std::fs::write(&tmp_path, bytes)
            .and_then(|_| std::fs::rename(&tmp_path, &path))
            .map_err(|source| WriteError::Write { path: path.clone(), source })?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
