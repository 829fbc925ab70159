// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sluice-engine: fetch, paginate, clean and write one benchmark task

mod config;
mod fetcher;
mod paginate;
mod process;
mod retry;
mod run_log;
mod runner;
mod writer;

pub use config::{endpoint, RunConfig, CONFIGURE_PATH, DEFAULT_LIVENESS_PATH, RECORDS_PATH};
pub use fetcher::Fetcher;
pub use paginate::{extract_rows, fetch_all, PageCursor, Pagination, StopReason};
pub use process::{is_totals_row, process, Processed, TOTALS_RULE};
pub use retry::{AttemptOutcome, FetchFailure, RetryDecision, RetryPolicy, RetryState};
pub use runner::{RunError, RunOutcome, RunPhase, RunReport, RunRequest, Runner};
pub use writer::{
    schema_of, DataFile, Metadata, OutputHashes, OutputWriter, PaginationStats, RetryPolicyInfo,
    TotalsHandling, WriteError, DATA_FILE, LOG_FILE, METADATA_FILE,
};
