// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sluice-core: data model for the sluice benchmark fetch agent

pub mod macros;

pub mod clock;
pub mod row;
pub mod run_state;
pub mod task;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use row::{compare_values, DedupKey, Row, RowKey, DEDUP_FIELDS};
pub use run_state::{LogEntry, LogLevel, RequestStats, RunState};
pub use task::{Constraints, PagingMode, TaskDefinition, TaskError, TaskKind, TOTALS_TRAP_TASK_ID};
pub use time_fmt::{format_elapsed, format_utc, round_secs};
