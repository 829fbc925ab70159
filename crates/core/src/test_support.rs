// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::row::Row;
use serde_json::{json, Value};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for row payloads.
pub mod strategies {
    use super::trade_row_with;
    use crate::row::Row;
    use proptest::prelude::*;

    /// A trade row drawn from small value domains so duplicates are common.
    pub fn arb_trade_row() -> impl Strategy<Value = Row> {
        (
            2019i64..2022,
            prop::sample::select(vec!["USA", "CAN", "DEU"]),
            prop::sample::select(vec!["WLD", "CHN", "MEX"]),
            prop::sample::select(vec!["M", "X"]),
            prop::sample::select(vec!["01", "8703", "TOTAL"]),
            0u32..6,
            any::<bool>(),
        )
            .prop_map(|(year, reporter, partner, flow, hs, id, is_total)| {
                trade_row_with(year, reporter, partner, flow, hs, &format!("r{id}"), is_total)
            })
    }

    pub fn arb_trade_rows() -> impl Strategy<Value = Vec<Row>> {
        prop::collection::vec(arb_trade_row(), 0..40)
    }
}

// ── Row factories ─────────────────────────────────────────────────────────

fn object(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// A trade row with every dedup field populated.
pub fn trade_row_with(
    year: i64,
    reporter: &str,
    partner: &str,
    flow: &str,
    hs: &str,
    record_id: &str,
    is_total: bool,
) -> Row {
    object(json!({
        "year": year,
        "reporter": reporter,
        "partner": partner,
        "flow": flow,
        "hs": hs,
        "record_id": record_id,
        "value_usd": 1000,
        "isTotal": is_total,
    }))
}

/// The `i`th row of a synthetic dataset; ids are unique per `i`.
pub fn trade_row(i: usize) -> Row {
    trade_row_with(2021, "USA", "CHN", "M", "8703", &format!("r{:05}", i), false)
}

/// `count` distinct rows starting at index `start`.
pub fn trade_rows(start: usize, count: usize) -> Vec<Row> {
    (start..start + count).map(trade_row).collect()
}

/// A synthetic world-total aggregate row.
pub fn totals_row() -> Row {
    trade_row_with(2021, "USA", "WLD", "M", "TOTAL", "total", true)
}

/// Wrap rows into a data endpoint response body.
pub fn page_body(rows: &[Row]) -> String {
    json!({ "data": rows }).to_string()
}
