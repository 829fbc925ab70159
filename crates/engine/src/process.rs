// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row processor: totals filter, dedup, stable sort.

use serde_json::Value;
use sluice_core::{DedupKey, Row, RowKey, TaskKind};
use std::collections::BTreeSet;

/// Human-readable form of [`is_totals_row`], recorded in metadata.
pub const TOTALS_RULE: &str = "drop rows where isTotal=true AND partner=WLD AND hs=TOTAL";

/// Result of processing a raw row set
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub rows: Vec<Row>,
    pub totals_dropped: usize,
    pub duplicates_dropped: usize,
}

/// A synthetic aggregate row: `isTotal` is `true`, partner is `WLD`, hs is `TOTAL`.
pub fn is_totals_row(row: &Row) -> bool {
    row.get("isTotal") == Some(&Value::Bool(true))
        && row.get("partner").and_then(Value::as_str) == Some("WLD")
        && row.get("hs").and_then(Value::as_str) == Some("TOTAL")
}

/// Filter (totals-trap tasks only), deduplicate keeping the first
/// occurrence, then stable-sort by `key`.
pub fn process(rows: Vec<Row>, kind: TaskKind, key: &DedupKey) -> Processed {
    let before = rows.len();
    let filtered: Vec<Row> = if kind.drops_totals() {
        rows.into_iter().filter(|row| !is_totals_row(row)).collect()
    } else {
        rows
    };
    let totals_dropped = before - filtered.len();

    let mut seen: BTreeSet<RowKey> = BTreeSet::new();
    let mut keyed: Vec<(RowKey, Row)> = Vec::with_capacity(filtered.len());
    for row in filtered {
        let row_key = key.key_of(&row);
        if seen.insert(row_key.clone()) {
            keyed.push((row_key, row));
        }
    }
    let duplicates_dropped = before - totals_dropped - keyed.len();

    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));

    Processed {
        rows: keyed.into_iter().map(|(_, row)| row).collect(),
        totals_dropped,
        duplicates_dropped,
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
