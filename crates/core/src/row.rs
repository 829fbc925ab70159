// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row payloads, the dedup key, and the ordering used to sort rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// One record from the data endpoint. Field order is preserved as received.
pub type Row = serde_json::Map<String, Value>;

/// Fields identifying a trade record, in sort priority order.
pub const DEDUP_FIELDS: [&str; 6] = ["year", "reporter", "partner", "flow", "hs", "record_id"];

/// Ordered field list defining row identity and the final sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupKey(Vec<String>);

impl DedupKey {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Extract the identity of `row`. Absent fields read as `null`.
    pub fn key_of(&self, row: &Row) -> RowKey {
        RowKey(self.0.iter().map(|field| row.get(field).cloned().unwrap_or(Value::Null)).collect())
    }
}

impl Default for DedupKey {
    fn default() -> Self {
        Self::new(DEDUP_FIELDS)
    }
}

/// Tuple of dedup-field values for one row.
///
/// Equality and ordering follow [`compare_values`], so `1` and `1.0`
/// identify the same record.
#[derive(Debug, Clone)]
pub struct RowKey(Vec<Value>);

impl RowKey {
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl Ord for RowKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_slices(&self.0, &other.0)
    }
}

impl PartialOrd for RowKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RowKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RowKey {}

/// Total order over JSON values.
///
/// Values of different kinds order as null < bool < number < string <
/// array < object. Numbers compare numerically, strings by code point,
/// arrays element-wise, objects by their key-sorted entries.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => compare_slices(x, y),
        (Value::Object(x), Value::Object(y)) => {
            let mut xs: Vec<_> = x.iter().collect();
            let mut ys: Vec<_> = y.iter().collect();
            xs.sort_by(|l, r| l.0.cmp(r.0));
            ys.sort_by(|l, r| l.0.cmp(r.0));
            for ((xk, xv), (yk, yv)) in xs.iter().zip(ys.iter()) {
                let ord = xk.cmp(yk).then_with(|| compare_values(xv, yv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn compare_slices(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = compare_values(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    match (exact(a), exact(b)) {
        (Exact::Int(x), Exact::Int(y)) => x.cmp(&y),
        (Exact::Int(x), Exact::Float(y)) => compare_int_float(x, y),
        (Exact::Float(x), Exact::Int(y)) => compare_int_float(y, x).reverse(),
        // JSON numbers are finite, so this is total; -0.0 equals 0.0.
        (Exact::Float(x), Exact::Float(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

enum Exact {
    Int(i128),
    Float(f64),
}

fn exact(n: &serde_json::Number) -> Exact {
    if let Some(i) = n.as_i64() {
        Exact::Int(i128::from(i))
    } else if let Some(u) = n.as_u64() {
        Exact::Int(i128::from(u))
    } else {
        Exact::Float(n.as_f64().unwrap_or(0.0))
    }
}

/// Compare an integer with a finite float without rounding the integer.
fn compare_int_float(int: i128, float: f64) -> Ordering {
    let floor = float.floor();
    // Integers fit in 65 bits; floats beyond ±2^100 are out of their reach.
    const LIMIT: f64 = 1.267_650_600_228_229_4e30;
    if floor >= LIMIT {
        return Ordering::Less;
    }
    if floor < -LIMIT {
        return Ordering::Greater;
    }
    match int.cmp(&(floor as i128)) {
        Ordering::Equal if float > floor => Ordering::Less,
        ord => ord,
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
#[path = "row_tests.rs"]
mod tests;
