// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;
use serde_json::{json, Value};
use sluice_core::{format_elapsed, SystemClock, TaskDefinition};
use sluice_engine::RunOutcome;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// JSON view of a finished run.
pub fn outcome_json(outcome: &RunOutcome) -> Value {
    let state = &outcome.state;
    let mut value = json!({
        "task_id": outcome.task_id(),
        "run_id": outcome.run_id(),
        "success": outcome.success(),
        "phase": outcome.phase,
        "output_dir": outcome.output_dir.display().to_string(),
        "request_stats": state.stats,
        "pages_fetched": state.pages_fetched,
    });
    if let Some(error) = &outcome.error {
        value["error"] = json!(error.to_string());
    }
    if let Some(report) = &outcome.report {
        value["rows_written"] = json!(report.rows_written);
        value["rows_fetched"] = json!(report.rows_fetched);
        value["totals_dropped"] = json!(report.totals_dropped);
        value["duplicates_dropped"] = json!(report.duplicates_dropped);
        value["stop_reason"] = json!(report.stop_reason);
        value["data_sha256"] = json!(report.data_sha256);
    }
    value
}

/// One-line summary of a finished run.
pub fn outcome_line(outcome: &RunOutcome, elapsed: &str) -> String {
    match (&outcome.report, &outcome.error) {
        (Some(report), _) => format!(
            "{}: ok, {} rows ({} fetched, {} totals dropped, {} duplicates dropped, stop_reason={}) in {} -> {}",
            outcome.task_id(),
            report.rows_written,
            report.rows_fetched,
            report.totals_dropped,
            report.duplicates_dropped,
            report.stop_reason,
            elapsed,
            outcome.output_dir.display()
        ),
        (None, Some(error)) => {
            format!("{}: failed during {}: {}", outcome.task_id(), outcome.phase, error)
        }
        (None, None) => format!("{}: {}", outcome.task_id(), outcome.phase),
    }
}

pub fn print_outcome(outcome: &RunOutcome, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            let elapsed = format_elapsed(outcome.state.elapsed(&SystemClock));
            println!("{}", outcome_line(outcome, &elapsed));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome_json(outcome))?),
    }
    Ok(())
}

/// Catalog row as listed by `sluice tasks`
#[derive(Debug, Serialize)]
pub struct TaskRow<'a> {
    pub task_id: &'a str,
    pub kind: String,
    pub paging_mode: String,
    pub page_size: usize,
    pub max_requests: usize,
    pub total_rows: usize,
}

impl<'a> From<&'a TaskDefinition> for TaskRow<'a> {
    fn from(task: &'a TaskDefinition) -> Self {
        let c = &task.constraints;
        Self {
            task_id: &task.task_id,
            kind: task.kind().to_string(),
            paging_mode: c.paging_mode.to_string(),
            page_size: c.page_size,
            max_requests: c.max_requests,
            total_rows: c.total_rows,
        }
    }
}

/// Render catalog rows as an aligned text table.
pub fn task_table(rows: &[TaskRow<'_>]) -> String {
    let width = rows.iter().map(|r| r.task_id.len()).max().unwrap_or(0).max("TASK".len());
    let mut out = format!(
        "{:<width$}  {:<11}  {:<6}  {:>9}  {:>12}  {:>10}\n",
        "TASK", "KIND", "MODE", "PAGE_SIZE", "MAX_REQUESTS", "TOTAL_ROWS"
    );
    for r in rows {
        out.push_str(&format!(
            "{:<width$}  {:<11}  {:<6}  {:>9}  {:>12}  {:>10}\n",
            r.task_id, r.kind, r.paging_mode, r.page_size, r.max_requests, r.total_rows
        ));
    }
    out
}

