//! `sluice run` against the mock data service

use crate::prelude::*;
use similar_asserts::assert_eq;

/// A single short page followed by an empty page yields the whole dataset.
#[test]
fn single_page_task_writes_bundle() {
    let service = MockService::start();
    let project = Project::new();

    project
        .sluice(&service)
        .args(&["run", "--task-id", "T1_single_page"])
        .passes()
        .stdout_has("T1_single_page: ok, 300 rows");

    let data = project.read("T1_single_page", "data.jsonl");
    assert_eq!(data.lines().count(), 300);
    assert!(data.ends_with('\n'));
    let first: serde_json::Value = serde_json::from_str(data.lines().next().unwrap()).unwrap();
    assert_eq!(first, trade_row(0));

    let meta = project.metadata("T1_single_page");
    assert_eq!(meta["row_count"], 300);
    assert_eq!(meta["query"], serde_json::json!({"reporter": "USA", "flow": "M", "year": 2021}));
    assert_eq!(meta["pagination_stats"]["pages_fetched"], 2);
    assert_eq!(meta["pagination_stats"]["stop_reason"], "end_of_data");
    assert_eq!(meta["request_stats"]["requests_total"], 2);
    assert_eq!(meta["totals_handling"]["rows_dropped"], 0);

    let log = project.read("T1_single_page", "run.log");
    assert!(log.lines().all(|l| l.contains("[task_id=T1_single_page]")));
    assert!(log.contains("[request=2]"));
}

#[test]
fn totals_trap_task_drops_totals_row() {
    let service = MockService::start();
    let project = Project::new();

    project.sluice(&service).args(&["run", "--task-id", "T7_totals_trap"]).passes();

    assert_eq!(project.read("T7_totals_trap", "data.jsonl").lines().count(), 49);
    let meta = project.metadata("T7_totals_trap");
    assert_eq!(meta["row_count"], 49);
    assert_eq!(meta["totals_handling"]["enabled"], true);
    assert_eq!(meta["totals_handling"]["rows_dropped"], 1);
}

#[test]
fn offset_task_advances_by_rows_returned() {
    let service = MockService::start();
    let project = Project::new();

    project.sluice(&service).args(&["run", "--task-id", "T3_offset"]).passes();

    let offsets: Vec<String> = service
        .record_requests()
        .iter()
        .map(|q| param(q, "offset").unwrap_or_default().to_string())
        .collect();
    assert_eq!(offsets, vec!["0", "120", "240", "300"]);
    assert_eq!(project.metadata("T3_offset")["row_count"], 300);
}

#[test]
fn explicit_output_dir_and_json_output() {
    let service = MockService::start();
    let project = Project::new();
    let out = project.path().join("custom");

    let result = project
        .sluice(&service)
        .args(&["run", "--task-id", "T1_single_page", "--output-dir", out.to_str().unwrap(), "-o", "json"])
        .passes()
        .stdout_json();

    assert_eq!(result["success"], true);
    assert_eq!(result["rows_written"], 300);
    assert_eq!(result["phase"], "done");
    assert!(out.join("metadata.json").exists());
}

#[test]
fn unknown_task_exits_one() {
    let service = MockService::start();
    let project = Project::new();

    project
        .sluice(&service)
        .args(&["run", "--task-id", "T9_missing"])
        .exits_with(1)
        .stdout_has("failed during task_lookup")
        .stderr_has("task T9_missing not found");
}

#[test]
fn rate_limited_task_without_rows_exits_one() {
    let service = MockService::start();
    let project = Project::new();

    project
        .sluice(&service)
        .args(&["run", "--task-id", "T5_rate_limited", "--max-retries", "0"])
        .exits_with(1)
        .stdout_has("no rows fetched");

    assert_eq!(service.record_requests().len(), 1);
    let log = project.read("T5_rate_limited", "run.log");
    assert!(log.contains("ERROR"));
    assert!(log.contains("HTTP 429 after max 0 retries limit reached"));
}

#[test]
fn empty_dataset_exits_one() {
    let service = MockService::start();
    let project = Project::new();

    project.sluice(&service).args(&["run", "--task-id", "T6_empty"]).exits_with(1);

    assert!(!project.output_dir("T6_empty").join("data.jsonl").exists());
}

#[test]
fn unreachable_service_exits_one() {
    let project = Project::new();

    cli()
        .current_dir(project.path())
        .env("SLUICE_READY_TIMEOUT_MS", "300")
        .args(&["run", "--task-id", "T1_single_page", "--remote-url", "http://127.0.0.1:9"])
        .exits_with(1)
        .stdout_has("failed during waiting_for_service");
}

#[test]
fn unreadable_catalog_exits_one() {
    let service = MockService::start();
    let project = Project::with_tasks("tasks.toml", "[[task]\nbroken");

    project
        .sluice(&service)
        .args(&["run", "--task-id", "T1_single_page"])
        .exits_with(1)
        .stderr_has("failed to parse task catalog");
}
