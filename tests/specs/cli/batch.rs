//! `sluice batch` runs several tasks concurrently

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn batch_writes_one_bundle_per_task() {
    let service = MockService::start();
    let project = Project::new();

    // One task at a time: the mock service holds a single configured task.
    project
        .sluice(&service)
        .args(&["batch", "T1_single_page", "T7_totals_trap", "--jobs", "1"])
        .passes()
        .stdout_has("T1_single_page: ok, 300 rows")
        .stdout_has("T7_totals_trap: ok, 49 rows");

    assert_eq!(project.metadata("T1_single_page")["row_count"], 300);
    assert_eq!(project.metadata("T7_totals_trap")["row_count"], 49);
}

#[test]
fn batch_fails_if_any_task_fails() {
    let service = MockService::start();
    let project = Project::new();

    project
        .sluice(&service)
        .args(&["batch", "T1_single_page", "T9_missing", "--jobs", "1"])
        .exits_with(1)
        .stdout_has("T1_single_page: ok")
        .stderr_has("1 of 2 runs failed: T9_missing");
}

#[test]
fn batch_honours_output_root() {
    let service = MockService::start();
    let project = Project::new();
    let root = project.path().join("bundles");

    project
        .sluice(&service)
        .args(&["batch", "T1_single_page", "--output-root", root.to_str().unwrap()])
        .passes();

    assert!(root.join("T1_single_page").join("data.jsonl").exists());
}
