//! `sluice tasks` lists the catalog

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn lists_tasks_as_table() {
    let project = Project::new();

    cli()
        .current_dir(project.path())
        .args(&["tasks"])
        .passes()
        .stdout_has("TASK")
        .stdout_has("T1_single_page")
        .stdout_has("totals_trap")
        .stdout_has("offset");
}

#[test]
fn lists_tasks_as_json_from_json_catalog() {
    let project = Project::with_tasks(
        "catalog.json",
        r#"{"tasks": [{"task_id": "T2_json", "constraints": {"page_size": 10}}]}"#,
    );

    let listed = cli()
        .current_dir(project.path())
        .args(&["tasks", "--tasks-file", "catalog.json", "-o", "json"])
        .passes()
        .stdout_json();

    assert_eq!(
        listed,
        serde_json::json!([{
            "task_id": "T2_json",
            "kind": "standard",
            "paging_mode": "page",
            "page_size": 10,
            "max_requests": 50,
            "total_rows": 1000
        }])
    );
}

#[test]
fn missing_catalog_is_a_configuration_error() {
    let project = Project::new();

    cli()
        .current_dir(project.path())
        .args(&["tasks", "--tasks-file", "nope.toml"])
        .exits_with(2)
        .stderr_has("nope.toml");
}
