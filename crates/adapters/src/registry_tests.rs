// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use sluice_core::PagingMode;
use std::fs;
use tempfile::TempDir;

const TOML_CATALOG: &str = r#"
[[task]]
task_id = "T1_single_page"
query = { reporter = "USA", year = 2021, flows = ["M", "X"] }
constraints = { paging_mode = "page", page_size = 500, max_requests = 5, total_rows = 300 }

[[task]]
task_id = "T3_offset"
constraints = { paging_mode = "offset", page_size = 100, max_requests = 20, total_rows = 950 }
fault_injection = { http_429_every = 3 }
"#;

const JSON_CATALOG: &str = r#"
{"tasks": [
  {"task_id": "T7_totals_trap",
   "query": {"partner": "WLD"},
   "constraints": {"paging_mode": "page", "page_size": 100, "max_requests": 5, "total_rows": 50},
   "fault_injection": {"totals_rows": 1}}
]}
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn toml_catalog_lookup() {
    let dir = TempDir::new().unwrap();
    let registry = FileTaskRegistry::new(write(&dir, "tasks.toml", TOML_CATALOG));

    let task = registry.get("T1_single_page").await.unwrap().unwrap();
    assert_eq!(task.query, json!({"reporter": "USA", "year": 2021, "flows": ["M", "X"]}));
    assert_eq!(task.constraints.total_rows, 300);
    assert!(task.fault_injection.is_null());

    let offset = registry.get("T3_offset").await.unwrap().unwrap();
    assert_eq!(offset.constraints.paging_mode, PagingMode::Offset);
    assert_eq!(offset.fault_injection, json!({"http_429_every": 3}));
}

#[tokio::test]
async fn unknown_task_is_none() {
    let dir = TempDir::new().unwrap();
    let registry = FileTaskRegistry::new(write(&dir, "tasks.toml", TOML_CATALOG));
    assert!(registry.get("T99_missing").await.unwrap().is_none());
}

#[tokio::test]
async fn json_catalog_wrapped_and_bare() {
    let dir = TempDir::new().unwrap();
    let wrapped = FileTaskRegistry::new(write(&dir, "tasks.json", JSON_CATALOG));
    let task = wrapped.get("T7_totals_trap").await.unwrap().unwrap();
    assert_eq!(task.constraints.total_rows, 50);

    let bare = FileTaskRegistry::new(write(&dir, "bare.JSON", r#"[{"task_id": "T2"}]"#));
    let ids: Vec<_> = bare.list().await.unwrap().into_iter().map(|t| t.task_id).collect();
    assert_eq!(ids, ["T2"]);
}

#[tokio::test]
async fn list_preserves_catalog_order() {
    let dir = TempDir::new().unwrap();
    let registry = FileTaskRegistry::new(write(&dir, "tasks.toml", TOML_CATALOG));
    let ids: Vec<_> = registry.list().await.unwrap().into_iter().map(|t| t.task_id).collect();
    assert_eq!(ids, ["T1_single_page", "T3_offset"]);
}

#[tokio::test]
async fn missing_file_is_read_error() {
    let dir = TempDir::new().unwrap();
    let registry = FileTaskRegistry::new(dir.path().join("absent.toml"));
    let err = registry.get("T1_single_page").await.unwrap_err();
    assert!(matches!(err, RegistryError::Read { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[yare::parameterized(
    bad_toml       = { "tasks.toml", "[[task]\ntask_id = 1" },
    bad_json       = { "tasks.json", "{\"tasks\": 5}" },
    bad_constraint = { "tasks.toml", "[[task]]\ntask_id = \"T1\"\nconstraints = { paging_mode = \"cursor\" }" },
)]
fn malformed_catalogs(name: &str, content: &str) {
    let err = parse_catalog(Path::new(name), content).unwrap_err();
    assert!(matches!(err, RegistryError::Parse { .. }), "{err}");
}

#[test]
fn duplicate_ids_rejected() {
    let content = "[[task]]\ntask_id = \"T1\"\n\n[[task]]\ntask_id = \"T1\"\n";
    let err = parse_catalog(Path::new("tasks.toml"), content).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateTask(id) if id == "T1"));
}

#[test]
fn empty_toml_catalog_has_no_tasks() {
    assert!(parse_catalog(Path::new("tasks.toml"), "").unwrap().is_empty());
}

#[tokio::test]
async fn in_memory_registry() {
    let registry = InMemoryTaskRegistry::new([
        TaskDefinition::builder().task_id("A").build(),
        TaskDefinition::builder().task_id("B").build(),
    ]);
    assert_eq!(registry.get("B").await.unwrap().unwrap().task_id, "B");
    assert!(registry.get("C").await.unwrap().is_none());
    assert_eq!(registry.list().await.unwrap().len(), 2);
}
