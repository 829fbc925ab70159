//! Shared spec helpers: the CLI builder, a temp project, and an axum mock
//! of the remote data service.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;

/// Catalog used by most specs.
pub const TASKS_TOML: &str = r#"
[[task]]
task_id = "T1_single_page"
query = { reporter = "USA", flow = "M", year = 2021 }
constraints = { paging_mode = "page", page_size = 500, max_requests = 50, total_rows = 300 }

[[task]]
task_id = "T3_offset"
constraints = { paging_mode = "offset", page_size = 120, max_requests = 50, total_rows = 1000 }

[[task]]
task_id = "T5_rate_limited"
fault_injection = { always_status = 429 }

[[task]]
task_id = "T6_empty"
fault_injection = { rows = 0 }

[[task]]
task_id = "T7_totals_trap"
query = { reporter = "USA", partner = "WLD" }
constraints = { page_size = 500, total_rows = 1000 }
"#;

// ── CLI ─────────────────────────────────────────────────────────────────

/// The `sluice` binary with a clean environment.
pub fn cli() -> CliBuilder {
    let mut cmd = assert_cmd::Command::cargo_bin("sluice").unwrap();
    for var in [
        "RUST_LOG",
        "SLUICE_REMOTE_URL",
        "SLUICE_TASKS_FILE",
        "SLUICE_OUTPUT_ROOT",
        "SLUICE_READY_TIMEOUT_MS",
        "SLUICE_MAX_RETRIES",
        "SLUICE_LIVENESS_PATH",
    ] {
        cmd.env_remove(var);
    }
    CliBuilder { cmd }
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cmd.current_dir(dir);
        self
    }

    fn output(mut self) -> (Option<i32>, RunResult) {
        let output = self.cmd.output().unwrap();
        let result = RunResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        (output.status.code(), result)
    }

    /// Run and require exit code 0.
    pub fn passes(self) -> RunResult {
        let (code, result) = self.output();
        assert!(code == Some(0), "expected success, got {:?}\nstderr:\n{}", code, result.stderr);
        result
    }

    /// Run and require the given exit code.
    pub fn exits_with(self, expected: i32) -> RunResult {
        let (code, result) = self.output();
        assert!(
            code == Some(expected),
            "expected exit {}, got {:?}\nstdout:\n{}\nstderr:\n{}",
            expected,
            code,
            result.stdout,
            result.stderr
        );
        result
    }
}

pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    pub fn stdout_has(&self, needle: &str) -> &Self {
        assert!(self.stdout.contains(needle), "stdout missing {:?}:\n{}", needle, self.stdout);
        self
    }

    pub fn stderr_has(&self, needle: &str) -> &Self {
        assert!(self.stderr.contains(needle), "stderr missing {:?}:\n{}", needle, self.stderr);
        self
    }

    pub fn stdout_json(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap()
    }
}

// ── Project ─────────────────────────────────────────────────────────────

/// Temp working directory with a task catalog and an output root.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self::with_tasks("tasks.toml", TASKS_TOML)
    }

    pub fn with_tasks(name: &str, content: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(name), content).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn output_dir(&self, task_id: &str) -> PathBuf {
        self.path().join("_output").join(task_id)
    }

    /// `sluice` run from the project directory against `service`.
    pub fn sluice(&self, service: &MockService) -> CliBuilder {
        cli()
            .current_dir(self.path())
            .env("SLUICE_REMOTE_URL", service.url())
            .env("SLUICE_READY_TIMEOUT_MS", "5000")
            .env("RUST_LOG", "warn")
    }

    pub fn read(&self, task_id: &str, file: &str) -> String {
        std::fs::read_to_string(self.output_dir(task_id).join(file)).unwrap()
    }

    pub fn metadata(&self, task_id: &str) -> Value {
        serde_json::from_str(&self.read(task_id, "metadata.json")).unwrap()
    }
}

// ── Mock data service ──────────────────────────────────────────────────

#[derive(Default)]
struct MockState {
    configured: Option<Value>,
    record_requests: Vec<HashMap<String, String>>,
}

type SharedState = Arc<Mutex<MockState>>;

/// Loopback service implementing `/docs`, `/configure` and `/records`.
///
/// `/records` serves the configured task's dataset: 50 rows with one totals
/// row for `T7_totals_trap`, otherwise `fault_injection.rows` rows (300 by
/// default). `fault_injection.always_status` makes every records request
/// answer with that status.
///
/// The server runs on its own runtime so blocking CLI specs can drive it;
/// dropping the service shuts it down.
pub struct MockService {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _runtime: Runtime,
}

impl MockService {
    pub fn start() -> Self {
        let runtime = Runtime::new().unwrap();
        let state = SharedState::default();
        let app = Router::new()
            .route("/docs", get(docs))
            .route("/configure", post(configure))
            .route("/records", get(records))
            .with_state(Arc::clone(&state));

        let listener = runtime.block_on(TcpListener::bind("127.0.0.1:0")).unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        runtime.spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self { addr, state, shutdown_tx: Some(shutdown_tx), _runtime: runtime }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Query parameters of every `/records` request, in arrival order.
    pub fn record_requests(&self) -> Vec<HashMap<String, String>> {
        self.state.lock().record_requests.clone()
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub fn param<'a>(query: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    query.get(name).map(String::as_str)
}

pub fn trade_row(i: usize) -> Value {
    json!({
        "year": 2021,
        "reporter": "USA",
        "partner": "CHN",
        "flow": "M",
        "hs": "8703",
        "record_id": format!("r{:05}", i),
        "value_usd": 1000 + i,
        "isTotal": false,
    })
}

pub fn totals_row() -> Value {
    json!({
        "year": 2021,
        "reporter": "USA",
        "partner": "WLD",
        "flow": "M",
        "hs": "TOTAL",
        "record_id": "total",
        "value_usd": 999_999,
        "isTotal": true,
    })
}

fn dataset(task: &Value) -> Vec<Value> {
    if task["task_id"] == "T7_totals_trap" {
        let mut rows: Vec<Value> = (0..49).map(trade_row).collect();
        rows.insert(20, totals_row());
        return rows;
    }
    let count = task["fault_injection"]["rows"].as_u64().unwrap_or(300) as usize;
    (0..count).map(trade_row).collect()
}

async fn docs() -> Json<Value> {
    Json(json!({"docs": true}))
}

async fn configure(State(state): State<SharedState>, Json(task): Json<Value>) -> Json<Value> {
    let task_id = task["task_id"].clone();
    state.lock().configured = Some(task);
    Json(json!({"status": "configured", "task_id": task_id}))
}

async fn records(
    State(state): State<SharedState>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock();
    state.record_requests.push(query.clone());
    let Some(task) = state.configured.clone() else {
        return (StatusCode::BAD_REQUEST, Json(json!({"detail": "not configured"})));
    };
    if let Some(status) = task["fault_injection"]["always_status"].as_u64() {
        let status = StatusCode::from_u16(status as u16).unwrap();
        return (status, Json(json!({"detail": "injected"})));
    }
    let rows = dataset(&task);
    let number = |name: &str| param(&query, name).and_then(|v| v.parse::<usize>().ok());
    let (start, size) = match number("offset") {
        Some(offset) => (offset, number("maxRecords").unwrap_or(500)),
        None => {
            let size = number("page_size").unwrap_or(500);
            (number("page").unwrap_or(1).saturating_sub(1) * size, size)
        }
    };
    let end = (start + size).min(rows.len());
    let page = if start < end { rows[start..end].to_vec() } else { Vec::new() };
    (StatusCode::OK, Json(json!({"data": page, "total": rows.len()})))
}
