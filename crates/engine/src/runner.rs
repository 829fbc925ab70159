// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run orchestrator.
//!
//! One run walks `Init → WaitingForService → TaskLookup → ConfiguringRemote
//! → Paginating → Processing → Writing → Done`. Any failure ends the run in
//! the phase where it happened; nothing is retried across phases.

use serde::Serialize;
use sluice_adapters::{HttpAdapter, RegistryError, TaskRegistry};
use sluice_core::{format_utc, round_secs, Clock, RunState, TaskDefinition, TaskError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{endpoint, RunConfig, CONFIGURE_PATH, RECORDS_PATH};
use crate::fetcher::Fetcher;
use crate::paginate::{fetch_all, StopReason};
use crate::process::process;
use crate::retry::FetchFailure;
use crate::run_log;
use crate::writer::{
    schema_of, Metadata, OutputHashes, OutputWriter, RetryPolicyInfo, TotalsHandling, WriteError,
};

/// Where a run is, or where it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Init,
    WaitingForService,
    TaskLookup,
    ConfiguringRemote,
    Paginating,
    Processing,
    Writing,
    Done,
}

sluice_core::simple_display! {
    RunPhase {
        Init => "init",
        WaitingForService => "waiting_for_service",
        TaskLookup => "task_lookup",
        ConfiguringRemote => "configuring_remote",
        Paginating => "paginating",
        Processing => "processing",
        Writing => "writing",
        Done => "done",
    }
}

/// Fatal run errors
#[derive(Debug, Error)]
pub enum RunError {
    #[error("remote service at {url} not ready after {waited:?}")]
    ServiceUnavailable { url: String, waited: Duration },

    #[error("task {0} not found")]
    TaskNotFound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid task definition: {0}")]
    InvalidTask(#[from] TaskError),

    #[error("remote configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("no rows fetched (stop_reason={stop_reason})")]
    NoDataFetched { stop_reason: StopReason, failure: Option<FetchFailure> },

    #[error("failed to write output: {0}")]
    OutputWriteFailed(#[from] WriteError),

    #[error("run cancelled")]
    Cancelled,
}

/// Inputs for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub task_id: String,
    pub output_dir: PathBuf,
    pub remote_url: String,
}

impl RunRequest {
    pub fn new(
        task_id: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        remote_url: impl Into<String>,
    ) -> Self {
        Self { task_id: task_id.into(), output_dir: output_dir.into(), remote_url: remote_url.into() }
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub rows_written: usize,
    pub rows_fetched: usize,
    pub totals_dropped: usize,
    pub duplicates_dropped: usize,
    pub stop_reason: StopReason,
    pub data_sha256: String,
    pub metadata: Metadata,
}

/// Result of a run: the phase it ended in, the error if any, and the final
/// run state (counters and the full log).
#[derive(Debug)]
pub struct RunOutcome {
    pub phase: RunPhase,
    pub error: Option<RunError>,
    pub report: Option<RunReport>,
    pub state: RunState,
    pub output_dir: PathBuf,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    pub fn run_id(&self) -> &str {
        self.state.run_id()
    }

    pub fn task_id(&self) -> &str {
        self.state.task_id()
    }
}

/// Drives runs against one remote service family.
///
/// Holds only shared collaborators; every run gets a fresh [`RunState`], so
/// one `Runner` may serve concurrent runs.
pub struct Runner<H: HttpAdapter, R: TaskRegistry, C: Clock> {
    http: H,
    registry: Arc<R>,
    clock: C,
    config: RunConfig,
}

impl<H: HttpAdapter, R: TaskRegistry, C: Clock> Clone for Runner<H, R, C> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            registry: Arc::clone(&self.registry),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}

impl<H: HttpAdapter, R: TaskRegistry, C: Clock> Runner<H, R, C> {
    pub fn new(http: H, registry: Arc<R>, clock: C, config: RunConfig) -> Self {
        Self { http, registry, clock, config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run a task; `true` only if the output bundle was written.
    pub async fn run_task(&self, task_id: &str, output_dir: &Path, remote_url: &str) -> bool {
        self.run(&RunRequest::new(task_id, output_dir, remote_url)).await.success()
    }

    pub async fn run(&self, request: &RunRequest) -> RunOutcome {
        self.run_with_cancel(request, &CancellationToken::new()).await
    }

    /// Run a task, checking `cancel` between liveness checks and between
    /// pagination calls.
    pub async fn run_with_cancel(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("run", run_id = %run_id, task_id = %request.task_id);
        self.execute(run_id, request, cancel).instrument(span).await
    }

    async fn execute(
        &self,
        run_id: String,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let mut state = RunState::start(run_id, &request.task_id, &self.clock);
        let mut phase = RunPhase::Init;
        run_log::info(&mut state, &self.clock, format!("Starting run for task {}", request.task_id));

        let result = self.drive(request, cancel, &mut state, &mut phase).await;
        let (error, report) = match result {
            Ok(report) => {
                phase = RunPhase::Done;
                run_log::info(
                    &mut state,
                    &self.clock,
                    format!(
                        "Task {} complete (output: {}) [complete=true]",
                        request.task_id,
                        request.output_dir.display()
                    ),
                );
                (None, Some(report))
            }
            Err(err) => {
                run_log::error(&mut state, &self.clock, format!("Run failed during {}: {}", phase, err));
                self.flush_log(&state, &request.output_dir);
                (Some(err), None)
            }
        };
        RunOutcome { phase, error, report, state, output_dir: request.output_dir.clone() }
    }

    async fn drive(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
        state: &mut RunState,
        phase: &mut RunPhase,
    ) -> Result<RunReport, RunError> {
        *phase = RunPhase::WaitingForService;
        self.wait_for_service(state, &request.remote_url, cancel).await?;

        *phase = RunPhase::TaskLookup;
        let task = self
            .registry
            .get(&request.task_id)
            .await?
            .ok_or_else(|| RunError::TaskNotFound(request.task_id.clone()))?;
        task.validate()?;

        *phase = RunPhase::ConfiguringRemote;
        self.configure_remote(state, &request.remote_url, &task).await?;

        *phase = RunPhase::Paginating;
        let fetcher = Fetcher::new(
            self.http.clone(),
            self.clock.clone(),
            self.config.retry,
            self.config.request_timeout,
        );
        let records = endpoint(&request.remote_url, RECORDS_PATH);
        let pagination = fetch_all(&fetcher, state, &records, &task.constraints, cancel).await;
        if pagination.rows.is_empty() {
            return Err(RunError::NoDataFetched {
                stop_reason: pagination.stop_reason,
                failure: pagination.failure,
            });
        }

        *phase = RunPhase::Processing;
        let rows_fetched = pagination.rows.len();
        let kind = task.kind();
        let processed = process(pagination.rows, kind, &self.config.dedup_key);
        run_log::info(
            state,
            &self.clock,
            format!(
                "Processed {} rows: {} kept, {} totals dropped, {} duplicates dropped",
                rows_fetched,
                processed.rows.len(),
                processed.totals_dropped,
                processed.duplicates_dropped
            ),
        );

        *phase = RunPhase::Writing;
        let writer = OutputWriter::new(&request.output_dir);
        writer.prepare()?;
        let data = writer.write_data(&processed.rows)?;
        run_log::info(state, &self.clock, format!("Wrote {} rows to data.jsonl", data.rows));

        let constraints = &task.constraints;
        let metadata = Metadata {
            task_id: task.task_id.clone(),
            run_id: state.run_id().to_string(),
            query: task.query.clone(),
            row_count: processed.rows.len(),
            schema: schema_of(&processed.rows),
            dedup_key: self.config.dedup_key.clone(),
            sorted_by: self.config.dedup_key.clone(),
            pagination_stats: Metadata::pagination(
                constraints.paging_mode,
                constraints.page_size,
                state.pages_fetched,
                pagination.stop_reason,
            ),
            request_count: state.stats.requests_total,
            execution_time_seconds: round_secs(state.elapsed(&self.clock)),
            request_stats: state.stats,
            retry_policy: RetryPolicyInfo::from(&self.config.retry),
            totals_handling: TotalsHandling::new(kind.drops_totals(), processed.totals_dropped),
            output_hashes: OutputHashes { data_sha256: data.sha256.clone() },
            created_at: format_utc(self.clock.epoch_ms()),
            tool_versions: Metadata::tool_versions(),
        };
        writer.write_metadata(&metadata)?;
        run_log::info(state, &self.clock, "Wrote metadata.json");
        writer.write_log(&state.render_log())?;

        Ok(RunReport {
            rows_written: processed.rows.len(),
            rows_fetched,
            totals_dropped: processed.totals_dropped,
            duplicates_dropped: processed.duplicates_dropped,
            stop_reason: pagination.stop_reason,
            data_sha256: data.sha256,
            metadata,
        })
    }

    /// Poll the liveness path until it answers below 500 or the timeout passes.
    async fn wait_for_service(
        &self,
        state: &mut RunState,
        remote_url: &str,
        cancel: &CancellationToken,
    ) -> Result<(), RunError> {
        let url = endpoint(remote_url, &self.config.liveness_path);
        run_log::info(state, &self.clock, format!("Waiting for remote service at {}", url));
        let started = self.clock.now();
        loop {
            if cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            let waited = self.clock.now().saturating_duration_since(started);
            if waited >= self.config.ready_timeout {
                return Err(RunError::ServiceUnavailable { url, waited });
            }
            match self.http.get(&url, &[], self.config.liveness_timeout).await {
                Ok(response) if !response.is_server_error() => {
                    run_log::info(state, &self.clock, "Remote service ready");
                    return Ok(());
                }
                Ok(response) => {
                    tracing::debug!(status = response.status, "liveness check not ready");
                }
                Err(e) => {
                    tracing::debug!(error = %e, "liveness check failed");
                }
            }
            self.clock.sleep(self.config.ready_interval).await;
        }
    }

    /// POST the task definition to the remote service; 2xx required.
    async fn configure_remote(
        &self,
        state: &mut RunState,
        remote_url: &str,
        task: &TaskDefinition,
    ) -> Result<(), RunError> {
        run_log::info(state, &self.clock, format!("Configuring remote service for task {}", task.task_id));
        let body = serde_json::to_value(task)
            .map_err(|e| RunError::ConfigurationFailed(format!("cannot encode task: {e}")))?;
        let url = endpoint(remote_url, CONFIGURE_PATH);
        state.begin_side_request();
        let response = self
            .http
            .post_json(&url, &body, self.config.configure_timeout)
            .await
            .map_err(|e| RunError::ConfigurationFailed(e.to_string()))?;
        if !response.is_success() {
            return Err(RunError::ConfigurationFailed(format!(
                "HTTP {} from {}",
                response.status, url
            )));
        }
        run_log::info(state, &self.clock, format!("Remote configured (HTTP {})", response.status));
        Ok(())
    }

    /// Best-effort `run.log` for a failed run.
    fn flush_log(&self, state: &RunState, output_dir: &Path) {
        let writer = OutputWriter::new(output_dir);
        if let Err(e) = writer.prepare().and_then(|_| writer.write_log(&state.render_log())) {
            tracing::warn!(error = %e, "failed to write run.log for failed run");
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
