// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sluice batch`: run several tasks concurrently

use anyhow::Result;
use clap::Args;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::RemoteArgs;
use crate::env;
use crate::exit_error::ExitError;
use crate::output::{print_outcome, OutputFormat};
use sluice_engine::RunRequest;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Tasks to run
    #[arg(required = true)]
    pub task_ids: Vec<String>,
    /// Concurrent runs
    #[arg(long, short = 'j', default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,
    /// Parent of the per-task output directories [env: SLUICE_OUTPUT_ROOT]
    #[arg(long)]
    pub output_root: Option<PathBuf>,
    #[command(flatten)]
    pub remote: RemoteArgs,
    #[arg(short = 'o', long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

impl BatchArgs {
    /// One request per distinct task id, in first-seen order.
    ///
    /// Runs of the same task share an output directory, so repeats are dropped.
    pub fn requests(&self) -> Vec<RunRequest> {
        let root = self.output_root.clone().unwrap_or_else(env::output_root);
        let remote_url = self.remote.remote_url();
        let mut seen = HashSet::new();
        self.task_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(|id| RunRequest::new(id, root.join(id), remote_url.clone()))
            .collect()
    }
}

/// Cancel `token` on the first Ctrl-C.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping after the current request");
            token.cancel();
        }
    });
}

pub async fn handle(args: BatchArgs) -> Result<()> {
    let runner = args.remote.runner()?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let requests = args.requests();
    let total = requests.len();
    if total < args.task_ids.len() {
        tracing::warn!(
            dropped = args.task_ids.len() - total,
            "ignoring repeated task ids; each task runs once"
        );
    }

    let permits = Arc::new(Semaphore::new(usize::from(args.jobs)));
    let mut set = JoinSet::new();
    for (index, request) in requests.into_iter().enumerate() {
        let runner = runner.clone();
        let cancel = cancel.clone();
        let permits = Arc::clone(&permits);
        set.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            (index, runner.run_with_cancel(&request, &cancel).await)
        });
    }

    let mut outcomes = Vec::with_capacity(total);
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(done) => outcomes.push(done),
            Err(e) => tracing::error!(error = %e, "run task panicked"),
        }
    }
    outcomes.sort_by_key(|(index, _)| *index);

    let failed: Vec<&str> =
        outcomes.iter().filter(|(_, o)| !o.success()).map(|(_, o)| o.task_id()).collect();
    for (_, outcome) in &outcomes {
        print_outcome(outcome, args.output)?;
    }

    let lost = total - outcomes.len();
    if failed.is_empty() && lost == 0 {
        Ok(())
    } else {
        Err(ExitError::run_failed(format!(
            "{} of {} runs failed: {}",
            failed.len() + lost,
            total,
            failed.join(", ")
        ))
        .into())
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
