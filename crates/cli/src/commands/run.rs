// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sluice run`: fetch one task into an output bundle

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::RemoteArgs;
use crate::env;
use crate::exit_error::ExitError;
use crate::output::{print_outcome, OutputFormat};
use sluice_engine::RunRequest;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Task to run
    #[arg(long)]
    pub task_id: String,
    /// Output directory [default: <SLUICE_OUTPUT_ROOT>/<task-id>]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    #[command(flatten)]
    pub remote: RemoteArgs,
    #[arg(short = 'o', long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

impl RunArgs {
    pub fn request(&self) -> RunRequest {
        let output_dir =
            self.output_dir.clone().unwrap_or_else(|| env::output_root().join(&self.task_id));
        RunRequest::new(&self.task_id, output_dir, self.remote.remote_url())
    }
}

pub async fn handle(args: RunArgs) -> Result<()> {
    if args.task_id.trim().is_empty() {
        return Err(ExitError::usage("--task-id must not be empty").into());
    }
    let runner = args.remote.runner()?;
    let cancel = CancellationToken::new();
    super::batch::cancel_on_ctrl_c(cancel.clone());

    let outcome = runner.run_with_cancel(&args.request(), &cancel).await;
    print_outcome(&outcome, args.output)?;

    match outcome.error {
        None => Ok(()),
        Some(err) => {
            Err(ExitError::run_failed(format!("{}: {}", outcome.state.task_id(), err)).into())
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
