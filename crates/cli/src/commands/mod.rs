// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod batch;
pub mod run;
pub mod tasks;

use anyhow::{Context, Result};
use clap::Args;
use sluice_adapters::{FileTaskRegistry, ReqwestHttpAdapter};
use sluice_core::SystemClock;
use sluice_engine::{RunConfig, Runner};
use std::path::PathBuf;
use std::sync::Arc;

use crate::env;

pub type CliRunner = Runner<ReqwestHttpAdapter, FileTaskRegistry, SystemClock>;

/// Connection and tuning flags shared by `run` and `batch`
#[derive(Args, Debug, Clone, Default)]
pub struct RemoteArgs {
    /// Base URL of the remote data service [env: SLUICE_REMOTE_URL]
    #[arg(long)]
    pub remote_url: Option<String>,
    /// Task catalog (TOML or JSON) [env: SLUICE_TASKS_FILE]
    #[arg(long)]
    pub tasks_file: Option<PathBuf>,
    /// Retries per request after the first attempt [env: SLUICE_MAX_RETRIES]
    #[arg(long)]
    pub max_retries: Option<u32>,
    /// Seconds to wait for the remote service [env: SLUICE_READY_TIMEOUT_MS, in milliseconds]
    #[arg(long, value_name = "SECS")]
    pub ready_timeout: Option<f64>,
}

impl RemoteArgs {
    pub fn remote_url(&self) -> String {
        self.remote_url.clone().unwrap_or_else(env::remote_url)
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.tasks_file.clone().unwrap_or_else(env::tasks_file)
    }

    /// Resolve flags over environment over defaults.
    pub fn config(&self) -> RunConfig {
        let mut config = RunConfig::default();
        if let Some(path) = env::liveness_path() {
            config = config.liveness_path(path);
        }
        let ready = self
            .ready_timeout
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(std::time::Duration::from_secs_f64)
            .or_else(env::ready_timeout);
        if let Some(timeout) = ready {
            config = config.ready_timeout(timeout);
        }
        if let Some(max) = self.max_retries.or_else(env::max_retries) {
            config = config.max_retries(max);
        }
        config
    }

    pub fn runner(&self) -> Result<CliRunner> {
        let http = ReqwestHttpAdapter::new().context("failed to create HTTP client")?;
        let registry = Arc::new(FileTaskRegistry::new(self.tasks_file()));
        Ok(Runner::new(http, registry, SystemClock, self.config()))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
