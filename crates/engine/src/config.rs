// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunables shared by every run of one [`Runner`](crate::Runner).

use sluice_core::DedupKey;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Path checked while waiting for the remote service.
pub const DEFAULT_LIVENESS_PATH: &str = "/docs";
/// Path of the remote-configuration endpoint.
pub const CONFIGURE_PATH: &str = "/configure";
/// Path of the paginated data endpoint.
pub const RECORDS_PATH: &str = "/records";

/// Run configuration. Per-run inputs (task id, output dir, remote URL)
/// travel in [`RunRequest`](crate::RunRequest) instead.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub liveness_path: String,
    /// Give up on the service after this long
    pub ready_timeout: Duration,
    /// Delay between liveness checks
    pub ready_interval: Duration,
    pub retry: RetryPolicy,
    /// Timeout for each data request attempt
    pub request_timeout: Duration,
    /// Timeout for each liveness check
    pub liveness_timeout: Duration,
    pub configure_timeout: Duration,
    pub dedup_key: DedupKey,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            liveness_path: DEFAULT_LIVENESS_PATH.to_string(),
            ready_timeout: Duration::from_secs(20),
            ready_interval: Duration::from_millis(500),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(10),
            liveness_timeout: Duration::from_secs(2),
            configure_timeout: Duration::from_secs(10),
            dedup_key: DedupKey::default(),
        }
    }
}

impl RunConfig {
    sluice_core::setters! {
        into {
            liveness_path: String,
        }
        set {
            ready_timeout: Duration,
            ready_interval: Duration,
            retry: RetryPolicy,
            request_timeout: Duration,
            liveness_timeout: Duration,
            configure_timeout: Duration,
            dedup_key: DedupKey,
        }
    }

    pub fn max_retries(self, max_retries: u32) -> Self {
        let retry = RetryPolicy { max_retries, ..self.retry };
        self.retry(retry)
    }
}

/// Join `base` and an absolute `path` without doubling the slash.
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
