// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backoff-retry fetcher: one logical GET with bounded retries.

use serde_json::Value;
use sluice_adapters::{HttpAdapter, HttpResponse};
use sluice_core::{Clock, RunState};
use std::time::Duration;

use crate::retry::{AttemptOutcome, FetchFailure, RetryDecision, RetryPolicy, RetryState};
use crate::run_log;

/// Issues GETs against the data endpoint, retrying 429/500/transport
/// failures with exponential backoff.
#[derive(Clone)]
pub struct Fetcher<H: HttpAdapter, C: Clock> {
    http: H,
    clock: C,
    policy: RetryPolicy,
    timeout: Duration,
}

impl<H: HttpAdapter, C: Clock> Fetcher<H, C> {
    pub fn new(http: H, clock: C, policy: RetryPolicy, timeout: Duration) -> Self {
        Self { http, clock, policy, timeout }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Fetch `url` and return the parsed JSON body of the first 200 response.
    ///
    /// Every attempt counts as a request in `state` before it is sent, and
    /// writes one log line describing the outcome and the decision taken.
    pub async fn fetch(
        &self,
        state: &mut RunState,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Value, FetchFailure> {
        let mut retry = RetryState::new(self.policy);
        loop {
            state.begin_request();
            let (outcome, body) = match self.http.get(url, params, self.timeout).await {
                Ok(HttpResponse { status, body }) => (AttemptOutcome::Status(status), Some(body)),
                Err(e) => (AttemptOutcome::Transport(e.to_string()), None),
            };
            if let AttemptOutcome::Status(status) = outcome {
                state.record_status(status);
            }

            // A 200 with an unreadable body is treated like a failed transfer.
            let (outcome, parsed) = match (outcome, body) {
                (AttemptOutcome::Status(200), Some(body)) => match serde_json::from_str(&body) {
                    Ok(value) => (AttemptOutcome::Status(200), Some(value)),
                    Err(e) => (AttemptOutcome::Transport(format!("invalid JSON body: {e}")), None),
                },
                (outcome, _) => (outcome, None),
            };

            let attempt = retry.attempt();
            match retry.decide(&outcome) {
                RetryDecision::Accept => {
                    run_log::info(state, &self.clock, "Request successful (HTTP 200) [complete=true]");
                    return Ok(parsed.unwrap_or(Value::Null));
                }
                RetryDecision::Retry { backoff } => {
                    state.record_retry();
                    let msg = retry_message(&outcome, backoff, attempt + 1, retry.max_retries());
                    run_log::warn(state, &self.clock, msg);
                    self.clock.sleep(backoff).await;
                }
                RetryDecision::GiveUp(failure) => {
                    let msg = give_up_message(&outcome, &failure, retry.max_retries());
                    run_log::error(state, &self.clock, msg);
                    return Err(failure);
                }
            }
        }
    }
}

fn retry_message(outcome: &AttemptOutcome, backoff: Duration, attempt: u32, max: u32) -> String {
    match outcome {
        AttemptOutcome::Status(429) => format!(
            "HTTP 429 received, exponential backoff retry after {:?} (attempt {}/{})",
            backoff, attempt, max
        ),
        AttemptOutcome::Status(status) => format!(
            "HTTP {} received, retry after {:?} (attempt {}/{})",
            status, backoff, attempt, max
        ),
        AttemptOutcome::Transport(message) => format!(
            "Request failed: {}; retrying after {:?} (attempt {}/{})",
            message, backoff, attempt, max
        ),
    }
}

fn give_up_message(outcome: &AttemptOutcome, failure: &FetchFailure, max: u32) -> String {
    match (outcome, failure) {
        (_, FetchFailure::UnexpectedStatus(status)) => {
            format!("Unexpected HTTP {}, not retrying", status)
        }
        (AttemptOutcome::Status(status), _) => {
            format!("HTTP {} after max {} retries limit reached", status, max)
        }
        (AttemptOutcome::Transport(message), _) => {
            format!("Request failed: {} (max {} retries limit reached)", message, max)
        }
    }
}

#[cfg(test)]
#[path = "fetcher_tests.rs"]
mod tests;
