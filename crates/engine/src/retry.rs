// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry/backoff state machine for a single logical fetch.
//!
//! [`RetryState`] only decides; it never sleeps or performs I/O. The fetcher
//! feeds it one [`AttemptOutcome`] per attempt and acts on the returned
//! [`RetryDecision`].

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Bounded exponential backoff: `base * factor^attempt` before retry `attempt + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`)
    pub max_retries: u32,
    pub base: Duration,
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base: Duration::from_secs(1), factor: 2 }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Self::default() }
    }

    /// Delay to wait after failed attempt number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let multiplier = self.factor.saturating_pow(attempt);
        self.base.saturating_mul(multiplier)
    }

    /// Total delay if every attempt fails.
    pub fn worst_case_delay(&self) -> Duration {
        (0..self.max_retries).map(|a| self.backoff(a)).sum()
    }
}

/// Why a logical fetch gave up
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FetchFailure {
    #[error("transport failure after all retries: {0}")]
    TransportExhausted(String),
    #[error("rate limited (HTTP 429) after all retries")]
    RateLimited,
    #[error("server error (HTTP 500) after all retries")]
    ServerError,
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),
    #[error("malformed page: {0}")]
    MalformedPage(String),
}

/// What one attempt produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// No HTTP status received (connect error, timeout, unreadable body)
    Transport(String),
    Status(u16),
}

/// What to do after an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Attempt succeeded; use its body
    Accept,
    /// Wait `backoff`, then attempt again
    Retry { backoff: Duration },
    /// Stop with a failure
    GiveUp(FetchFailure),
}

/// Attempt bookkeeping for one logical fetch.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// 0-based index of the attempt about to be made (or just made)
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_retries(&self) -> u32 {
        self.policy.max_retries
    }

    /// Decide the next step from the outcome of the current attempt.
    ///
    /// 429, 500 and transport failures are retried while attempts remain;
    /// 200 is accepted; anything else fails immediately.
    pub fn decide(&mut self, outcome: &AttemptOutcome) -> RetryDecision {
        let exhausted = match outcome {
            AttemptOutcome::Status(200) => return RetryDecision::Accept,
            AttemptOutcome::Status(429) => FetchFailure::RateLimited,
            AttemptOutcome::Status(500) => FetchFailure::ServerError,
            AttemptOutcome::Status(other) => {
                return RetryDecision::GiveUp(FetchFailure::UnexpectedStatus(*other))
            }
            AttemptOutcome::Transport(message) => FetchFailure::TransportExhausted(message.clone()),
        };

        if self.attempt < self.policy.max_retries {
            let backoff = self.policy.backoff(self.attempt);
            self.attempt += 1;
            RetryDecision::Retry { backoff }
        } else {
            RetryDecision::GiveUp(exhausted)
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
