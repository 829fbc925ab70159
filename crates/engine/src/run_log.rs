// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-log writes that are mirrored to the process log.

use sluice_core::{Clock, LogLevel, RunState};

/// Append `message` to the run's log and echo it through `tracing`.
///
/// The run log is the `run.log` artifact; the tracing copy keeps the
/// process log of concurrent runs attributable via the context fields.
pub fn emit(state: &mut RunState, clock: &impl Clock, level: LogLevel, message: impl Into<String>) {
    let run_id = state.run_id().to_string();
    let entry = state.push_log(clock.epoch_ms(), level, message);
    let (task_id, page, request, msg) =
        (entry.task_id.as_str(), entry.page, entry.request, entry.message.as_str());
    match level {
        LogLevel::Info => tracing::info!(%run_id, task_id, page, request, "{msg}"),
        LogLevel::Warn => tracing::warn!(%run_id, task_id, page, request, "{msg}"),
        LogLevel::Error => tracing::error!(%run_id, task_id, page, request, "{msg}"),
    }
}

pub fn info(state: &mut RunState, clock: &impl Clock, message: impl Into<String>) {
    emit(state, clock, LogLevel::Info, message);
}

pub fn warn(state: &mut RunState, clock: &impl Clock, message: impl Into<String>) {
    emit(state, clock, LogLevel::Warn, message);
}

pub fn error(state: &mut RunState, clock: &impl Clock, message: impl Into<String>) {
    emit(state, clock, LogLevel::Error, message);
}
