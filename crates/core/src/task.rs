// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Benchmark task definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Task id whose dataset hides synthetic totals rows.
pub const TOTALS_TRAP_TASK_ID: &str = "T7_totals_trap";

/// Addressing scheme used to request successive chunks of the dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingMode {
    /// `?page=N&page_size=M`, pages numbered from 1
    #[default]
    Page,
    /// `?offset=N&maxRecords=M`, offsets counted in rows
    Offset,
}

crate::simple_display! {
    PagingMode {
        Page => "page",
        Offset => "offset",
    }
}

/// Pagination limits for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub paging_mode: PagingMode,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    #[serde(default = "default_total_rows")]
    pub total_rows: usize,
}

fn default_page_size() -> usize {
    500
}

fn default_max_requests() -> usize {
    50
}

fn default_total_rows() -> usize {
    1000
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            paging_mode: PagingMode::default(),
            page_size: default_page_size(),
            max_requests: default_max_requests(),
            total_rows: default_total_rows(),
        }
    }
}

/// Errors from validating a task definition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task id must not be empty")]
    EmptyId,
    #[error("task {task_id}: {field} must be greater than zero")]
    NonPositive { task_id: String, field: &'static str },
}

/// A benchmark task as served by the task registry.
///
/// `query` and `fault_injection` are opaque to the acquisition core; they
/// are forwarded to the remote service and echoed into the metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub task_id: String,
    #[serde(default = "empty_object")]
    pub query: Value,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub fault_injection: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

crate::builder! {
    pub struct TaskDefinitionBuilder => TaskDefinition {
        into {
            task_id: String = "T1_single_page",
        }
        set {
            query: Value = empty_object(),
            constraints: Constraints = Constraints::default(),
            fault_injection: Value = Value::Null,
        }
    }
}

impl TaskDefinition {
    /// Reject definitions the pagination controller cannot drive.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.task_id.is_empty() {
            return Err(TaskError::EmptyId);
        }
        let non_positive = |field| TaskError::NonPositive { task_id: self.task_id.clone(), field };
        if self.constraints.page_size == 0 {
            return Err(non_positive("page_size"));
        }
        if self.constraints.max_requests == 0 {
            return Err(non_positive("max_requests"));
        }
        Ok(())
    }

    pub fn kind(&self) -> TaskKind {
        TaskKind::of(&self.task_id)
    }
}

/// Processing variant selected by the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Standard,
    /// Dataset contains totals rows that must be dropped
    TotalsTrap,
}

impl TaskKind {
    pub fn of(task_id: &str) -> Self {
        if task_id == TOTALS_TRAP_TASK_ID {
            TaskKind::TotalsTrap
        } else {
            TaskKind::Standard
        }
    }

    pub fn drops_totals(self) -> bool {
        matches!(self, TaskKind::TotalsTrap)
    }
}

crate::simple_display! {
    TaskKind {
        Standard => "standard",
        TotalsTrap => "totals_trap",
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
