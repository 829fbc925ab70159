// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task registry: resolves task ids to [`TaskDefinition`]s.

use async_trait::async_trait;
use serde::Deserialize;
use sluice_core::TaskDefinition;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading a task catalog
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read task catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse task catalog {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("task '{0}' defined more than once")]
    DuplicateTask(String),
}

/// Source of benchmark task definitions
#[async_trait]
pub trait TaskRegistry: Send + Sync + 'static {
    /// Look up a task; `Ok(None)` when the id is unknown
    async fn get(&self, task_id: &str) -> Result<Option<TaskDefinition>, RegistryError>;

    /// All tasks, in catalog order
    async fn list(&self) -> Result<Vec<TaskDefinition>, RegistryError>;
}

/// Registry backed by a TOML or JSON catalog file.
///
/// The file is re-read on every lookup so edits between runs are picked
/// up without restarting a long-lived host.
///
/// TOML catalogs hold a `[[task]]` array of tables. JSON catalogs are
/// either a bare array or `{ "tasks": [...] }`.
#[derive(Debug, Clone)]
pub struct FileTaskRegistry {
    path: PathBuf,
}

#[derive(Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    task: Vec<TaskDefinition>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonCatalog {
    List(Vec<TaskDefinition>),
    Wrapped { tasks: Vec<TaskDefinition> },
}

impl FileTaskRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<TaskDefinition>, RegistryError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| RegistryError::Read { path: self.path.clone(), source })?;
        parse_catalog(&self.path, &content)
    }
}

/// Parse catalog text; the format is chosen by the file extension.
pub fn parse_catalog(path: &Path, content: &str) -> Result<Vec<TaskDefinition>, RegistryError> {
    let parse_err = |message: String| RegistryError::Parse { path: path.to_path_buf(), message };
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let tasks = if is_json {
        match serde_json::from_str::<JsonCatalog>(content).map_err(|e| parse_err(e.to_string()))? {
            JsonCatalog::List(tasks) | JsonCatalog::Wrapped { tasks } => tasks,
        }
    } else {
        toml::from_str::<TomlCatalog>(content).map_err(|e| parse_err(e.to_string()))?.task
    };

    let mut seen = HashSet::new();
    for task in &tasks {
        if !seen.insert(task.task_id.as_str()) {
            return Err(RegistryError::DuplicateTask(task.task_id.clone()));
        }
    }
    Ok(tasks)
}

#[async_trait]
impl TaskRegistry for FileTaskRegistry {
    async fn get(&self, task_id: &str) -> Result<Option<TaskDefinition>, RegistryError> {
        Ok(self.load().await?.into_iter().find(|t| t.task_id == task_id))
    }

    async fn list(&self) -> Result<Vec<TaskDefinition>, RegistryError> {
        self.load().await
    }
}

/// Registry over a fixed set of definitions
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRegistry {
    tasks: Vec<TaskDefinition>,
}

impl InMemoryTaskRegistry {
    pub fn new(tasks: impl IntoIterator<Item = TaskDefinition>) -> Self {
        Self { tasks: tasks.into_iter().collect() }
    }
}

#[async_trait]
impl TaskRegistry for InMemoryTaskRegistry {
    async fn get(&self, task_id: &str) -> Result<Option<TaskDefinition>, RegistryError> {
        Ok(self.tasks.iter().find(|t| t.task_id == task_id).cloned())
    }

    async fn list(&self) -> Result<Vec<TaskDefinition>, RegistryError> {
        Ok(self.tasks.clone())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
