// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sluice tasks`: list the task catalog

use anyhow::{Context, Result};
use clap::Args;
use sluice_adapters::{FileTaskRegistry, TaskRegistry};
use std::path::PathBuf;

use crate::env;
use crate::output::{task_table, OutputFormat, TaskRow};

#[derive(Args, Debug)]
pub struct TasksArgs {
    /// Task catalog (TOML or JSON) [env: SLUICE_TASKS_FILE]
    #[arg(long)]
    pub tasks_file: Option<PathBuf>,
    #[arg(short = 'o', long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

pub async fn handle(args: TasksArgs) -> Result<()> {
    let path = args.tasks_file.unwrap_or_else(env::tasks_file);
    let registry = FileTaskRegistry::new(&path);
    let tasks = registry.list().await.with_context(|| format!("cannot list tasks in {}", path.display()))?;
    let rows: Vec<TaskRow<'_>> = tasks.iter().map(TaskRow::from).collect();

    match args.output {
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No tasks in {}", path.display());
            } else {
                print!("{}", task_table(&rows));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}
