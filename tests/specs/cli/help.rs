//! CLI help output specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("run")
        .stdout_has("batch")
        .stdout_has("tasks");
}

#[test]
fn run_help_shows_flags() {
    cli()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--task-id")
        .stdout_has("--output-dir")
        .stdout_has("--remote-url");
}

#[test]
fn version_shows_crate_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    cli().exits_with(2).stderr_has("Usage:");
}

#[test]
fn run_requires_task_id() {
    cli().args(&["run"]).exits_with(2).stderr_has("--task-id");
}
