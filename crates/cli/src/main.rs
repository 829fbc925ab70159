// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sluice: fetch benchmark datasets from a paginated HTTP service

mod commands;
mod env;
mod exit_error;
mod logging;
mod output;

use clap::{Parser, Subcommand};

use commands::{batch, run, tasks};

#[derive(Parser)]
#[command(name = "sluice", version, about = "Benchmark dataset fetch agent")]
struct Cli {
    /// Process log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one task into an output bundle
    Run(run::RunArgs),
    /// Run several tasks concurrently
    Batch(batch::BatchArgs),
    /// List the task catalog
    Tasks(tasks::TasksArgs),
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            std::process::exit(exit_error::EXIT_USAGE);
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Commands::Run(args) => run::handle(args).await,
            Commands::Batch(args) => batch::handle(args).await,
            Commands::Tasks(args) => tasks::handle(args).await,
        }
    });

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(exit_error::exit_code(&err));
    }
}
