// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! pipedef - Typed ML Pipeline Definitions
//!
//! Compile pipeline definitions into portable workflow descriptions.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipedef::cli::{Cli, Commands};
use pipedef::config::ProjectConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipedef=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let config = ProjectConfig::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { template, output, force } => {
            pipedef::cli::init::run(template, output, force, cli.verbose)
        }
        Commands::Compile { files, output } => {
            pipedef::cli::compile::run(files, output, &config, cli.verbose)
        }
        Commands::Validate { pipeline } => {
            pipedef::cli::validate::run(pipeline, &config, cli.verbose)
        }
        Commands::Graph { pipeline, format } => {
            pipedef::cli::graph::run(pipeline, format, &config, cli.verbose)
        }
        Commands::Args { pipeline, set } => {
            pipedef::cli::args::run(pipeline, set, &config, cli.verbose)
        }
        Commands::Watch { pipeline, output, debounce } => {
            pipedef::cli::watch::run(pipeline, output, debounce, &config, cli.verbose).await
        }
    }
}
