// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for pipedef.

pub mod args;
pub mod compile;
pub mod graph;
pub mod init;
pub mod validate;
pub mod watch;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::errors::PipedefResult;
use crate::pipeline::{Pipeline, PipelineDefinition};

/// Typed ML pipeline definitions
///
/// Declare components, compose them into a graph, compile the graph.
#[derive(Parser, Debug)]
#[clap(
    name = "pipedef",
    version,
    about = "Compile typed ML pipeline definitions into portable workflows",
    long_about = None,
    after_help = "Examples:\n\
        pipedef init                         Write a sample pipeline.yaml\n\
        pipedef compile pipeline.yaml        Compile a pipeline definition\n\
        pipedef graph -f mermaid             Show the task graph\n\
        pipedef args --set recipient=Ada     Resolve run arguments\n\n\
        See 'pipedef <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Project configuration file (defaults to pipedef.toml when present)
    #[clap(long, global = true, env = "PIPEDEF_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a sample pipeline definition
    Init {
        /// Sample to start from
        #[clap(short, long, value_enum, default_value = "hello")]
        template: Template,

        /// Definition file to create
        #[clap(short, long, default_value = "pipeline.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[clap(long)]
        force: bool,
    },

    /// Compile pipeline definitions into workflow files
    Compile {
        /// Definition files or glob patterns
        #[clap(default_value = "pipeline.yaml")]
        files: Vec<String>,

        /// Output file (single input) or directory (several inputs)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a pipeline definition
    Validate {
        /// Definition file to validate
        #[clap(default_value = "pipeline.yaml")]
        pipeline: PathBuf,
    },

    /// Show the task graph
    Graph {
        /// Definition file
        #[clap(default_value = "pipeline.yaml")]
        pipeline: PathBuf,

        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: GraphFormat,
    },

    /// Resolve run arguments against parameter defaults
    Args {
        /// Definition file
        #[clap(default_value = "pipeline.yaml")]
        pipeline: PathBuf,

        /// Override a parameter (KEY=VALUE, VALUE parsed as JSON when possible)
        #[clap(short, long, value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Recompile whenever the definition changes
    Watch {
        /// Definition file
        #[clap(default_value = "pipeline.yaml")]
        pipeline: PathBuf,

        /// Output file
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Debounce delay in milliseconds
        #[clap(long, default_value = "500")]
        debounce: u64,
    },
}

/// Sample pipelines for `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Template {
    Hello,
    Iris,
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Read a definition file and compose it with the project's defaults
pub(crate) fn load_pipeline(path: &Path, config: &ProjectConfig) -> PipedefResult<Pipeline> {
    PipelineDefinition::from_file(path)?.compose(config.registry())
}

/// Default compiled file name for a definition file
pub(crate) fn default_output(definition: &Path, config: &ProjectConfig) -> PathBuf {
    let stem = definition
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pipeline".to_string());
    config.output_dir.join(format!("{}.compiled.yaml", stem))
}
