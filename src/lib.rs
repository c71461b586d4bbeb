// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! # pipedef - Typed ML Pipeline Definitions
//!
//! `pipedef` declares typed, containerized pipeline components, composes
//! them into a dependency graph and compiles the graph into a portable
//! workflow description for a container orchestration backend.
//!
//! ## Features
//!
//! - **Typed components** - inputs and outputs checked at declaration
//! - **Graph composition** - data flow wired through task outputs
//! - **Deterministic compilation** - identical pipelines, identical bytes
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a sample pipeline definition
//! pipedef init --template hello
//!
//! # Compile it
//! pipedef compile pipeline.yaml -o hello_pipeline.yaml
//! ```

pub mod cli;
pub mod compiler;
pub mod component;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod samples;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use compiler::{CompiledWorkflow, Compiler, WriteOutcome};
pub use component::{Component, ComponentConfig, ComponentRegistry};
pub use errors::{PipedefError, PipedefResult};
pub use pipeline::{Argument, Pipeline, PipelineBuilder, PipelineConfig, PipelineDefinition};
pub use types::ParamType;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
