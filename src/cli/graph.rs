// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Graph command - visualize the task graph

use miette::Result;
use std::path::PathBuf;

use super::{load_pipeline, GraphFormat};
use crate::config::ProjectConfig;
use crate::pipeline::TaskGraph;

/// Run the graph command
pub fn run(
    pipeline_path: PathBuf,
    format: GraphFormat,
    config: &ProjectConfig,
    _verbose: bool,
) -> Result<()> {
    let pipeline = load_pipeline(&pipeline_path, config)?;
    let graph = TaskGraph::build(&pipeline)?;

    let output = match format {
        GraphFormat::Text => graph.to_text(&pipeline),
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    println!("{}", output);

    Ok(())
}
