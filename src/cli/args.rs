// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Args command - resolve run arguments for a pipeline

use miette::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::load_pipeline;
use crate::config::ProjectConfig;

/// Run the args command
pub fn run(
    pipeline_path: PathBuf,
    set: Vec<String>,
    config: &ProjectConfig,
    _verbose: bool,
) -> Result<()> {
    let pipeline = load_pipeline(&pipeline_path, config)?;
    let overrides = parse_overrides(&set)?;
    let arguments = pipeline.resolve_arguments(&overrides)?;

    let json = serde_json::to_string_pretty(&arguments)
        .map_err(|e| miette::miette!("Failed to serialize arguments: {}", e))?;
    println!("{}", json);

    Ok(())
}

/// Parse `KEY=VALUE` pairs; values that are not JSON are taken as strings
pub(crate) fn parse_overrides(pairs: &[String]) -> Result<BTreeMap<String, Value>> {
    pairs
        .iter()
        .map(|pair| {
            let (key, raw) = pair
                .split_once('=')
                .ok_or_else(|| miette::miette!("Expected KEY=VALUE, got '{}'", pair))?;
            let value =
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            Ok((key.trim().to_string(), value))
        })
        .collect()
}
