// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Validate command - check a pipeline definition

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::config::ProjectConfig;
use crate::pipeline::{PipelineDefinition, PipelineValidator, TaskGraph};
use crate::utils::{print_error, print_section, print_success, Status};

/// Run the validate command
pub fn run(pipeline_path: PathBuf, config: &ProjectConfig, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let definition = match PipelineDefinition::from_file(&pipeline_path) {
        Ok(d) => d,
        Err(e) => {
            print_error("Failed to parse pipeline");
            eprintln!();
            return Err(e.into());
        }
    };

    print_success("Definition file is valid YAML");

    let pipeline = match definition.compose(config.registry()) {
        Ok(p) => p,
        Err(e) => {
            print_error("Failed to compose pipeline");
            eprintln!();
            return Err(e.into());
        }
    };

    print_success("Components and tasks are well-typed");

    let mut validation = PipelineValidator::validate(&pipeline);
    for component in definition.unused_components() {
        validation.add_warning(&format!("Component '{}' is never used", component));
    }

    print_section("Errors", Status::Error, &validation.errors);
    print_section("Warnings", Status::Warning, &validation.warnings);

    if verbose {
        let graph = TaskGraph::build(&pipeline)?;
        println!();
        println!("{}:", "Pipeline summary".bold());
        println!("  Name: {}", pipeline.name);
        println!("  Parameters: {}", pipeline.parameters.len());
        println!("  Tasks: {}", pipeline.tasks.len());
        for id in graph.topological_order_names(&pipeline) {
            let deps = graph.dependencies(&id).unwrap_or_default();
            let deps = if deps.is_empty() {
                String::new()
            } else {
                format!(" [depends: {}]", deps.join(", "))
            };
            let component = pipeline
                .get_task(&id)
                .map(|t| t.component.name().to_string())
                .unwrap_or_default();
            println!("    - {} ({}){}", id, component, deps.dimmed());
        }
    }

    println!();

    if !validation.is_valid() {
        Err(miette::miette!("Pipeline validation failed"))
    } else if validation.has_warnings() {
        println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
        Ok(())
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
        Ok(())
    }
}
