// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Init command - write a sample pipeline definition

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::Template;
use crate::utils::print_success;

/// Run the init command
pub fn run(template: Template, output: PathBuf, force: bool, verbose: bool) -> Result<()> {
    println!("{}", "Initializing pipeline definition...".bold());
    println!();

    if output.exists() && !force {
        return Err(miette::miette!(
            "{} already exists. Use --force to overwrite.",
            output.display()
        ));
    }

    let content = template_content(template);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            miette::miette!("Failed to create directory '{}': {}", parent.display(), e)
        })?;
    }
    std::fs::write(&output, content)
        .map_err(|e| miette::miette!("Failed to write {}: {}", output.display(), e))?;

    print_success(&format!("Created {}", output.display()));
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to define your pipeline", output.display().to_string().cyan());
    println!(
        "  2. Run {} to check it",
        format!("pipedef validate {}", output.display()).cyan()
    );
    println!(
        "  3. Run {} to produce the workflow",
        format!("pipedef compile {}", output.display()).cyan()
    );
    println!();

    if verbose {
        println!("{}", "Generated definition:".dimmed());
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", content.dimmed());
    }

    Ok(())
}

pub(crate) fn template_content(template: Template) -> &'static str {
    match template {
        Template::Hello => HELLO_TEMPLATE,
        Template::Iris => IRIS_TEMPLATE,
    }
}

const HELLO_TEMPLATE: &str = include_str!("../../demos/hello_pipeline.yaml");

const IRIS_TEMPLATE: &str = include_str!("../../demos/iris_pipeline.yaml");
