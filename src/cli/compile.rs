// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Compile command - turn definition files into workflow files

use colored::Colorize;
use miette::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{default_output, load_pipeline};
use crate::compiler::{hash_file, Compiler, WriteOutcome};
use crate::config::ProjectConfig;
use crate::errors::{PipedefError, PipedefResult};
use crate::utils::{print_error, print_success};

/// Run the compile command
pub fn run(
    patterns: Vec<String>,
    output: Option<PathBuf>,
    config: &ProjectConfig,
    verbose: bool,
) -> Result<()> {
    let files = expand_patterns(&patterns)?;

    println!("{}", "Compiling pipelines...".bold());
    println!();

    let plan = plan_targets(&files, output.as_deref(), config)?;

    let compiler = Compiler::new();
    let mut failures = 0;

    for (file, target) in &plan {
        match compile_one(&compiler, file, target, config) {
            Ok(outcome) => {
                let status = match outcome {
                    WriteOutcome::Written => "written",
                    WriteOutcome::Unchanged => "unchanged",
                };
                print_success(&format!(
                    "{} → {} ({})",
                    file.display(),
                    target.display(),
                    status.dimmed()
                ));
                if verbose {
                    let digest = hash_file(target)?;
                    println!("    {} {}", "blake3:".dimmed(), digest.dimmed());
                }
            }
            Err(e) => {
                failures += 1;
                print_error(&file.display().to_string());
                eprintln!("{:?}", miette::Report::new(e));
            }
        }
    }

    println!();

    if failures > 0 {
        Err(miette::miette!(
            "{} of {} pipeline(s) failed to compile",
            failures,
            files.len()
        ))
    } else {
        println!("{}", format!("Compiled {} pipeline(s)", files.len()).green().bold());
        Ok(())
    }
}

fn compile_one(
    compiler: &Compiler,
    file: &Path,
    target: &Path,
    config: &ProjectConfig,
) -> PipedefResult<WriteOutcome> {
    let pipeline = load_pipeline(file, config)?;
    compiler.compile_to_file(&pipeline, target)
}

/// Expand glob patterns into a sorted, de-duplicated file list
pub(crate) fn expand_patterns(patterns: &[String]) -> PipedefResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let matches: Vec<PathBuf> = glob::glob(pattern)?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();

        if matches.is_empty() {
            return Err(PipedefError::NoInputFiles {
                pattern: pattern.clone(),
            });
        }
        files.extend(matches);
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Pair each definition with its target; two definitions may not share one
fn plan_targets(
    files: &[PathBuf],
    output: Option<&Path>,
    config: &ProjectConfig,
) -> PipedefResult<Vec<(PathBuf, PathBuf)>> {
    let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::new();
    let mut plan = Vec::with_capacity(files.len());

    for file in files {
        let target = output_path(file, output, files.len(), config);
        if let Some(first) = claimed.insert(target.clone(), file) {
            return Err(PipedefError::OutputCollision {
                target,
                first: first.clone(),
                second: file.clone(),
            });
        }
        plan.push((file.clone(), target));
    }

    Ok(plan)
}

/// `-o` names a file for a single input and a directory otherwise
fn output_path(file: &Path, output: Option<&Path>, count: usize, config: &ProjectConfig) -> PathBuf {
    match output {
        Some(path) if count == 1 && !path.is_dir() => path.to_path_buf(),
        Some(dir) => {
            let dir_config = ProjectConfig {
                output_dir: dir.to_path_buf(),
                ..config.clone()
            };
            default_output(file, &dir_config)
        }
        None => default_output(file, config),
    }
}
