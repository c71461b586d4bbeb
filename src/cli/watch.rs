// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Watch command - recompile on definition changes

use colored::Colorize;
use miette::Result;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;

use super::{default_output, load_pipeline};
use crate::compiler::{Compiler, WriteOutcome};
use crate::config::ProjectConfig;

/// Run the watch command
pub async fn run(
    pipeline_path: PathBuf,
    output: Option<PathBuf>,
    debounce_ms: u64,
    config: &ProjectConfig,
    verbose: bool,
) -> Result<()> {
    if !pipeline_path.exists() {
        return Err(miette::miette!(
            "Pipeline file not found: {}\n\n\
             Run 'pipedef init' to create one.",
            pipeline_path.display()
        ));
    }

    let target = output.unwrap_or_else(|| default_output(&pipeline_path, config));

    println!("{}", "Starting watch mode...".bold());
    println!(
        "Watching {} (debounce: {}ms)",
        pipeline_path.display(),
        debounce_ms
    );
    println!("Press {} to exit.", "Ctrl+C".cyan());
    println!();

    let (tx, mut rx) = unbounded_channel();

    // The debouncer calls back on its own thread; the receiver stays on the runtime
    let handler = move |result: DebounceEventResult| {
        let _ = tx.send(result);
    };
    let mut debouncer = new_debouncer(Duration::from_millis(debounce_ms), handler)
        .map_err(|e| miette::miette!("Failed to create file watcher: {}", e))?;

    debouncer
        .watcher()
        .watch(&pipeline_path, RecursiveMode::NonRecursive)
        .map_err(|e| miette::miette!("Failed to start watching: {}", e))?;

    let compiler = Compiler::new();
    recompile(&compiler, &pipeline_path, &target, config);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(Ok(events)) => {
                    let relevant: Vec<_> = events
                        .iter()
                        .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                        .collect();

                    if !relevant.is_empty() {
                        println!();
                        println!("{}", "─".repeat(50).dimmed());
                        println!("{}", "Change detected".yellow());

                        if verbose {
                            for event in &relevant {
                                println!("  {}", event.path.display());
                            }
                        }

                        recompile(&compiler, &pipeline_path, &target, config);
                    }
                }
                Some(Err(e)) => {
                    eprintln!("{}: {:?}", "Watch error".red(), e);
                }
                None => {
                    eprintln!("{}", "File watcher stopped".red());
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("{}", "Stopped watching.".dimmed());
                break;
            }
        }
    }

    Ok(())
}

/// Errors are reported and the watch continues
fn recompile(compiler: &Compiler, pipeline_path: &Path, target: &Path, config: &ProjectConfig) {
    let start = std::time::Instant::now();

    let result = load_pipeline(pipeline_path, config)
        .and_then(|pipeline| compiler.compile_to_file(&pipeline, target));

    match result {
        Ok(WriteOutcome::Written) => println!(
            "{} {} ({:.2}s)",
            "Compiled".green(),
            target.display(),
            start.elapsed().as_secs_f64()
        ),
        Ok(WriteOutcome::Unchanged) => {
            println!("{} {}", "Unchanged".dimmed(), target.display())
        }
        Err(e) => eprintln!("{:?}", miette::Report::new(e)),
    }
}
