// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Pipeline validation
//!
//! Reports problems in a composed pipeline before it is compiled. Errors
//! here would make compilation fail; warnings point at definitions that
//! compile but are probably not what the author meant.

use std::collections::BTreeSet;

use crate::pipeline::{Binding, Pipeline};

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate a composed pipeline
    pub fn validate(pipeline: &Pipeline) -> ValidationResult {
        let mut result = ValidationResult::new();

        if pipeline.tasks.is_empty() {
            result.add_error("Pipeline has no tasks defined");
        }

        for task in &pipeline.tasks {
            for input in task.unresolved_inputs() {
                result.add_error(&format!(
                    "Task '{}': input '{}' is never produced and has no default",
                    task.id, input
                ));
            }

            // An ordering constraint already implied by data flow adds nothing
            for upstream in &task.after {
                let implied = task
                    .arguments
                    .values()
                    .any(|b| b.producer() == Some(upstream.as_str()));
                if implied {
                    result.add_warning(&format!(
                        "Task '{}': 'after: {}' is redundant, it already consumes that task's output",
                        task.id, upstream
                    ));
                }
            }
        }

        let used_parameters: BTreeSet<&str> = pipeline
            .tasks
            .iter()
            .flat_map(|t| t.arguments.values())
            .chain(pipeline.outputs.values())
            .filter_map(|b| match b {
                Binding::Parameter(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();

        for param in &pipeline.parameters {
            if !used_parameters.contains(param.name.as_str()) {
                result.add_warning(&format!("Parameter '{}' is never used", param.name));
            }
        }

        let consumed: BTreeSet<(&str, &str)> = pipeline
            .tasks
            .iter()
            .flat_map(|t| t.arguments.values())
            .chain(pipeline.outputs.values())
            .filter_map(|b| match b {
                Binding::TaskOutput { task, output } => Some((task.as_str(), output.as_str())),
                _ => None,
            })
            .collect();

        for task in &pipeline.tasks {
            for output in task.component.outputs() {
                if !consumed.contains(&(task.id.as_str(), output.name.as_str())) {
                    result.add_warning(&format!(
                        "Task '{}': output '{}' is never consumed",
                        task.id, output.name
                    ));
                }
            }
        }

        result
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
