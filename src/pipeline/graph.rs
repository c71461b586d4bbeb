// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Composed pipeline structures
//!
//! A [`Pipeline`] is produced by [`PipelineBuilder::build`](super::PipelineBuilder::build)
//! and is immutable afterwards. Every argument has been resolved to a
//! [`Binding`] and the task graph is known to be acyclic.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::component::Component;
use crate::errors::{PipedefError, PipedefResult};
use crate::types::{describe_value, ParamType};

/// A pipeline-level parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub ty: ParamType,
    pub default: Option<Value>,
}

impl ParameterSpec {
    /// A parameter without a default must be supplied when a run is created
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Where a task input (or pipeline output) takes its value from
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A literal value baked into the workflow
    Constant(Value),
    /// A pipeline parameter
    Parameter(String),
    /// A named output of an upstream task
    TaskOutput { task: String, output: String },
}

impl Binding {
    /// The upstream task this binding depends on, if any
    pub fn producer(&self) -> Option<&str> {
        match self {
            Self::TaskOutput { task, .. } => Some(task),
            _ => None,
        }
    }
}

/// A component invocation inside a pipeline
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub component: Arc<Component>,
    /// Bound inputs, keyed by input name
    pub arguments: BTreeMap<String, Binding>,
    /// Explicit ordering constraints (upstream task ids)
    pub after: Vec<String>,
}

impl Task {
    /// All upstream tasks, from data flow and ordering constraints
    pub fn dependencies(&self) -> BTreeSet<&str> {
        self.arguments
            .values()
            .filter_map(Binding::producer)
            .chain(self.after.iter().map(String::as_str))
            .collect()
    }

    /// Component inputs with neither a binding nor a default
    pub fn unresolved_inputs(&self) -> Vec<&str> {
        self.component
            .inputs()
            .iter()
            .filter(|i| i.default.is_none() && !self.arguments.contains_key(&i.name))
            .map(|i| i.name.as_str())
            .collect()
    }
}

/// A data-flow edge: an upstream output consumed by a downstream input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEdge {
    pub source_task: String,
    pub source_output: String,
    pub target_task: String,
    pub target_input: String,
}

/// A composed, validated pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Vec<ParameterSpec>,
    /// Tasks in invocation order
    pub tasks: Vec<Task>,
    /// Values returned by the pipeline
    pub outputs: BTreeMap<String, Binding>,
}

impl Pipeline {
    /// Get a task by id
    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get all task ids in invocation order
    pub fn task_ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.id.as_str()).collect()
    }

    /// Get a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Default values of all parameters that have one
    pub fn parameter_defaults(&self) -> BTreeMap<&str, &Value> {
        self.parameters
            .iter()
            .filter_map(|p| p.default.as_ref().map(|d| (p.name.as_str(), d)))
            .collect()
    }

    /// All data-flow edges, in task order
    pub fn edges(&self) -> Vec<DataEdge> {
        self.tasks
            .iter()
            .flat_map(|task| {
                task.arguments.iter().filter_map(move |(input, binding)| match binding {
                    Binding::TaskOutput { task: source, output } => Some(DataEdge {
                        source_task: source.clone(),
                        source_output: output.clone(),
                        target_task: task.id.clone(),
                        target_input: input.clone(),
                    }),
                    _ => None,
                })
            })
            .collect()
    }

    /// The type a binding carries, when it can be determined
    pub fn binding_type(&self, binding: &Binding) -> Option<ParamType> {
        match binding {
            Binding::Constant(_) => None,
            Binding::Parameter(name) => self.parameter(name).map(|p| p.ty.clone()),
            Binding::TaskOutput { task, output } => self
                .get_task(task)
                .and_then(|t| t.component.output(output))
                .map(|o| o.ty.clone()),
        }
    }

    /// Merge run-time overrides with parameter defaults.
    ///
    /// The result is the full argument map an execution backend needs to
    /// start a run of the compiled workflow.
    pub fn resolve_arguments(
        &self,
        overrides: &BTreeMap<String, Value>,
    ) -> PipedefResult<BTreeMap<String, Value>> {
        for (name, value) in overrides {
            let param = self
                .parameter(name)
                .ok_or_else(|| PipedefError::UnknownParameter {
                    parameter: name.clone(),
                })?;

            if !param.ty.accepts(value) {
                return Err(PipedefError::TypeMismatch {
                    target: format!("parameter '{}'", name),
                    expected: param.ty.to_string(),
                    found: describe_value(value),
                });
            }
        }

        self.parameters
            .iter()
            .map(|param| {
                let value = overrides
                    .get(&param.name)
                    .or(param.default.as_ref())
                    .cloned()
                    .ok_or_else(|| PipedefError::MissingArgument {
                        parameter: param.name.clone(),
                    })?;
                Ok((param.name.clone(), value))
            })
            .collect()
    }
}
