// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Pipeline graph builder
//!
//! Invoking a component through [`PipelineBuilder::task`] records a task
//! node and returns a [`TaskHandle`]. The handle's outputs are
//! [`Argument`]s; passing them to later invocations records the data-flow
//! edges. [`PipelineBuilder::build`] resolves everything and checks the
//! graph.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::component::{validate_name, Component, SINGLE_OUTPUT};
use crate::errors::{PipedefError, PipedefResult};
use crate::pipeline::{Binding, ParameterSpec, Pipeline, Task, TaskGraph};
use crate::types::{describe_value, ParamType};

/// Name and description of a pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
}

impl PipelineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A value passed to a task input
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A literal value
    Constant(Value),
    /// A pipeline parameter, by name
    Parameter(String),
    /// An output of another task; `None` selects its only output
    TaskOutput { task: String, output: Option<String> },
}

impl Argument {
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }
}

/// Reference to a task recorded in a builder
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: String,
    component: Arc<Component>,
}

impl TaskHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The task's only output
    pub fn output(&self) -> PipedefResult<Argument> {
        let name = single_output_name(&self.id, &self.component)?;
        Ok(self.reference(&name))
    }

    /// A named output of the task
    pub fn outputs(&self, name: &str) -> PipedefResult<Argument> {
        if self.component.output(name).is_none() {
            return Err(PipedefError::unknown_output(
                &self.id,
                name,
                &self.component.output_names(),
            ));
        }
        Ok(self.reference(name))
    }

    fn reference(&self, output: &str) -> Argument {
        Argument::TaskOutput {
            task: self.id.clone(),
            output: Some(output.to_string()),
        }
    }
}

fn single_output_name(task: &str, component: &Component) -> PipedefResult<String> {
    match component.single_output() {
        Some(output) => Ok(output.name.clone()),
        None if component.outputs().is_empty() => {
            Err(PipedefError::unknown_output(task, SINGLE_OUTPUT, &[]))
        }
        None => Err(PipedefError::AmbiguousOutput {
            task: task.to_string(),
            count: component.outputs().len(),
        }),
    }
}

struct PendingTask {
    id: String,
    component: Arc<Component>,
    arguments: BTreeMap<String, Argument>,
    after: Vec<String>,
}

/// Records parameters, tasks and outputs, then freezes them into a [`Pipeline`]
pub struct PipelineBuilder {
    config: PipelineConfig,
    parameters: Vec<ParameterSpec>,
    tasks: Vec<PendingTask>,
    outputs: BTreeMap<String, Argument>,
    stem_counts: HashMap<String, usize>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            parameters: Vec::new(),
            tasks: Vec::new(),
            outputs: BTreeMap::new(),
            stem_counts: HashMap::new(),
        }
    }

    /// Declare a pipeline parameter and get an argument referring to it
    pub fn parameter(
        &mut self,
        name: &str,
        ty: ParamType,
        default: Option<Value>,
    ) -> PipedefResult<Argument> {
        validate_name(name).map_err(|reason| PipedefError::invalid_pipeline(format!("parameter {}", reason)))?;
        ty.validate()?;

        if self.parameters.iter().any(|p| p.name == name) {
            return Err(PipedefError::invalid_pipeline(format!(
                "duplicate parameter '{}'",
                name
            )));
        }

        if let Some(value) = &default {
            if !ty.accepts(value) {
                return Err(PipedefError::TypeMismatch {
                    target: format!("default of parameter '{}'", name),
                    expected: ty.to_string(),
                    found: describe_value(value),
                });
            }
        }

        self.parameters.push(ParameterSpec {
            name: name.to_string(),
            ty,
            default,
        });
        Ok(Argument::Parameter(name.to_string()))
    }

    /// Invoke a component; the task id is derived from the component name
    pub fn task<'a, I>(&mut self, component: &Arc<Component>, arguments: I) -> PipedefResult<TaskHandle>
    where
        I: IntoIterator<Item = (&'a str, Argument)>,
    {
        let stem = component.task_stem();
        let mut n = self.stem_counts.get(&stem).copied().unwrap_or(0) + 1;
        let id = loop {
            let candidate = if n == 1 {
                stem.clone()
            } else {
                format!("{}-{}", stem, n)
            };
            if !self.tasks.iter().any(|t| t.id == candidate) {
                break candidate;
            }
            n += 1;
        };

        let handle = self.task_named(&id, component, arguments)?;
        self.stem_counts.insert(stem, n);
        Ok(handle)
    }

    /// Invoke a component under an explicit task id
    pub fn task_named<'a, I>(
        &mut self,
        id: &str,
        component: &Arc<Component>,
        arguments: I,
    ) -> PipedefResult<TaskHandle>
    where
        I: IntoIterator<Item = (&'a str, Argument)>,
    {
        validate_name(id).map_err(|reason| PipedefError::invalid_pipeline(format!("task {}", reason)))?;
        if self.tasks.iter().any(|t| t.id == id) {
            return Err(PipedefError::invalid_pipeline(format!("duplicate task '{}'", id)));
        }

        let mut bound = BTreeMap::new();
        for (input_name, argument) in arguments {
            let input = component
                .input(input_name)
                .ok_or_else(|| PipedefError::UnknownInput {
                    component: component.name().to_string(),
                    input: input_name.to_string(),
                })?;

            if bound.contains_key(input_name) {
                return Err(PipedefError::invalid_pipeline(format!(
                    "input '{}' of task '{}' is bound twice",
                    input_name, id
                )));
            }

            // Types can only be checked once the source is known; forward
            // references are checked again in build()
            if self.is_resolvable(&argument) {
                let binding = self.resolve(id, &argument)?;
                self.check_binding(id, input_name, &input.ty, &binding)?;
            }

            bound.insert(input_name.to_string(), argument);
        }

        self.tasks.push(PendingTask {
            id: id.to_string(),
            component: Arc::clone(component),
            arguments: bound,
            after: Vec::new(),
        });

        debug!(task = %id, component = %component.name(), "Recorded task");

        Ok(TaskHandle {
            id: id.to_string(),
            component: Arc::clone(component),
        })
    }

    /// Require `task` to run after `upstream` without passing data
    pub fn after(&mut self, task: &str, upstream: &str) -> PipedefResult<()> {
        let pending = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task)
            .ok_or_else(|| PipedefError::invalid_pipeline(format!("task '{}' is not defined", task)))?;

        if !pending.after.iter().any(|a| a == upstream) {
            pending.after.push(upstream.to_string());
        }
        Ok(())
    }

    /// Expose a value as a pipeline output
    pub fn output(&mut self, name: &str, argument: Argument) -> PipedefResult<()> {
        validate_name(name).map_err(|reason| PipedefError::invalid_pipeline(format!("output {}", reason)))?;
        if !matches!(argument, Argument::TaskOutput { .. }) {
            return Err(PipedefError::InvalidPipeline {
                reason: format!("pipeline output '{}' must come from a task output", name),
                help: Some("Return the output of the task that computes the value".into()),
            });
        }
        if self.outputs.contains_key(name) {
            return Err(PipedefError::invalid_pipeline(format!(
                "duplicate pipeline output '{}'",
                name
            )));
        }
        self.outputs.insert(name.to_string(), argument);
        Ok(())
    }

    /// Resolve all arguments and check the task graph
    pub fn build(self) -> PipedefResult<Pipeline> {
        if self.config.name.trim().is_empty() {
            return Err(PipedefError::InvalidPipeline {
                reason: "pipeline name is empty".into(),
                help: Some("Give the pipeline a name in its configuration".into()),
            });
        }

        let mut tasks = Vec::with_capacity(self.tasks.len());
        for pending in &self.tasks {
            let mut arguments = BTreeMap::new();
            for (input_name, argument) in &pending.arguments {
                let binding = self.resolve(&pending.id, argument)?;
                // Input existence was checked when the task was recorded
                if let Some(input) = pending.component.input(input_name) {
                    self.check_binding(&pending.id, input_name, &input.ty, &binding)?;
                }
                arguments.insert(input_name.clone(), binding);
            }

            tasks.push(Task {
                id: pending.id.clone(),
                component: Arc::clone(&pending.component),
                arguments,
                after: pending.after.clone(),
            });
        }

        let mut outputs = BTreeMap::new();
        for (name, argument) in &self.outputs {
            let binding = self.resolve("<pipeline outputs>", argument)?;
            outputs.insert(name.clone(), binding);
        }

        let pipeline = Pipeline {
            name: self.config.name,
            description: self.config.description,
            parameters: self.parameters,
            tasks,
            outputs,
        };

        TaskGraph::build(&pipeline)?;

        debug!(
            pipeline = %pipeline.name,
            tasks = pipeline.tasks.len(),
            edges = pipeline.edges().len(),
            "Composed pipeline"
        );

        Ok(pipeline)
    }

    fn is_resolvable(&self, argument: &Argument) -> bool {
        match argument {
            Argument::Constant(_) => true,
            Argument::Parameter(name) => self.parameters.iter().any(|p| &p.name == name),
            Argument::TaskOutput { task, .. } => self.tasks.iter().any(|t| &t.id == task),
        }
    }

    /// Turn an argument into a binding, naming the output it selects
    fn resolve(&self, consumer: &str, argument: &Argument) -> PipedefResult<Binding> {
        match argument {
            Argument::Constant(value) => Ok(Binding::Constant(value.clone())),
            Argument::Parameter(name) => {
                if self.parameters.iter().any(|p| &p.name == name) {
                    Ok(Binding::Parameter(name.clone()))
                } else {
                    Err(PipedefError::UnknownParameter {
                        parameter: name.clone(),
                    })
                }
            }
            Argument::TaskOutput { task, output } => {
                let producer = self.tasks.iter().find(|t| &t.id == task).ok_or_else(|| {
                    PipedefError::UnknownTask {
                        task: consumer.to_string(),
                        dependency: task.clone(),
                    }
                })?;

                let output = match output {
                    Some(name) => producer
                        .component
                        .output(name)
                        .ok_or_else(|| {
                            PipedefError::unknown_output(task, name, &producer.component.output_names())
                        })?
                        .name
                        .clone(),
                    None => single_output_name(task, &producer.component)?,
                };

                Ok(Binding::TaskOutput {
                    task: task.clone(),
                    output,
                })
            }
        }
    }

    fn check_binding(
        &self,
        task: &str,
        input: &str,
        expected: &ParamType,
        binding: &Binding,
    ) -> PipedefResult<()> {
        let found = match binding {
            Binding::Constant(value) => {
                if expected.accepts(value) {
                    return Ok(());
                }
                describe_value(value)
            }
            Binding::Parameter(name) => match self.parameters.iter().find(|p| &p.name == name) {
                Some(param) if &param.ty == expected => return Ok(()),
                Some(param) => param.ty.to_string(),
                None => return Ok(()),
            },
            Binding::TaskOutput { task: source, output } => {
                let ty = self
                    .tasks
                    .iter()
                    .find(|t| &t.id == source)
                    .and_then(|t| t.component.output(output))
                    .map(|o| &o.ty);
                match ty {
                    Some(ty) if ty == expected => return Ok(()),
                    Some(ty) => ty.to_string(),
                    None => return Ok(()),
                }
            }
        };

        Err(PipedefError::TypeMismatch {
            target: format!("input '{}' of task '{}'", input, task),
            expected: expected.to_string(),
            found,
        })
    }
}
