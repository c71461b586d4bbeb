// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Pipeline definition files
//!
//! Defines the schema for pipeline.yaml files: components, parameters,
//! tasks and outputs written declaratively and composed through the
//! [`PipelineBuilder`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::component::{ComponentConfig, ComponentRegistry};
use crate::errors::{PipedefError, PipedefResult};
use crate::pipeline::{Argument, Pipeline, PipelineBuilder, PipelineConfig};
use crate::types::ParamType;

/// Pipeline definition from pipeline.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Definition format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Pipeline name
    pub name: String,

    /// Pipeline description
    #[serde(default)]
    pub description: Option<String>,

    /// Pipeline parameters
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,

    /// Components available to tasks
    pub components: Vec<ComponentConfig>,

    /// Component invocations
    pub tasks: Vec<TaskDefinition>,

    /// Values returned by the pipeline
    #[serde(default)]
    pub outputs: BTreeMap<String, ArgumentDefinition>,
}

fn default_version() -> String {
    "1".to_string()
}

/// A pipeline parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: ParamType,

    #[serde(default)]
    pub default: Option<Value>,
}

/// A component invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task id (must be unique within the pipeline)
    pub name: String,

    /// Name of the component to invoke
    pub component: String,

    /// Input bindings, keyed by component input name
    #[serde(default)]
    pub arguments: BTreeMap<String, ArgumentDefinition>,

    /// Tasks that must finish first, without passing data
    #[serde(default)]
    pub after: Vec<String>,
}

/// Where an argument takes its value from
///
/// In YAML this is `{ parameter: p }`, `{ task: t, output: o }` (the
/// output may be omitted for single-output tasks), `{ value: v }`, or a bare
/// scalar or list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ArgumentDefinition {
    Parameter { parameter: String },
    TaskOutput { task: String, output: Option<String> },
    Constant(Value),
}

impl ArgumentDefinition {
    pub fn to_argument(&self) -> Argument {
        match self {
            Self::Parameter { parameter } => Argument::Parameter(parameter.clone()),
            Self::TaskOutput { task, output } => Argument::TaskOutput {
                task: task.clone(),
                output: output.clone(),
            },
            Self::Constant(value) => Argument::Constant(value.clone()),
        }
    }

    fn from_reference(map: &Map<String, Value>) -> Option<Self> {
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(String::from);

        match map.len() {
            1 if map.contains_key("value") => map.get("value").cloned().map(Self::Constant),
            1 => text("parameter")
                .map(|parameter| Self::Parameter { parameter })
                .or_else(|| text("task").map(|task| Self::TaskOutput { task, output: None })),
            2 => Some(Self::TaskOutput {
                task: text("task")?,
                output: Some(text("output")?),
            }),
            _ => None,
        }
    }
}

impl From<Value> for ArgumentDefinition {
    fn from(value: Value) -> Self {
        if let Value::Object(map) = &value {
            if let Some(reference) = Self::from_reference(map) {
                return reference;
            }
        }
        Self::Constant(value)
    }
}

impl From<ArgumentDefinition> for Value {
    fn from(argument: ArgumentDefinition) -> Self {
        match argument {
            ArgumentDefinition::Parameter { parameter } => json!({ "parameter": parameter }),
            ArgumentDefinition::TaskOutput { task, output: None } => json!({ "task": task }),
            ArgumentDefinition::TaskOutput {
                task,
                output: Some(output),
            } => json!({ "task": task, "output": output }),
            ArgumentDefinition::Constant(value) if value.is_object() => json!({ "value": value }),
            ArgumentDefinition::Constant(value) => value,
        }
    }
}

impl PipelineDefinition {
    /// Load a definition from a YAML file
    pub fn from_file(path: &Path) -> PipedefResult<Self> {
        if !path.exists() {
            return Err(PipedefError::DefinitionNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PipedefError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a definition from a YAML string
    pub fn from_yaml(yaml: &str) -> PipedefResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Serialize the definition to YAML
    pub fn to_yaml(&self) -> PipedefResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Declare the components and compose the pipeline.
    ///
    /// Components are registered into `registry`, so its default base
    /// image applies to components that do not name one.
    pub fn compose(&self, mut registry: ComponentRegistry) -> PipedefResult<Pipeline> {
        if self.version != "1" {
            return Err(PipedefError::InvalidPipeline {
                reason: format!("unsupported definition version '{}'", self.version),
                help: Some("Set 'version: \"1\"'".into()),
            });
        }

        for component in &self.components {
            registry.register(component.clone())?;
        }

        let mut config = PipelineConfig::new(&self.name);
        config.description = self.description.clone();
        let mut builder = PipelineBuilder::new(config);

        for param in &self.parameters {
            builder.parameter(&param.name, param.ty.clone(), param.default.clone())?;
        }

        for task in &self.tasks {
            let component = registry.get(&task.component)?;
            let arguments = task
                .arguments
                .iter()
                .map(|(input, argument)| (input.as_str(), argument.to_argument()));
            builder.task_named(&task.name, &component, arguments)?;
        }

        // Ordering constraints may point at tasks defined later in the file
        for task in &self.tasks {
            for upstream in &task.after {
                builder.after(&task.name, upstream)?;
            }
        }

        for (name, argument) in &self.outputs {
            builder.output(name, argument.to_argument())?;
        }

        debug!(pipeline = %self.name, components = registry.len(), "Composing definition");

        builder.build()
    }

    /// Components declared in the file but never invoked
    pub fn unused_components(&self) -> Vec<&str> {
        self.components
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| !self.tasks.iter().any(|t| t.component == *name))
            .collect()
    }
}
