// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Component declaration
//!
//! A component is a reusable, typed pipeline step. It is described by an
//! explicit [`ComponentConfig`] and turned into an immutable [`Component`]
//! by [`Component::declare`], which checks that every declared type can be
//! represented in a compiled workflow.

mod placeholder;
mod registry;

pub use placeholder::{placeholders, render, Placeholder, PlaceholderKind};
pub use registry::ComponentRegistry;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::errors::{PipedefError, PipedefResult};
use crate::types::ParamType;

/// Name given to the output of a single-output component
pub const SINGLE_OUTPUT: &str = "Output";

/// Runtime image used when a component does not name one
pub const DEFAULT_BASE_IMAGE: &str = "python:3.9";

/// A typed component input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: ParamType,

    /// Value used when the input is left unbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// A typed component output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: ParamType,
}

/// Execution environment requirements of a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub base_image: String,
    pub packages_to_install: Vec<String>,
}

/// Declaration-time description of a component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Component name (unique within a registry)
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Inputs in declaration order
    #[serde(default)]
    pub inputs: Vec<InputSpec>,

    /// Outputs in declaration order
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,

    /// Runtime image, falls back to the registry default
    #[serde(default)]
    pub base_image: Option<String>,

    /// Extra packages installed before the command runs
    #[serde(default)]
    pub packages_to_install: Vec<String>,

    /// Container entrypoint
    #[serde(default)]
    pub command: Vec<String>,

    /// Container arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl ComponentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a required input
    pub fn input(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.inputs.push(InputSpec {
            name: name.into(),
            ty,
            default: None,
        });
        self
    }

    /// Add an input that falls back to `default` when unbound
    pub fn input_with_default(mut self, name: impl Into<String>, ty: ParamType, default: Value) -> Self {
        self.inputs.push(InputSpec {
            name: name.into(),
            ty,
            default: Some(default),
        });
        self
    }

    /// Add a named output
    pub fn output(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.outputs.push(OutputSpec { name: name.into(), ty });
        self
    }

    /// Declare the component's only output
    pub fn single_output(self, ty: ParamType) -> Self {
        self.output(SINGLE_OUTPUT, ty)
    }

    pub fn base_image(mut self, image: impl Into<String>) -> Self {
        self.base_image = Some(image.into());
        self
    }

    pub fn packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages_to_install.extend(packages.into_iter().map(Into::into));
        self
    }

    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// A declared, immutable component
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    name: String,
    description: Option<String>,
    inputs: Vec<InputSpec>,
    outputs: Vec<OutputSpec>,
    environment: Environment,
    command: Vec<String>,
    args: Vec<String>,
}

impl Component {
    /// Validate a configuration and freeze it into a shareable component
    pub fn declare(config: ComponentConfig) -> PipedefResult<Arc<Self>> {
        validate_name(&config.name)
            .map_err(|reason| PipedefError::invalid_component(&config.name, reason))?;

        let mut seen = HashSet::new();
        for input in &config.inputs {
            validate_name(&input.name).map_err(|reason| {
                PipedefError::invalid_component(&config.name, format!("input {}", reason))
            })?;
            if !seen.insert(input.name.as_str()) {
                return Err(PipedefError::invalid_component(
                    &config.name,
                    format!("duplicate input '{}'", input.name),
                ));
            }
            input.ty.validate()?;

            if let Some(default) = &input.default {
                if !input.ty.accepts(default) {
                    return Err(PipedefError::invalid_component(
                        &config.name,
                        format!(
                            "default {} for input '{}' is not a {}",
                            default, input.name, input.ty
                        ),
                    ));
                }
            }
        }

        for output in &config.outputs {
            validate_name(&output.name).map_err(|reason| {
                PipedefError::invalid_component(&config.name, format!("output {}", reason))
            })?;
            if !seen.insert(output.name.as_str()) {
                return Err(PipedefError::invalid_component(
                    &config.name,
                    format!("output '{}' clashes with another input or output", output.name),
                ));
            }
            output.ty.validate()?;
        }

        for text in config.command.iter().chain(&config.args) {
            for placeholder in placeholders(text) {
                let declared = match placeholder.kind {
                    PlaceholderKind::Input => config.inputs.iter().any(|i| i.name == placeholder.name),
                    PlaceholderKind::Output => config.outputs.iter().any(|o| o.name == placeholder.name),
                };
                if !declared {
                    return Err(PipedefError::invalid_component(
                        &config.name,
                        format!("command references undeclared '{}'", placeholder.name),
                    ));
                }
            }
        }

        let base_image = config
            .base_image
            .unwrap_or_else(|| DEFAULT_BASE_IMAGE.to_string());
        if base_image.trim().is_empty() {
            return Err(PipedefError::invalid_component(&config.name, "base image is empty"));
        }

        debug!(
            component = %config.name,
            inputs = config.inputs.len(),
            outputs = config.outputs.len(),
            "Declared component"
        );

        Ok(Arc::new(Self {
            name: config.name,
            description: config.description,
            inputs: config.inputs,
            outputs: config.outputs,
            environment: Environment {
                base_image,
                packages_to_install: config.packages_to_install,
            },
            command: config.command,
            args: config.args,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputSpec] {
        &self.outputs
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Look up an input by name
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Look up an output by name
    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// The output of a single-output component
    pub fn single_output(&self) -> Option<&OutputSpec> {
        match self.outputs.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|o| o.name.as_str()).collect()
    }

    /// Default task id: the component name in kebab case
    pub fn task_stem(&self) -> String {
        let stem = self.name.replace('_', "-").to_lowercase();
        match stem.trim_start_matches('-') {
            "" => "task".to_string(),
            trimmed => trimmed.to_string(),
        }
    }
}

/// Names must be identifiers so they survive as placeholders and map keys
pub(crate) fn validate_name(name: &str) -> Result<(), String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("name pattern is valid")
    });

    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(format!("name '{}' must be an identifier", name))
    }
}
