// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Error types
//!
//! Every failure is surfaced synchronously to the caller with a diagnostic
//! code and, where it helps, a hint on how to fix the definition.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipedef operations
pub type PipedefResult<T> = Result<T, PipedefError>;

/// Main error type for pipedef
#[derive(Error, Debug, Diagnostic)]
pub enum PipedefError {
    // ─────────────────────────────────────────────────────────────────────────
    // Declaration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Unsupported type '{annotation}': {reason}")]
    #[diagnostic(
        code(pipedef::unsupported_type),
        help("Supported types: str, int, float, bool, List[T], Dict[str, T]")
    )]
    UnsupportedType { annotation: String, reason: String },

    #[error("Component '{component}' is invalid: {reason}")]
    #[diagnostic(code(pipedef::invalid_component))]
    InvalidComponent { component: String, reason: String },

    #[error("Component '{component}' is already registered")]
    #[diagnostic(
        code(pipedef::duplicate_component),
        help("Component names must be unique within a definition")
    )]
    DuplicateComponent { component: String },

    #[error("Component '{component}' is not declared")]
    #[diagnostic(
        code(pipedef::unknown_component),
        help("Check that '{component}' is listed under 'components'")
    )]
    UnknownComponent { component: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Composition Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid pipeline configuration: {reason}")]
    #[diagnostic(code(pipedef::invalid_pipeline))]
    InvalidPipeline {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Type mismatch on {target}: expected {expected}, got {found}")]
    #[diagnostic(
        code(pipedef::type_mismatch),
        help("The type of a value flowing into an input must match the input's declared type")
    )]
    TypeMismatch {
        target: String,
        expected: String,
        found: String,
    },

    #[error("Circular dependency detected: {}", .tasks.join(" → "))]
    #[diagnostic(
        code(pipedef::circular_dependency),
        help("Review your task arguments and 'after' constraints to remove the cycle")
    )]
    CircularDependency { tasks: Vec<String> },

    #[error("Task '{task}' references unknown task '{dependency}'")]
    #[diagnostic(
        code(pipedef::unknown_task),
        help("Check that '{dependency}' is defined in your pipeline")
    )]
    UnknownTask { task: String, dependency: String },

    #[error("Task '{task}' has no output named '{output}'")]
    #[diagnostic(code(pipedef::unknown_output))]
    UnknownOutput {
        task: String,
        output: String,
        #[help]
        help: Option<String>,
    },

    #[error("Task '{task}' has {count} outputs; the reference must name one")]
    #[diagnostic(
        code(pipedef::ambiguous_output),
        help("Name the output explicitly when referencing task '{task}'")
    )]
    AmbiguousOutput { task: String, count: usize },

    #[error("Component '{component}' has no input named '{input}'")]
    #[diagnostic(code(pipedef::unknown_input))]
    UnknownInput { component: String, input: String },

    #[error("Pipeline has no parameter named '{parameter}'")]
    #[diagnostic(code(pipedef::unknown_parameter))]
    UnknownParameter { parameter: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Compilation Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Input '{input}' of task '{task}' is never produced and has no default")]
    #[diagnostic(
        code(pipedef::missing_dependency),
        help("Bind '{input}' to a parameter, a task output or a constant, or give it a default")
    )]
    MissingDependency { task: String, input: String },

    #[error("Parameter '{parameter}' has no default and no value was supplied")]
    #[diagnostic(code(pipedef::missing_argument))]
    MissingArgument { parameter: String },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Definition file not found: {path}")]
    #[diagnostic(
        code(pipedef::definition_not_found),
        help("Create a definition with 'pipedef init' or write pipeline.yaml manually")
    )]
    DefinitionNotFound { path: PathBuf },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(pipedef::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(pipedef::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("No definition files matched pattern: {pattern}")]
    #[diagnostic(
        code(pipedef::no_input_files),
        help("Check that files matching '{pattern}' exist in your project")
    )]
    NoInputFiles { pattern: String },

    #[error("'{first}' and '{second}' would both be compiled to '{target}'")]
    #[diagnostic(
        code(pipedef::output_collision),
        help("Compile them separately with distinct -o paths, or rename one definition")
    )]
    OutputCollision {
        target: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(pipedef::io_error))]
    Io { message: String },

    #[error("YAML error: {message}")]
    #[diagnostic(code(pipedef::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(pipedef::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(pipedef::toml_error))]
    Toml { message: String },

    #[error("Glob pattern error: {message}")]
    #[diagnostic(code(pipedef::glob_error))]
    GlobPattern { message: String },
}

impl From<std::io::Error> for PipedefError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for PipedefError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for PipedefError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for PipedefError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<glob::PatternError> for PipedefError {
    fn from(e: glob::PatternError) -> Self {
        Self::GlobPattern { message: e.to_string() }
    }
}

impl PipedefError {
    /// Create an invalid component error
    pub fn invalid_component(component: &str, reason: impl Into<String>) -> Self {
        Self::InvalidComponent {
            component: component.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid pipeline error without a hint
    pub fn invalid_pipeline(reason: impl Into<String>) -> Self {
        Self::InvalidPipeline {
            reason: reason.into(),
            help: None,
        }
    }

    /// Create an unknown output error, listing what the task does produce
    pub fn unknown_output(task: &str, output: &str, available: &[&str]) -> Self {
        let help = if available.is_empty() {
            Some(format!("Task '{}' declares no outputs", task))
        } else {
            Some(format!("Available outputs: {}", available.join(", ")))
        };

        Self::UnknownOutput {
            task: task.to_string(),
            output: output.to_string(),
            help,
        }
    }

    /// Whether this error belongs to the declaration phase
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType { .. }
                | Self::InvalidComponent { .. }
                | Self::DuplicateComponent { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_joins_tasks() {
        let err = PipedefError::CircularDependency {
            tasks: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: a → b → a");
    }

    #[test]
    fn test_unknown_output_help_lists_outputs() {
        let err = PipedefError::unknown_output("load-data", "feature", &["features", "labels"]);
        match err {
            PipedefError::UnknownOutput { help, .. } => {
                assert_eq!(help.unwrap(), "Available outputs: features, labels");
            }
            _ => panic!("Expected UnknownOutput"),
        }
    }

    #[test]
    fn test_declaration_error_classification() {
        let err = PipedefError::invalid_component("x", "bad");
        assert!(err.is_declaration_error());
        assert!(!PipedefError::invalid_pipeline("bad").is_declaration_error());
    }
}
