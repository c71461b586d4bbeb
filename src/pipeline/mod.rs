// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Pipeline composition
//!
//! This module holds the graph builder, the composed pipeline structures,
//! the task DAG, definition files and validation.

mod builder;
mod dag;
mod definition;
mod graph;
mod validation;

pub use builder::{Argument, PipelineBuilder, PipelineConfig, TaskHandle};
pub use dag::{EdgeKind, TaskGraph};
pub use definition::*;
pub use graph::{Binding, DataEdge, ParameterSpec, Pipeline, Task};
pub use validation::{PipelineValidator, ValidationResult};
