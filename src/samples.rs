// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Reference pipelines
//!
//! Built through the public builder API. `pipedef init` writes the same
//! pipelines as definition files.

use serde_json::json;
use std::sync::Arc;

use crate::component::{Component, ComponentConfig};
use crate::errors::PipedefResult;
use crate::pipeline::{Pipeline, PipelineBuilder, PipelineConfig};
use crate::types::ParamType;

const SAY_HELLO_SCRIPT: &str = r#"import sys
name, output = sys.argv[1], sys.argv[2]
text = f"Hello, {name}!"
print(text)
open(output, "w").write(text)
"#;

const LOAD_DATA_SCRIPT: &str = r#"import json, sys
from sklearn.datasets import load_iris
iris = load_iris()
json.dump(iris.data.tolist(), open(sys.argv[1], "w"))
json.dump(iris.target.tolist(), open(sys.argv[2], "w"))
"#;

const TRAIN_MODEL_SCRIPT: &str = r#"import json, sys
from sklearn.ensemble import RandomForestClassifier
from sklearn.model_selection import train_test_split
from sklearn.metrics import accuracy_score
features, labels = json.loads(sys.argv[1]), json.loads(sys.argv[2])
X_train, X_test, y_train, y_test = train_test_split(features, labels, test_size=0.2)
clf = RandomForestClassifier()
clf.fit(X_train, y_train)
acc = accuracy_score(y_test, clf.predict(X_test))
print(f"Model accuracy: {acc}")
open(sys.argv[3], "w").write(str(acc))
"#;

/// `say_hello(name: str) -> str`
pub fn say_hello() -> PipedefResult<Arc<Component>> {
    Component::declare(
        ComponentConfig::new("say_hello")
            .description("A simple component that says hello to a given name.")
            .input("name", ParamType::String)
            .single_output(ParamType::String)
            .command(["python3", "-c", SAY_HELLO_SCRIPT])
            .args(["{{inputs.name}}", "{{outputs.Output}}"]),
    )
}

/// Greeting pipeline with a single `recipient` parameter
pub fn hello_pipeline() -> PipedefResult<Pipeline> {
    let say_hello = say_hello()?;

    let mut builder = PipelineBuilder::new(
        PipelineConfig::new("hello-world-pipeline")
            .description("A basic pipeline that prints a greeting."),
    );
    let recipient = builder.parameter("recipient", ParamType::String, Some(json!("World")))?;
    let hello = builder.task(&say_hello, [("name", recipient)])?;
    builder.output("Output", hello.output()?)?;
    builder.build()
}

pub fn load_data() -> PipedefResult<Arc<Component>> {
    Component::declare(
        ComponentConfig::new("load_data")
            .output("features", ParamType::list(ParamType::list(ParamType::Float)))
            .output("labels", ParamType::list(ParamType::Integer))
            .base_image("python:3.8-slim")
            .packages(["pandas", "scikit-learn"])
            .command(["python3", "-c", LOAD_DATA_SCRIPT])
            .args(["{{outputs.features}}", "{{outputs.labels}}"]),
    )
}

pub fn train_model() -> PipedefResult<Arc<Component>> {
    Component::declare(
        ComponentConfig::new("train_model")
            .input("features", ParamType::list(ParamType::list(ParamType::Float)))
            .input("labels", ParamType::list(ParamType::Integer))
            .output("accuracy", ParamType::Float)
            .base_image("python:3.8-slim")
            .packages(["scikit-learn"])
            .command(["python3", "-c", TRAIN_MODEL_SCRIPT])
            .args(["{{inputs.features}}", "{{inputs.labels}}", "{{outputs.accuracy}}"]),
    )
}

/// Two-step training pipeline passing data as parameters
pub fn iris_pipeline() -> PipedefResult<Pipeline> {
    let load_data = load_data()?;
    let train_model = train_model()?;

    let mut builder = PipelineBuilder::new(
        PipelineConfig::new("iris-no-artifacts-pipeline")
            .description("ML pipeline without file artifacts, returns accuracy."),
    );
    let data = builder.task(&load_data, [])?;
    builder.task(
        &train_model,
        [
            ("features", data.outputs("features")?),
            ("labels", data.outputs("labels")?),
        ],
    )?;
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::pipeline::{Binding, DataEdge, PipelineValidator};

    #[test]
    fn test_hello_pipeline_shape() {
        let pipeline = hello_pipeline().unwrap();

        assert_eq!(pipeline.task_ids(), vec!["say-hello"]);
        assert!(pipeline.edges().is_empty());
        assert_eq!(pipeline.tasks[0].component.outputs().len(), 1);
        assert_eq!(
            pipeline.outputs["Output"],
            Binding::TaskOutput {
                task: "say-hello".into(),
                output: "Output".into(),
            }
        );
        assert_eq!(pipeline.parameter_defaults()["recipient"], &json!("World"));
    }

    #[test]
    fn test_iris_pipeline_edges() {
        let pipeline = iris_pipeline().unwrap();

        assert_eq!(pipeline.task_ids(), vec!["load-data", "train-model"]);
        let edges = pipeline.edges();
        assert_eq!(edges.len(), 2);
        assert!(edges.contains(&DataEdge {
            source_task: "load-data".into(),
            source_output: "features".into(),
            target_task: "train-model".into(),
            target_input: "features".into(),
        }));
    }

    #[test]
    fn test_samples_validate_cleanly() {
        let hello = PipelineValidator::validate(&hello_pipeline().unwrap());
        assert!(hello.is_valid());
        assert!(!hello.has_warnings());

        let iris = PipelineValidator::validate(&iris_pipeline().unwrap());
        assert!(iris.is_valid());
        assert!(iris.warnings.iter().any(|w| w.contains("'accuracy'")));
    }

    #[test]
    fn test_iris_compiles() {
        let compiled = Compiler::new().compile(&iris_pipeline().unwrap()).unwrap();
        let spec = compiled.spec();

        assert_eq!(spec.pipeline_info.name, "iris-no-artifacts-pipeline");
        assert_eq!(spec.root.dag.tasks["train-model"].dependent_tasks, vec!["load-data"]);
        assert!(spec.root.input_definitions.is_none());
        assert_eq!(
            spec.deployment_spec.executors["exec-load-data"].container.image,
            "python:3.8-slim"
        );
    }
}
