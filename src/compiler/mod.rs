// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Workflow compiler
//!
//! Turns a composed [`Pipeline`] into a serialized workflow description.
//! Compilation is deterministic: the same pipeline always produces
//! byte-identical YAML.

mod digest;
mod spec;

pub use digest::{hash_file, hash_string};
pub use spec::*;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::component::{render, Component, InputSpec};
use crate::errors::{PipedefError, PipedefResult};
use crate::pipeline::{Binding, Pipeline, Task};

/// Version of the compiled workflow schema
pub const SCHEMA_VERSION: &str = "2.1.0";

/// A compiled workflow, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWorkflow {
    spec: WorkflowSpec,
}

impl CompiledWorkflow {
    pub fn spec(&self) -> &WorkflowSpec {
        &self.spec
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> PipedefResult<String> {
        serde_yaml::to_string(&self.spec).map_err(Into::into)
    }

    /// BLAKE3 digest of the YAML form
    pub fn digest(&self) -> PipedefResult<String> {
        Ok(hash_string(&self.to_yaml()?))
    }
}

/// What happened when a workflow was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The file already held identical content
    Unchanged,
}

/// Pipeline compiler
#[derive(Debug, Clone)]
pub struct Compiler {
    sdk_version: String,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            sdk_version: format!("pipedef-{}", crate::VERSION),
        }
    }

    /// Compile a pipeline into a workflow description
    pub fn compile(&self, pipeline: &Pipeline) -> PipedefResult<CompiledWorkflow> {
        for task in &pipeline.tasks {
            if let Some(input) = task.unresolved_inputs().first() {
                return Err(PipedefError::MissingDependency {
                    task: task.id.clone(),
                    input: input.to_string(),
                });
            }
        }

        let keys = ComponentKeys::assign(pipeline);

        let mut components = BTreeMap::new();
        let mut executors = BTreeMap::new();
        for (component, key) in &keys.entries {
            let executor_label = format!("exec-{}", key);
            components.insert(
                format!("comp-{}", key),
                ComponentSpec {
                    input_definitions: component_inputs(component.inputs()),
                    output_definitions: output_definitions(
                        component.outputs().iter().map(|o| (o.name.clone(), &o.ty)),
                    ),
                    executor_label: executor_label.clone(),
                },
            );
            executors.insert(executor_label, ExecutorSpec {
                container: container_spec(component),
            });
        }

        let mut tasks = BTreeMap::new();
        for task in &pipeline.tasks {
            tasks.insert(task.id.clone(), task_spec(task, keys.key_of(&task.component))?);
        }

        let root = RootSpec {
            input_definitions: (!pipeline.parameters.is_empty()).then(|| InputDefinitions {
                parameters: pipeline
                    .parameters
                    .iter()
                    .map(|p| {
                        (
                            p.name.clone(),
                            InputParameterSpec {
                                parameter_type: p.ty.kind(),
                                default_value: p.default.clone(),
                                is_optional: p.default.is_some(),
                            },
                        )
                    })
                    .collect(),
            }),
            output_definitions: pipeline_outputs(pipeline)?,
            dag: DagSpec {
                tasks,
                outputs: dag_outputs(pipeline)?,
            },
        };

        let spec = WorkflowSpec {
            pipeline_info: PipelineInfo {
                name: pipeline.name.clone(),
                description: pipeline.description.clone(),
            },
            schema_version: SCHEMA_VERSION.to_string(),
            sdk_version: self.sdk_version.clone(),
            root,
            components,
            deployment_spec: DeploymentSpec { executors },
        };

        info!(
            pipeline = %pipeline.name,
            tasks = pipeline.tasks.len(),
            components = keys.entries.len(),
            "Compiled pipeline"
        );

        Ok(CompiledWorkflow { spec })
    }

    /// Compile a pipeline and write it to `path`.
    ///
    /// An existing file with identical content is left untouched.
    pub fn compile_to_file(&self, pipeline: &Pipeline, path: &Path) -> PipedefResult<WriteOutcome> {
        let yaml = self.compile(pipeline)?.to_yaml()?;

        if path.exists() && hash_file(path)? == hash_string(&yaml) {
            info!(path = %path.display(), "Compiled workflow unchanged");
            return Ok(WriteOutcome::Unchanged);
        }

        let write_error = |e: std::io::Error| PipedefError::FileWriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, yaml).map_err(write_error)?;

        info!(path = %path.display(), "Wrote compiled workflow");
        Ok(WriteOutcome::Written)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable component keys; a key already taken gets a numeric suffix
struct ComponentKeys<'a> {
    entries: Vec<(&'a Arc<Component>, String)>,
}

impl<'a> ComponentKeys<'a> {
    fn assign(pipeline: &'a Pipeline) -> Self {
        let mut entries: Vec<(&'a Arc<Component>, String)> = Vec::new();

        for task in &pipeline.tasks {
            let component = &task.component;
            if entries.iter().any(|(c, _)| Arc::ptr_eq(c, component) || ***c == **component) {
                continue;
            }

            let stem = component.task_stem();
            let mut n = 1;
            let key = loop {
                let candidate = if n == 1 {
                    stem.clone()
                } else {
                    format!("{}-{}", stem, n)
                };
                if !entries.iter().any(|(_, key)| *key == candidate) {
                    break candidate;
                }
                n += 1;
            };
            entries.push((component, key));
        }

        Self { entries }
    }

    fn key_of(&self, component: &Arc<Component>) -> &str {
        self.entries
            .iter()
            .find(|(c, _)| Arc::ptr_eq(c, component) || ***c == **component)
            .map(|(_, key)| key.as_str())
            .unwrap_or_default()
    }
}

fn component_inputs(inputs: &[InputSpec]) -> Option<InputDefinitions> {
    if inputs.is_empty() {
        return None;
    }

    Some(InputDefinitions {
        parameters: inputs
            .iter()
            .map(|i| {
                (
                    i.name.clone(),
                    InputParameterSpec {
                        parameter_type: i.ty.kind(),
                        default_value: i.default.clone(),
                        is_optional: i.default.is_some(),
                    },
                )
            })
            .collect(),
    })
}

fn output_definitions<'t>(
    outputs: impl Iterator<Item = (String, &'t crate::types::ParamType)>,
) -> Option<OutputDefinitions> {
    let parameters: BTreeMap<_, _> = outputs
        .map(|(name, ty)| {
            (
                name,
                OutputParameterSpec {
                    parameter_type: ty.kind(),
                },
            )
        })
        .collect();

    (!parameters.is_empty()).then_some(OutputDefinitions { parameters })
}

/// Container for a component; packages are installed before the command
fn container_spec(component: &Component) -> ContainerSpec {
    let env = component.environment();
    let mut command: Vec<String> = component.command().iter().map(|c| render(c)).collect();

    if !env.packages_to_install.is_empty() {
        let packages = env
            .packages_to_install
            .iter()
            .map(|p| format!("'{}'", p))
            .collect::<Vec<_>>()
            .join(" ");
        let mut script = format!(
            "PIP_DISABLE_PIP_VERSION_CHECK=1 python3 -m pip install --quiet --no-warn-script-location {}",
            packages
        );
        if !command.is_empty() {
            script.push_str(" && \"$0\" \"$@\"");
        }
        script.push('\n');

        let mut wrapped = vec!["sh".to_string(), "-c".to_string(), script];
        wrapped.append(&mut command);
        command = wrapped;
    }

    ContainerSpec {
        image: env.base_image.clone(),
        command,
        args: component.args().iter().map(|a| render(a)).collect(),
    }
}

fn task_spec(task: &Task, component_key: &str) -> PipedefResult<TaskSpec> {
    let parameters: BTreeMap<String, TaskInputParameter> = task
        .arguments
        .iter()
        .map(|(input, binding)| {
            let parameter = match binding {
                Binding::Constant(value) => TaskInputParameter {
                    runtime_value: Some(RuntimeValue {
                        constant: value.clone(),
                    }),
                    ..Default::default()
                },
                Binding::Parameter(name) => TaskInputParameter {
                    component_input_parameter: Some(name.clone()),
                    ..Default::default()
                },
                Binding::TaskOutput { task, output } => TaskInputParameter {
                    task_output_parameter: Some(TaskOutputParameter {
                        producer_task: task.clone(),
                        output_parameter_key: output.clone(),
                    }),
                    ..Default::default()
                },
            };
            (input.clone(), parameter)
        })
        .collect();

    Ok(TaskSpec {
        component_ref: ComponentRef {
            name: format!("comp-{}", component_key),
        },
        task_info: TaskInfo {
            name: task.id.clone(),
        },
        inputs: (!parameters.is_empty()).then_some(TaskInputs { parameters }),
        dependent_tasks: task.dependencies().into_iter().map(String::from).collect(),
    })
}

fn output_source<'p>(name: &str, binding: &'p Binding) -> PipedefResult<(&'p str, &'p str)> {
    match binding {
        Binding::TaskOutput { task, output } => Ok((task, output)),
        _ => Err(PipedefError::invalid_pipeline(format!(
            "pipeline output '{}' must come from a task output",
            name
        ))),
    }
}

fn pipeline_outputs(pipeline: &Pipeline) -> PipedefResult<Option<OutputDefinitions>> {
    let mut outputs = Vec::new();
    for (name, binding) in &pipeline.outputs {
        output_source(name, binding)?;
        let ty = pipeline
            .binding_type(binding)
            .ok_or_else(|| PipedefError::invalid_pipeline(format!(
                "pipeline output '{}' refers to an unknown task output",
                name
            )))?;
        outputs.push((name.clone(), ty));
    }

    Ok(output_definitions(outputs.iter().map(|(n, t)| (n.clone(), t))))
}

fn dag_outputs(pipeline: &Pipeline) -> PipedefResult<Option<DagOutputs>> {
    let mut parameters = BTreeMap::new();
    for (name, binding) in &pipeline.outputs {
        let (task, output) = output_source(name, binding)?;
        parameters.insert(
            name.clone(),
            DagOutputParameter {
                value_from_parameter: OutputParameterSelector {
                    producer_subtask: task.to_string(),
                    output_parameter_key: output.to_string(),
                },
            },
        );
    }

    Ok((!parameters.is_empty()).then_some(DagOutputs { parameters }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentConfig;
    use crate::pipeline::{Argument, PipelineBuilder, PipelineConfig};
    use crate::types::{ParamType, ParameterKind};
    use serde_json::json;

    fn hello_pipeline() -> Pipeline {
        let say_hello = Component::declare(
            ComponentConfig::new("say_hello")
                .input("name", ParamType::String)
                .single_output(ParamType::String)
                .command(["sh", "-c", "echo \"Hello, $0!\" | tee \"$1\""])
                .args(["{{inputs.name}}", "{{outputs.Output}}"]),
        )
        .unwrap();

        let mut builder = PipelineBuilder::new(
            PipelineConfig::new("hello-world-pipeline")
                .description("A basic pipeline that prints a greeting."),
        );
        let recipient = builder
            .parameter("recipient", ParamType::String, Some(json!("World")))
            .unwrap();
        let task = builder.task(&say_hello, [("name", recipient)]).unwrap();
        builder.output("Output", task.output().unwrap()).unwrap();
        builder.build().unwrap()
    }

    fn chain_pipeline() -> Pipeline {
        let produce = Component::declare(
            ComponentConfig::new("produce")
                .single_output(ParamType::list(ParamType::Float))
                .base_image("python:3.8-slim")
                .packages(["numpy"])
                .command(["python3", "-m", "produce"]),
        )
        .unwrap();
        let consume = Component::declare(
            ComponentConfig::new("consume")
                .input("values", ParamType::list(ParamType::Float))
                .input_with_default("scale", ParamType::Float, json!(1.0))
                .single_output(ParamType::Float),
        )
        .unwrap();

        let mut builder = PipelineBuilder::new(PipelineConfig::new("chain"));
        let a = builder.task(&produce, []).unwrap();
        builder.task(&consume, [("values", a.output().unwrap())]).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_compile_is_deterministic() {
        let compiler = Compiler::new();
        let first = compiler.compile(&hello_pipeline()).unwrap().to_yaml().unwrap();
        let second = compiler.compile(&hello_pipeline()).unwrap().to_yaml().unwrap();
        assert_eq!(first, second);

        let chain1 = compiler.compile(&chain_pipeline()).unwrap();
        let chain2 = compiler.compile(&chain_pipeline()).unwrap();
        assert_eq!(chain1.digest().unwrap(), chain2.digest().unwrap());
    }

    #[test]
    fn test_single_node_single_output() {
        let compiled = Compiler::new().compile(&hello_pipeline()).unwrap();
        let spec = compiled.spec();

        assert_eq!(spec.root.dag.tasks.len(), 1);
        let task = &spec.root.dag.tasks["say-hello"];
        assert_eq!(task.component_ref.name, "comp-say-hello");
        assert!(task.dependent_tasks.is_empty());

        let component = &spec.components["comp-say-hello"];
        let outputs = component.output_definitions.as_ref().unwrap();
        assert_eq!(outputs.parameters.len(), 1);
        assert_eq!(outputs.parameters["Output"].parameter_type, ParameterKind::String);
    }

    #[test]
    fn test_parameter_default_serialized() {
        let yaml = Compiler::new()
            .compile(&hello_pipeline())
            .unwrap()
            .to_yaml()
            .unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        let recipient = &doc["root"]["inputDefinitions"]["parameters"]["recipient"];
        assert_eq!(recipient["defaultValue"], serde_yaml::Value::from("World"));
        assert_eq!(recipient["parameterType"], serde_yaml::Value::from("STRING"));
        assert_eq!(
            doc["pipelineInfo"]["name"],
            serde_yaml::Value::from("hello-world-pipeline")
        );
    }

    #[test]
    fn test_edge_compiled_once() {
        let compiled = Compiler::new().compile(&chain_pipeline()).unwrap();
        let consume = &compiled.spec().root.dag.tasks["consume"];

        assert_eq!(consume.dependent_tasks, vec!["produce"]);
        let inputs = &consume.inputs.as_ref().unwrap().parameters;
        assert_eq!(inputs.len(), 1);
        assert_eq!(
            inputs["values"].task_output_parameter,
            Some(TaskOutputParameter {
                producer_task: "produce".into(),
                output_parameter_key: "Output".into(),
            })
        );
    }

    #[test]
    fn test_environment_in_executor() {
        let compiled = Compiler::new().compile(&chain_pipeline()).unwrap();
        let executors = &compiled.spec().deployment_spec.executors;

        let produce = &executors["exec-produce"].container;
        assert_eq!(produce.image, "python:3.8-slim");
        assert_eq!(produce.command[0], "sh");
        assert!(produce.command[2].contains("'numpy'"));
        assert!(produce.command[2].contains("\"$0\" \"$@\""));
        assert_eq!(&produce.command[3..], ["python3", "-m", "produce"]);

        let consume = &executors["exec-consume"].container;
        assert_eq!(consume.image, crate::component::DEFAULT_BASE_IMAGE);
        assert!(consume.command.is_empty());
    }

    #[test]
    fn test_placeholders_rendered() {
        let compiled = Compiler::new().compile(&hello_pipeline()).unwrap();
        let container = &compiled.spec().deployment_spec.executors["exec-say-hello"].container;
        assert_eq!(
            container.args,
            vec![
                "{{$.inputs.parameters['name']}}".to_string(),
                "{{$.outputs.parameters['Output'].output_file}}".to_string(),
            ]
        );
    }

    #[test]
    fn test_optional_component_input() {
        let compiled = Compiler::new().compile(&chain_pipeline()).unwrap();
        let inputs = compiled.spec().components["comp-consume"]
            .input_definitions
            .as_ref()
            .unwrap();
        assert!(inputs.parameters["scale"].is_optional);
        assert_eq!(inputs.parameters["scale"].default_value, Some(json!(1.0)));
        assert!(!inputs.parameters["values"].is_optional);
    }

    #[test]
    fn test_missing_dependency() {
        let echo = Component::declare(ComponentConfig::new("echo").input("text", ParamType::String)).unwrap();
        let mut builder = PipelineBuilder::new(PipelineConfig::new("missing"));
        builder.task(&echo, []).unwrap();
        let pipeline = builder.build().unwrap();

        let result = Compiler::new().compile(&pipeline);
        assert!(matches!(result, Err(PipedefError::MissingDependency { .. })));
    }

    #[test]
    fn test_distinct_components_sharing_a_name() {
        let v1 = Component::declare(ComponentConfig::new("step").single_output(ParamType::String)).unwrap();
        let v2 = Component::declare(
            ComponentConfig::new("step")
                .input("text", ParamType::String)
                .single_output(ParamType::String),
        )
        .unwrap();

        let mut builder = PipelineBuilder::new(PipelineConfig::new("shared"));
        let first = builder.task(&v1, []).unwrap();
        builder.task(&v2, [("text", first.output().unwrap())]).unwrap();
        let compiled = Compiler::new().compile(&builder.build().unwrap()).unwrap();

        let keys: Vec<_> = compiled.spec().components.keys().cloned().collect();
        assert_eq!(keys, vec!["comp-step", "comp-step-2"]);
        assert_eq!(compiled.spec().root.dag.tasks["step-2"].component_ref.name, "comp-step-2");
    }

    #[test]
    fn test_compile_to_file_is_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("hello_pipeline.yaml");
        let compiler = Compiler::new();

        let first = compiler.compile_to_file(&hello_pipeline(), &path).unwrap();
        let second = compiler.compile_to_file(&hello_pipeline(), &path).unwrap();

        assert_eq!(first, WriteOutcome::Written);
        assert_eq!(second, WriteOutcome::Unchanged);

        let written = std::fs::read_to_string(&path).unwrap();
        let expected = compiler.compile(&hello_pipeline()).unwrap().to_yaml().unwrap();
        assert_eq!(written, expected);
    }

    #[test]
    fn test_reused_component_compiled_once() {
        let echo = Component::declare(
            ComponentConfig::new("echo")
                .input("text", ParamType::String)
                .single_output(ParamType::String),
        )
        .unwrap();
        let mut builder = PipelineBuilder::new(PipelineConfig::new("twice"));
        let a = builder.task(&echo, [("text", Argument::constant("hi"))]).unwrap();
        builder.task(&echo, [("text", a.output().unwrap())]).unwrap();

        let compiled = Compiler::new().compile(&builder.build().unwrap()).unwrap();
        assert_eq!(compiled.spec().components.len(), 1);
        assert_eq!(compiled.spec().root.dag.tasks.len(), 2);
        assert_eq!(
            compiled.spec().root.dag.tasks["echo"].inputs.as_ref().unwrap().parameters["text"]
                .runtime_value,
            Some(RuntimeValue { constant: json!("hi") })
        );
    }

    #[test]
    fn test_suffixed_key_never_collides() {
        let upper = Component::declare(ComponentConfig::new("Step").single_output(ParamType::String)).unwrap();
        let lower = Component::declare(
            ComponentConfig::new("step")
                .input("text", ParamType::String)
                .single_output(ParamType::String),
        )
        .unwrap();
        let numbered = Component::declare(
            ComponentConfig::new("step_2")
                .input("count", ParamType::Integer)
                .single_output(ParamType::String),
        )
        .unwrap();

        let mut builder = PipelineBuilder::new(PipelineConfig::new("stems"));
        builder.task_named("a", &upper, []).unwrap();
        builder
            .task_named("b", &lower, [("text", Argument::constant("hi"))])
            .unwrap();
        builder
            .task_named("c", &numbered, [("count", Argument::constant(2))])
            .unwrap();
        let compiled = Compiler::new().compile(&builder.build().unwrap()).unwrap();
        let spec = compiled.spec();

        assert_eq!(spec.components.len(), 3);
        assert_eq!(spec.deployment_spec.executors.len(), 3);

        let inputs_of = |task: &str| -> Vec<String> {
            let key = &spec.root.dag.tasks[task].component_ref.name;
            spec.components[key]
                .input_definitions
                .as_ref()
                .map(|d| d.parameters.keys().cloned().collect())
                .unwrap_or_default()
        };
        assert!(inputs_of("a").is_empty());
        assert_eq!(inputs_of("b"), vec!["text"]);
        assert_eq!(inputs_of("c"), vec!["count"]);
        assert_ne!(
            spec.root.dag.tasks["b"].component_ref.name,
            spec.root.dag.tasks["c"].component_ref.name
        );
    }
}
