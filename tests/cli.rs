// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn pipedef(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pipedef").unwrap();
    cmd.current_dir(dir)
        .env_remove("PIPEDEF_CONFIG")
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "pipedef=warn");
    cmd
}

const CYCLIC: &str = r#"
name: cyclic
components:
  - name: echo
    inputs:
      - name: text
        type: str
    outputs:
      - name: Output
        type: str
tasks:
  - name: a
    component: echo
    arguments:
      text: { task: b }
  - name: b
    component: echo
    arguments:
      text: { task: a }
"#;

const MISMATCH: &str = r#"
name: mismatch
components:
  - name: count
    outputs:
      - name: Output
        type: int
  - name: shout
    inputs:
      - name: text
        type: str
tasks:
  - name: count
    component: count
  - name: shout
    component: shout
    arguments:
      text: { task: count }
"#;

#[test]
fn init_then_compile_hello() {
    let dir = tempfile::tempdir().unwrap();

    pipedef(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created pipeline.yaml"));

    pipedef(dir.path())
        .args(["compile", "pipeline.yaml", "-o", "hello_pipeline.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("written"));

    let compiled = std::fs::read_to_string(dir.path().join("hello_pipeline.yaml")).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&compiled).unwrap();
    assert_eq!(
        doc["root"]["inputDefinitions"]["parameters"]["recipient"]["defaultValue"],
        serde_yaml::Value::from("World")
    );

    pipedef(dir.path())
        .args(["compile", "pipeline.yaml", "-o", "hello_pipeline.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pipeline.yaml"), "name: mine\n").unwrap();

    pipedef(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn validate_iris_sample() {
    let dir = tempfile::tempdir().unwrap();
    pipedef(dir.path())
        .args(["init", "--template", "iris", "-o", "iris.yaml"])
        .assert()
        .success();

    pipedef(dir.path())
        .args(["validate", "iris.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("output 'accuracy' is never consumed"));
}

#[test]
fn graph_mermaid() {
    let dir = tempfile::tempdir().unwrap();
    pipedef(dir.path())
        .args(["init", "-t", "iris"])
        .assert()
        .success();

    pipedef(dir.path())
        .args(["graph", "--format", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("load-data --> train-model"));
}

#[test]
fn args_resolves_overrides() {
    let dir = tempfile::tempdir().unwrap();
    pipedef(dir.path()).arg("init").assert().success();

    pipedef(dir.path())
        .arg("args")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"recipient\": \"World\""));

    pipedef(dir.path())
        .args(["args", "--set", "recipient=Ada"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"recipient\": \"Ada\""));

    pipedef(dir.path())
        .args(["args", "--set", "recipient=3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Type mismatch"));

    pipedef(dir.path())
        .args(["args", "--set", "nobody=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no parameter named 'nobody'"));
}

#[test]
fn compile_rejects_cycles() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cyclic.yaml"), CYCLIC).unwrap();

    pipedef(dir.path())
        .args(["compile", "cyclic.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency"));
    assert!(!dir.path().join("cyclic.compiled.yaml").exists());
}

#[test]
fn compile_rejects_type_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("mismatch.yaml"), MISMATCH).unwrap();

    pipedef(dir.path())
        .args(["compile", "mismatch.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Type mismatch"));
    assert!(!dir.path().join("mismatch.compiled.yaml").exists());
}

#[test]
fn compile_glob_into_configured_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pipedef.toml"), "output_dir = \"build\"\n").unwrap();
    pipedef(dir.path())
        .args(["init", "-o", "defs/hello.yaml"])
        .assert()
        .success();
    pipedef(dir.path())
        .args(["init", "-t", "iris", "-o", "defs/iris.yaml"])
        .assert()
        .success();

    pipedef(dir.path())
        .args(["compile", "defs/*.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled 2 pipeline(s)"));

    assert!(dir.path().join("build/hello.compiled.yaml").exists());
    assert!(dir.path().join("build/iris.compiled.yaml").exists());
}

#[test]
fn compile_without_matches() {
    let dir = tempfile::tempdir().unwrap();
    pipedef(dir.path())
        .args(["compile", "*.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No definition files matched"));
}

#[test]
fn compile_rejects_colliding_targets() {
    let dir = tempfile::tempdir().unwrap();
    pipedef(dir.path())
        .args(["init", "-o", "defs/a/hello.yaml"])
        .assert()
        .success();
    pipedef(dir.path())
        .args(["init", "-o", "defs/b/hello.yaml"])
        .assert()
        .success();

    pipedef(dir.path())
        .args(["compile", "defs/*/hello.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("both"));

    assert!(!dir.path().join("hello.compiled.yaml").exists());
}
