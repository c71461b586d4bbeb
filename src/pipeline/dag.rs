// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! DAG (Directed Acyclic Graph) of pipeline tasks
//!
//! Builds the task dependency graph from data-flow bindings and explicit
//! ordering constraints, detects cycles, and renders the graph.

use petgraph::algo::{has_path_connecting, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use crate::errors::PipedefError;
use crate::pipeline::{Binding, Pipeline};

/// Why one task runs after another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// The downstream task consumes an upstream output
    Data,
    /// Declared with `after` only
    Order,
}

/// Task dependency graph
pub struct TaskGraph {
    graph: DiGraph<usize, EdgeKind>,
    name_to_index: HashMap<String, NodeIndex>,
    index_to_name: HashMap<NodeIndex, String>,
}

impl TaskGraph {
    /// Build the graph of a pipeline, rejecting cycles
    pub fn build(pipeline: &Pipeline) -> Result<Self, PipedefError> {
        let mut dag = Self {
            graph: DiGraph::new(),
            name_to_index: HashMap::new(),
            index_to_name: HashMap::new(),
        };

        for (idx, task) in pipeline.tasks.iter().enumerate() {
            let node = dag.graph.add_node(idx);
            dag.name_to_index.insert(task.id.clone(), node);
            dag.index_to_name.insert(node, task.id.clone());
        }

        for task in &pipeline.tasks {
            let task_node = dag.name_to_index[&task.id];

            let data = task.arguments.values().filter_map(Binding::producer);
            for upstream in data {
                dag.add_edge(&task.id, upstream, task_node, EdgeKind::Data)?;
            }
            for upstream in &task.after {
                dag.add_edge(&task.id, upstream, task_node, EdgeKind::Order)?;
            }
        }

        dag.validate_acyclic()?;

        Ok(dag)
    }

    fn add_edge(
        &mut self,
        task: &str,
        upstream: &str,
        task_node: NodeIndex,
        kind: EdgeKind,
    ) -> Result<(), PipedefError> {
        let upstream_node = *self
            .name_to_index
            .get(upstream)
            .ok_or_else(|| PipedefError::UnknownTask {
                task: task.to_string(),
                dependency: upstream.to_string(),
            })?;

        match self.graph.find_edge(upstream_node, task_node) {
            // Data edges win over ordering-only edges
            Some(edge) if kind == EdgeKind::Data => self.graph[edge] = EdgeKind::Data,
            Some(_) => {}
            None => {
                self.graph.add_edge(upstream_node, task_node, kind);
            }
        }
        Ok(())
    }

    /// Validate that the graph is acyclic
    fn validate_acyclic(&self) -> Result<(), PipedefError> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(PipedefError::CircularDependency {
                tasks: self.find_cycle(cycle.node_id()),
            }),
        }
    }

    /// Find a closed path of tasks through a node known to sit on a cycle
    fn find_cycle(&self, start: NodeIndex) -> Vec<String> {
        let component = tarjan_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.contains(&start))
            .unwrap_or_else(|| vec![start]);

        // Shortest path back to start, staying inside the strongly connected component
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if !component.contains(&next) {
                    continue;
                }
                if next == start {
                    let mut path = vec![self.index_to_name[&start].clone()];
                    let mut cursor = node;
                    while cursor != start {
                        path.push(self.index_to_name[&cursor].clone());
                        cursor = parent[&cursor];
                    }
                    path.push(self.index_to_name[&start].clone());
                    let last = path.len() - 1;
                    path[1..last].reverse();
                    return path;
                }
                if let std::collections::hash_map::Entry::Vacant(e) = parent.entry(next) {
                    e.insert(node);
                    queue.push_back(next);
                }
            }
        }

        vec![self.index_to_name[&start].clone()]
    }

    /// Task indices in a stable topological order.
    ///
    /// Among ready tasks, the one declared first runs first, so the order
    /// is deterministic for a given pipeline.
    pub fn topological_order(&self) -> Vec<usize> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|n| (n, self.graph.neighbors_directed(n, Direction::Incoming).count()))
            .collect();

        let mut ready: BinaryHeap<Reverse<(usize, NodeIndex)>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| Reverse((self.graph[*node], *node)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((idx, node))) = ready.pop() {
            order.push(idx);
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse((self.graph[next], next)));
                    }
                }
            }
        }

        order
    }

    /// Task ids in stable topological order
    pub fn topological_order_names(&self, pipeline: &Pipeline) -> Vec<String> {
        self.topological_order()
            .into_iter()
            .map(|idx| pipeline.tasks[idx].id.clone())
            .collect()
    }

    /// Tasks that must run before the given task, sorted
    pub fn dependencies(&self, task: &str) -> Option<Vec<String>> {
        self.neighbors(task, Direction::Incoming)
    }

    /// Tasks that run after the given task, sorted
    pub fn dependents(&self, task: &str) -> Option<Vec<String>> {
        self.neighbors(task, Direction::Outgoing)
    }

    fn neighbors(&self, task: &str, direction: Direction) -> Option<Vec<String>> {
        let node = self.name_to_index.get(task)?;
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(*node, direction)
            .map(|n| self.index_to_name[&n].clone())
            .collect();
        names.sort();
        Some(names)
    }

    /// Check if task A depends (directly or transitively) on task B
    pub fn depends_on(&self, task_a: &str, task_b: &str) -> bool {
        let (Some(node_a), Some(node_b)) =
            (self.name_to_index.get(task_a), self.name_to_index.get(task_b))
        else {
            return false;
        };

        has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    /// Edges as (upstream, downstream, kind), sorted
    fn sorted_edges(&self) -> Vec<(&str, &str, EdgeKind)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_indices()
            .filter_map(|edge| {
                let (from, to) = self.graph.edge_endpoints(edge)?;
                Some((
                    self.index_to_name[&from].as_str(),
                    self.index_to_name[&to].as_str(),
                    self.graph[edge],
                ))
            })
            .collect();
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        edges
    }

    fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.name_to_index.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// Generate Mermaid diagram of the DAG
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for name in self.sorted_names() {
            out.push_str(&format!("    {}[{}]\n", name, name));
        }

        for (from, to, kind) in self.sorted_edges() {
            let arrow = match kind {
                EdgeKind::Data => "-->",
                EdgeKind::Order => "-.->",
            };
            out.push_str(&format!("    {} {} {}\n", from, arrow, to));
        }

        out
    }

    /// Generate DOT diagram of the DAG
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box];\n");

        for (from, to, kind) in self.sorted_edges() {
            match kind {
                EdgeKind::Data => out.push_str(&format!("    \"{}\" -> \"{}\";\n", from, to)),
                EdgeKind::Order => out.push_str(&format!(
                    "    \"{}\" -> \"{}\" [style=dashed];\n",
                    from, to
                )),
            }
        }

        for name in self.sorted_names() {
            let node = self.name_to_index[name];
            if self.graph.neighbors_undirected(node).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", name));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of execution order
    pub fn to_text(&self, pipeline: &Pipeline) -> String {
        let mut out = String::new();

        for (i, idx) in self.topological_order().into_iter().enumerate() {
            let task = &pipeline.tasks[idx];
            let deps = self.dependencies(&task.id).unwrap_or_default();

            out.push_str(&format!("{}. {} ({})", i + 1, task.id, task.component.name()));

            if !deps.is_empty() {
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }

            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentConfig};
    use crate::pipeline::Task;
    use crate::types::ParamType;
    use std::collections::BTreeMap;

    fn make_test_pipeline(tasks: Vec<(&str, Vec<&str>)>) -> Pipeline {
        let component = Component::declare(
            ComponentConfig::new("step")
                .input("x", ParamType::String)
                .single_output(ParamType::String),
        )
        .unwrap();

        Pipeline {
            name: "test".into(),
            description: None,
            parameters: vec![],
            tasks: tasks
                .into_iter()
                .map(|(id, deps)| {
                    let mut arguments = BTreeMap::new();
                    if let Some(first) = deps.first() {
                        arguments.insert(
                            "x".to_string(),
                            Binding::TaskOutput {
                                task: first.to_string(),
                                output: "Output".into(),
                            },
                        );
                    }
                    Task {
                        id: id.into(),
                        component: component.clone(),
                        arguments,
                        after: deps.iter().skip(1).map(|d| d.to_string()).collect(),
                    }
                })
                .collect(),
            outputs: BTreeMap::new(),
        }
    }

    #[test]
    fn test_linear_dag() {
        let pipeline = make_test_pipeline(vec![("a", vec![]), ("b", vec!["a"]), ("c", vec!["b"])]);

        let dag = TaskGraph::build(&pipeline).unwrap();
        assert_eq!(dag.topological_order_names(&pipeline), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_diamond_dag_is_stable() {
        let pipeline = make_test_pipeline(vec![
            ("a", vec![]),
            ("c", vec!["a"]),
            ("b", vec!["a"]),
            ("d", vec!["b", "c"]),
        ]);

        let dag = TaskGraph::build(&pipeline).unwrap();
        // Ties break on declaration order
        assert_eq!(dag.topological_order_names(&pipeline), vec!["a", "c", "b", "d"]);
        assert_eq!(dag.dependencies("d").unwrap(), vec!["b", "c"]);
        assert_eq!(dag.dependents("a").unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn test_circular_dependency_detection() {
        let pipeline = make_test_pipeline(vec![("a", vec!["b"]), ("b", vec!["a"])]);

        match TaskGraph::build(&pipeline) {
            Err(PipedefError::CircularDependency { tasks }) => {
                assert_eq!(tasks.len(), 3);
                assert_eq!(tasks.first(), tasks.last());
            }
            _ => panic!("Expected CircularDependency"),
        }
    }

    #[test]
    fn test_self_dependency_detection() {
        let pipeline = make_test_pipeline(vec![("a", vec!["a"])]);

        let result = TaskGraph::build(&pipeline);
        assert!(matches!(result, Err(PipedefError::CircularDependency { .. })));
    }

    #[test]
    fn test_unknown_dependency() {
        let pipeline = make_test_pipeline(vec![("a", vec!["nonexistent"])]);

        let result = TaskGraph::build(&pipeline);
        assert!(matches!(result, Err(PipedefError::UnknownTask { .. })));
    }

    #[test]
    fn test_depends_on_check() {
        let pipeline = make_test_pipeline(vec![("a", vec![]), ("b", vec!["a"]), ("c", vec!["b"])]);

        let dag = TaskGraph::build(&pipeline).unwrap();

        assert!(dag.depends_on("c", "a")); // transitive
        assert!(dag.depends_on("c", "b")); // direct
        assert!(!dag.depends_on("a", "c")); // reverse
        assert!(!dag.depends_on("a", "missing"));
    }

    #[test]
    fn test_mermaid_output() {
        let pipeline = make_test_pipeline(vec![("a", vec![]), ("b", vec!["a"]), ("c", vec!["b", "a"])]);

        let dag = TaskGraph::build(&pipeline).unwrap();
        let mermaid = dag.to_mermaid();

        assert!(mermaid.contains("graph TD"));
        assert!(mermaid.contains("a --> b"));
        assert!(mermaid.contains("a -.-> c"));
    }

    #[test]
    fn test_dot_lists_isolated_nodes() {
        let pipeline = make_test_pipeline(vec![("solo", vec![])]);

        let dot = TaskGraph::build(&pipeline).unwrap().to_dot();
        assert!(dot.contains("\"solo\";"));
    }

    #[test]
    fn test_text_output() {
        let pipeline = make_test_pipeline(vec![("a", vec![]), ("b", vec!["a"])]);

        let text = TaskGraph::build(&pipeline).unwrap().to_text(&pipeline);
        assert_eq!(text, "1. a (step)\n2. b (step) [depends: a]\n");
    }
}
