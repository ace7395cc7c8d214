//! Task DAG (Directed Acyclic Graph) for dependency management.
//!
//! Nodes own the task instances and their execution records. An edge
//! `a -> b` means `b` requires the output of `a`.

use crate::core::task::{Task, TaskId, TaskRecord};
use crate::error::{Error, Result};
use crate::flog_debug;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A task together with its record in this run.
#[derive(Debug)]
pub struct TaskNode {
    pub task: Box<dyn Task>,
    pub record: TaskRecord,
}

impl TaskNode {
    pub fn id(&self) -> &TaskId {
        &self.record.id
    }
}

/// The task dependency graph.
pub struct TaskDAG {
    graph: DiGraph<TaskNode, ()>,
    task_index: HashMap<TaskId, NodeIndex>,
}

impl TaskDAG {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            task_index: HashMap::new(),
        }
    }

    /// Build the graph reachable from `root` through `requires()`.
    ///
    /// Completion is checked once per task while walking. A task whose output
    /// already exists is recorded as done and its requirements are not
    /// expanded.
    pub fn build(root: Box<dyn Task>) -> Result<Self> {
        let mut dag = Self::new();
        dag.visit(root)?;
        flog_debug!(
            "TaskDAG::build tasks={} dependencies={}",
            dag.task_count(),
            dag.dependency_count()
        );
        Ok(dag)
    }

    fn visit(&mut self, task: Box<dyn Task>) -> Result<TaskId> {
        let id = task.id();
        if self.contains_task(&id) {
            return Ok(id);
        }

        let complete = task.complete();
        let requirements = if complete { Vec::new() } else { task.requires() };
        self.add_task(task);
        if complete {
            if let Some(node) = self.get_task_mut(&id) {
                node.record.mark_done();
            }
        }

        for requirement in requirements {
            let dep_id = self.visit(requirement)?;
            self.add_dependency(&dep_id, &id)?;
        }
        Ok(id)
    }

    /// Add a task to the DAG.
    ///
    /// If a task with the same id already exists, the new instance is dropped
    /// and the existing NodeIndex is returned.
    pub fn add_task(&mut self, task: Box<dyn Task>) -> NodeIndex {
        let id = task.id();
        if let Some(&index) = self.task_index.get(&id) {
            return index;
        }

        let index = self.graph.add_node(TaskNode {
            task,
            record: TaskRecord::new(id.clone()),
        });
        self.task_index.insert(id, index);
        index
    }

    /// Record that `to` requires `from`.
    ///
    /// # Errors
    /// Returns an error if either task is not in the DAG, or if the edge
    /// would create a cycle.
    pub fn add_dependency(&mut self, from: &TaskId, to: &TaskId) -> Result<()> {
        let from_index = self
            .task_index
            .get(from)
            .ok_or_else(|| Error::Validation(format!("Task {} not found in DAG", from)))?;

        let to_index = self
            .task_index
            .get(to)
            .ok_or_else(|| Error::Validation(format!("Task {} not found in DAG", to)))?;

        if self.graph.find_edge(*from_index, *to_index).is_some() {
            return Ok(());
        }

        let edge = self.graph.add_edge(*from_index, *to_index, ());
        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(Error::Validation(format!(
                "Adding dependency from {} to {} would create a cycle",
                from, to
            )));
        }

        Ok(())
    }

    pub fn get_task(&self, id: &TaskId) -> Option<&TaskNode> {
        self.task_index
            .get(id)
            .and_then(|&index| self.graph.node_weight(index))
    }

    pub fn get_task_mut(&mut self, id: &TaskId) -> Option<&mut TaskNode> {
        let index = *self.task_index.get(id)?;
        self.graph.node_weight_mut(index)
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains_task(&self, id: &TaskId) -> bool {
        self.task_index.contains_key(id)
    }

    pub fn has_dependency(&self, from: &TaskId, to: &TaskId) -> bool {
        match (self.task_index.get(from), self.task_index.get(to)) {
            (Some(&from_idx), Some(&to_idx)) => self.graph.find_edge(from_idx, to_idx).is_some(),
            _ => false,
        }
    }

    /// Tasks that `id` requires.
    pub fn get_dependencies(&self, id: &TaskId) -> Vec<&TaskNode> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Tasks that require `id`.
    pub fn get_dependents(&self, id: &TaskId) -> Vec<&TaskNode> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &TaskId, direction: Direction) -> Vec<&TaskNode> {
        match self.task_index.get(id) {
            Some(&index) => self
                .graph
                .neighbors_directed(index, direction)
                .filter_map(|neighbor| self.graph.node_weight(neighbor))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Pending tasks whose dependencies are all in `satisfied`, in insertion order.
    pub fn ready_tasks<'a>(&'a self, satisfied: &HashSet<TaskId>) -> Vec<&'a TaskNode> {
        self.graph
            .node_indices()
            .filter_map(|index| {
                let node = self.graph.node_weight(index)?;
                if !node.record.is_pending() || satisfied.contains(node.id()) {
                    return None;
                }
                let deps_satisfied = self
                    .graph
                    .neighbors_directed(index, Direction::Incoming)
                    .all(|dep| {
                        self.graph
                            .node_weight(dep)
                            .map(|d| satisfied.contains(d.id()))
                            .unwrap_or(false)
                    });
                deps_satisfied.then_some(node)
            })
            .collect()
    }

    /// Nodes ordered so every task comes after all of its dependencies.
    pub fn topological_order(&self) -> Result<Vec<&TaskNode>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            let name = self
                .graph
                .node_weight(cycle.node_id())
                .map(|n| n.id().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Error::Validation(format!("Cycle detected at task: {}", name))
        })?;

        Ok(sorted
            .into_iter()
            .filter_map(|index| self.graph.node_weight(index))
            .collect())
    }

    /// Records of all nodes in topological order.
    pub fn records(&self) -> Result<Vec<TaskRecord>> {
        Ok(self
            .topological_order()?
            .into_iter()
            .map(|node| node.record.clone())
            .collect())
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut TaskNode> {
        self.graph.node_weights_mut()
    }
}

impl Default for TaskDAG {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskDAG {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDAG")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}
