//! Sequential scheduler.
//!
//! Builds the DAG from a root task, then runs one ready task at a time on
//! the calling thread. Tasks whose outputs already exist are never run. The
//! first failure halts the run and leaves the remaining tasks pending.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::{Task, TaskDAG, TaskId};
use crate::pipeline::{RunContext, RunSummary};
use crate::{flog, flog_debug, flog_error, Error, Result};

/// Events emitted as the run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Output already existed; the task is skipped.
    AlreadyDone { task_id: TaskId },
    TaskStarted { task_id: TaskId },
    TaskCompleted { task_id: TaskId },
    TaskFailed { task_id: TaskId, error: String },
    /// The run stopped with `remaining` tasks left unrun.
    Halted { remaining: usize },
}

/// One line of a dry-run plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub id: TaskId,
    pub complete: bool,
    /// Output paths not yet on disk.
    pub missing: Vec<PathBuf>,
    /// Direct requirements that are part of the graph.
    pub requires: Vec<TaskId>,
}

type Observer = Box<dyn FnMut(&SchedulerEvent)>;

pub struct Scheduler {
    ctx: RunContext,
    observer: Option<Observer>,
}

impl Scheduler {
    pub fn new(ctx: RunContext) -> Self {
        Self {
            ctx,
            observer: None,
        }
    }

    /// Receive every [`SchedulerEvent`] synchronously.
    pub fn with_observer(mut self, observer: impl FnMut(&SchedulerEvent) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn emit(&mut self, event: SchedulerEvent) {
        flog_debug!("SchedulerEvent: {:?}", event);
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    /// What a run of `root` would do, without running anything.
    pub fn plan(root: Box<dyn Task>) -> Result<Vec<PlanEntry>> {
        let dag = TaskDAG::build(root)?;
        let entries = dag
            .topological_order()?
            .into_iter()
            .map(|node| {
                let complete = node.record.is_satisfied();
                PlanEntry {
                    id: node.id().clone(),
                    complete,
                    missing: if complete {
                        Vec::new()
                    } else {
                        node.task.output().missing()
                    },
                    requires: dag
                        .get_dependencies(node.id())
                        .into_iter()
                        .map(|dep| dep.id().clone())
                        .collect(),
                }
            })
            .collect();
        Ok(entries)
    }

    /// Build the graph rooted at `root` and run everything incomplete.
    ///
    /// Graph construction errors are returned as `Err`. Task failures are
    /// recorded in the summary; check [`RunSummary::is_success`].
    pub fn run(&mut self, root: Box<dyn Task>) -> Result<RunSummary> {
        let root_id = root.id();
        flog!("Scheduling {}", root_id);
        let mut dag = TaskDAG::build(root)?;

        let mut satisfied = HashSet::new();
        for node in dag.topological_order()? {
            if node.record.is_satisfied() {
                satisfied.insert(node.id().clone());
                flog!("{} is already complete", node.id());
                self.emit(SchedulerEvent::AlreadyDone {
                    task_id: node.id().clone(),
                });
            }
        }

        let mut failed = None;
        loop {
            let next = dag
                .ready_tasks(&satisfied)
                .first()
                .map(|node| node.id().clone());
            let Some(id) = next else { break };

            match self.execute(&mut dag, &id) {
                Ok(()) => {
                    satisfied.insert(id);
                }
                Err(_) => {
                    failed = Some(id);
                    break;
                }
            }
        }

        if let Some(failed_id) = failed {
            let reason = format!("run halted after {} failed", failed_id);
            let mut remaining = 0;
            for node in dag.nodes_mut() {
                if node.record.is_pending() {
                    node.record.halt(&reason);
                    remaining += 1;
                }
            }
            flog_error!("{}; {} task(s) not run", reason, remaining);
            self.emit(SchedulerEvent::Halted { remaining });
        }

        Ok(RunSummary::new(root_id, dag.records()?))
    }

    fn execute(&mut self, dag: &mut TaskDAG, id: &TaskId) -> Result<()> {
        let not_found = || Error::Validation(format!("Task {} not found in DAG", id));

        let missing: Vec<String> = dag
            .get_task(id)
            .ok_or_else(not_found)?
            .task
            .requires()
            .iter()
            .filter(|requirement| !requirement.complete())
            .map(|requirement| requirement.id().to_string())
            .collect();

        dag.get_task_mut(id).ok_or_else(not_found)?.record.start();
        flog!("Running {}", id);
        self.emit(SchedulerEvent::TaskStarted {
            task_id: id.clone(),
        });

        let result = if missing.is_empty() {
            dag.get_task(id).ok_or_else(not_found)?.task.run(&self.ctx)
        } else {
            Err(Error::MissingDependencies {
                task: id.to_string(),
                missing,
            })
        };

        let node = dag.get_task_mut(id).ok_or_else(not_found)?;
        match &result {
            Ok(()) => {
                node.record.complete();
                flog!("{} completed", id);
                self.emit(SchedulerEvent::TaskCompleted {
                    task_id: id.clone(),
                });
            }
            Err(e) => {
                let error = e.to_string();
                node.record.fail(&error);
                flog_error!("{} failed: {}", id, error);
                self.emit(SchedulerEvent::TaskFailed {
                    task_id: id.clone(),
                    error,
                });
            }
        }
        result
    }
}
