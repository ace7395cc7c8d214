//! Task model for the pipeline DAG.
//!
//! A task declares what it needs (`requires`), what it produces (`output`)
//! and how to produce it (`run`). Identity comes from the family name plus
//! parameters, so two requirement edges naming the same family with the same
//! parameters resolve to one node.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::target::Target;
use crate::error::Result;
use crate::pipeline::RunContext;

/// Deterministic identifier of a task instance, e.g.
/// `ExtractStsbenchmark(data_dir=./data)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Build an id from a family and its ordered parameters.
    pub fn from_parts(family: &str, params: &[(&str, String)]) -> Self {
        let params = params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        Self(format!("{}({})", family, params))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Family part of the id (everything before the parameter list).
    pub fn family(&self) -> &str {
        self.0.split('(').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of pipeline work.
pub trait Task: fmt::Debug {
    /// Family name, shared by every instance of the same task type.
    fn family(&self) -> &'static str;

    /// Significant parameters, in declaration order.
    fn params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn id(&self) -> TaskId {
        TaskId::from_parts(self.family(), &self.params())
    }

    /// Tasks whose outputs must exist before this one runs.
    fn requires(&self) -> Vec<Box<dyn Task>> {
        Vec::new()
    }

    fn output(&self) -> Box<dyn Target>;

    fn complete(&self) -> bool {
        self.output().exists()
    }

    fn run(&self, ctx: &RunContext) -> Result<()>;
}

/// Task status in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TaskStatus {
    /// Scheduled, not yet visited.
    Pending,
    /// Output already existed when the graph was built.
    AlreadyDone,
    /// Currently executing.
    Running,
    /// Ran to completion in this invocation.
    Completed,
    /// Ran and returned an error.
    Failed {
        /// Error message describing the failure.
        error: String,
    },
    /// Never reached because the run halted.
    NotRun {
        /// Why the task was left pending.
        reason: String,
    },
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::AlreadyDone => write!(f, "already done"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed { error } => write!(f, "failed: {}", error),
            TaskStatus::NotRun { reason } => write!(f, "not run: {}", reason),
        }
    }
}

/// Execution record kept for every node in the DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn mark_done(&mut self) {
        self.status = TaskStatus::AlreadyDone;
    }

    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: &str) {
        self.status = TaskStatus::Failed {
            error: error.to_string(),
        };
        self.finished_at = Some(Utc::now());
    }

    pub fn halt(&mut self, reason: &str) {
        self.status = TaskStatus::NotRun {
            reason: reason.to_string(),
        };
    }

    /// Output is on disk, either from before or from this run.
    pub fn is_satisfied(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::AlreadyDone | TaskStatus::Completed
        )
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Wall-clock runtime, if the task ran.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}
