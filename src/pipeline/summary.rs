//! End-of-run execution summary.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::core::{TaskId, TaskRecord, TaskStatus};
use crate::Result;

const BANNER: &str = "===== stsflow Execution Summary =====";

/// Outcome of one scheduler run: every task of the graph in dependency order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub root: TaskId,
    pub tasks: Vec<TaskRecord>,
}

impl RunSummary {
    pub fn new(root: TaskId, tasks: Vec<TaskRecord>) -> Self {
        Self { root, tasks }
    }

    fn matching(&self, pred: impl Fn(&TaskStatus) -> bool) -> Vec<&TaskRecord> {
        self.tasks.iter().filter(|r| pred(&r.status)).collect()
    }

    pub fn already_done(&self) -> Vec<&TaskRecord> {
        self.matching(|s| matches!(s, TaskStatus::AlreadyDone))
    }

    pub fn completed(&self) -> Vec<&TaskRecord> {
        self.matching(|s| matches!(s, TaskStatus::Completed))
    }

    pub fn failed(&self) -> Vec<&TaskRecord> {
        self.matching(|s| matches!(s, TaskStatus::Failed { .. }))
    }

    pub fn not_run(&self) -> Vec<&TaskRecord> {
        self.matching(|s| matches!(s, TaskStatus::NotRun { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failed().is_empty() && self.not_run().is_empty()
    }

    /// Status of a single task, if it was part of the graph.
    pub fn status_of(&self, id: &TaskId) -> Option<&TaskStatus> {
        self.tasks.iter().find(|r| &r.id == id).map(|r| &r.status)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable report for the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", BANNER);
        let _ = writeln!(out);
        let _ = writeln!(out, "Scheduled {} task(s) of which:", self.tasks.len());

        section(&mut out, "were already complete", &self.already_done(), |r| {
            r.id.to_string()
        });
        section(&mut out, "ran successfully", &self.completed(), |r| {
            match r.duration() {
                Some(d) => format!("{} ({}.{:03}s)", r.id, d.num_seconds(), d.num_milliseconds() % 1000),
                None => r.id.to_string(),
            }
        });
        section(&mut out, "failed", &self.failed(), |r| match &r.status {
            TaskStatus::Failed { error } => format!("{}: {}", r.id, error),
            _ => r.id.to_string(),
        });
        section(&mut out, "did not run", &self.not_run(), |r| match &r.status {
            TaskStatus::NotRun { reason } => format!("{} ({})", r.id, reason),
            _ => r.id.to_string(),
        });

        let _ = writeln!(out);
        if self.is_success() {
            let _ = writeln!(out, "{} is complete.", self.root);
        } else {
            let _ = writeln!(out, "{} is incomplete because of failed tasks.", self.root);
        }
        let _ = writeln!(out);
        let _ = write!(out, "{}", BANNER);
        out
    }
}

fn section(
    out: &mut String,
    heading: &str,
    records: &[&TaskRecord],
    line: impl Fn(&TaskRecord) -> String,
) {
    if records.is_empty() {
        return;
    }
    let _ = writeln!(out, "* {} {}:", records.len(), heading);
    for record in records {
        let _ = writeln!(out, "    - {}", line(record));
    }
}
