//! Core pipeline model: targets, tasks and the dependency DAG.

pub mod dag;
pub mod target;
pub mod task;

pub use dag::{TaskDAG, TaskNode};
pub use target::{LocalFileTarget, LocalFilesTarget, Target};
pub use task::{Task, TaskId, TaskRecord, TaskStatus};
