//! Pipeline execution: run context, scheduler and summary.

pub mod context;
pub mod scheduler;
pub mod summary;

pub use context::RunContext;
pub use scheduler::{PlanEntry, Scheduler, SchedulerEvent};
pub use summary::RunSummary;
