//! stsflow: prepares the STS benchmark and BERT checkpoints, then runs the
//! STS-B fine-tuning script.
//!
//! Every step is a [`core::Task`] with a file [`core::Target`]. The
//! [`pipeline::Scheduler`] runs the incomplete part of a task's dependency
//! graph, one task at a time.

pub mod archive;
pub mod config;
pub mod core;
pub mod error;
pub mod fetch;
pub mod log;
pub mod pipeline;
pub mod tasks;

pub use error::{Error, Result};
