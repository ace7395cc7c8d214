//! Integration test suite for stsflow.
//!
//! These tests run real task graphs in scratch directories. Downloads hit a
//! loopback HTTP server, archives are generated per test, and the training
//! script is replaced by a small shell script.
//!
//! # Test Categories
//!
//! - `pipeline_e2e`: Full graph execution, failure halting, dry-run plans
//! - `idempotence`: Completed steps are never repeated
//! - `logging`: File logger output and level filtering

mod fixtures;

mod idempotence;
mod pipeline_e2e;
