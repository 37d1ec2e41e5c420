// src/engine/mod.rs

//! Orchestration engine for assetdag.
//!
//! A [`Runner`] owns a [`crate::dag::TaskGraph`] and executes one requested
//! task per call to [`Runner::run`]:
//! - the per-run state machine lives in [`crate::dag::Scheduler`];
//! - units of work are dispatched through [`crate::exec`], which reports
//!   back with [`RuntimeEvent`]s.

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a unit of work for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Events flowing into the runtime loop from spawned tasks.
#[derive(Debug)]
pub enum RuntimeEvent {
    /// A task's unit of work finished, successfully or not.
    TaskCompleted {
        task: TaskName,
        result: anyhow::Result<()>,
    },
}

pub mod runtime;

pub use runtime::{RunReport, Runner};
