// src/dag/mod.rs

//! Task graph and per-run scheduling.
//!
//! - [`graph`] holds the registered tasks and resolves closures, cycles
//!   and execution plans.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   tasks are ready to run.
//! - [`task_info`] provides per-run task metadata and scheduled task types.

pub mod graph;
pub mod scheduler;
pub mod task_info;

pub use graph::{TaskDef, TaskGraph};
pub use scheduler::Scheduler;
pub use task_info::{ScheduledTask, TaskRunState};
