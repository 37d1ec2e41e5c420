// src/exec/mod.rs

//! Unit-of-work execution layer.
//!
//! - [`work`] defines the [`TaskWork`] trait that every task carries, plus
//!   the closure adapter and the no-op work of aggregate tasks.
//! - [`task_runner`] runs one scheduled task on its own Tokio task and
//!   reports completion to the runtime loop.

pub mod task_runner;
pub mod work;

pub use task_runner::spawn_task;
pub use work::{NoopWork, TaskWork, WorkFuture, noop, work_fn};
