// src/dag/task_info.rs

//! Per-run task metadata.

use std::fmt;
use std::sync::Arc;

use crate::dag::graph::TaskDef;
use crate::engine::TaskName;
use crate::exec::TaskWork;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Part of this run, waiting on prerequisites.
    Pending,
    /// Handed to the executor and currently running.
    Running,
    /// Work completed successfully.
    DoneSuccess,
    /// Work failed.
    DoneFailed,
    /// Never started because the run failed first.
    Skipped,
}

/// Public, read-only view of a task's per-run state.
///
/// This is exposed for tests and diagnostics without leaking the internal
/// `RunState` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not part of this run's closure.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
    Skipped,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
            Some(RunState::Skipped) => TaskRunState::Skipped,
        }
    }
}

/// A task in the closure of the current run, plus its run state.
#[derive(Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    /// Direct prerequisites for this task.
    pub deps: Vec<TaskName>,
    pub work: Arc<dyn TaskWork>,
    pub run_state: RunState,
}

impl TaskInfo {
    pub fn from_def(def: &TaskDef) -> Self {
        Self {
            name: def.name.clone(),
            deps: def.deps.clone(),
            work: Arc::clone(&def.work),
            run_state: RunState::Pending,
        }
    }
}

impl fmt::Debug for TaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskInfo")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("run_state", &self.run_state)
            .finish_non_exhaustive()
    }
}

/// Description of a task that the scheduler wants the executor to run now.
#[derive(Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub work: Arc<dyn TaskWork>,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo) -> Self {
        Self {
            name: info.name.clone(),
            work: Arc::clone(&info.work),
        }
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
