// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};
use crate::errors::{AssetdagError, Result};

/// Per-run state machine over the closure of one requested task.
///
/// It is responsible for:
/// - handing out each task at most once, and only after all of its declared
///   prerequisites completed successfully
/// - switching to fail-fast mode on the first failure: pending tasks are
///   skipped, running tasks are left to finish
/// - telling the runtime when nothing is left pending or running
#[derive(Debug)]
pub struct Scheduler {
    target: TaskName,
    /// Closure of `target` in topological order.
    order: Vec<TaskName>,
    tasks: HashMap<TaskName, TaskInfo>,
    failed: bool,
}

impl Scheduler {
    /// Build the per-run state for `target` and its transitive prerequisites.
    ///
    /// Configuration errors (unknown task, unknown prerequisite, cycle) are
    /// returned here, before anything can be started.
    pub fn for_target(graph: &TaskGraph, target: &str) -> Result<Self> {
        let order = graph.closure(target)?;

        let mut tasks = HashMap::with_capacity(order.len());
        for name in &order {
            let def = graph
                .get(name)
                .ok_or_else(|| AssetdagError::UnknownTask(name.clone()))?;
            tasks.insert(name.clone(), TaskInfo::from_def(def));
        }

        debug!(requested = %target, closure = ?order, "scheduler: new run");

        Ok(Self {
            target: target.to_string(),
            order,
            tasks,
            failed: false,
        })
    }

    /// Names in the closure of the target, prerequisites first.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// True once a task of this run failed.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// True when no task is pending or running anymore.
    pub fn is_finished(&self) -> bool {
        !self.tasks.values().any(|info| {
            matches!(info.run_state, RunState::Pending | RunState::Running)
        })
    }

    /// Number of tasks currently handed out and not yet completed.
    pub fn running_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|info| info.run_state == RunState::Running)
            .count()
    }

    pub fn run_state_of(&self, task: &str) -> TaskRunState {
        self.tasks.get(task).map(|info| info.run_state).into()
    }

    /// Whether all prerequisites of `task` completed successfully.
    ///
    /// Returns `None` for tasks outside this run.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        self.tasks.get(task).map(|info| self.deps_satisfied_for(info))
    }

    /// Collect tasks that are `Pending` and whose prerequisites are all done,
    /// mark them as `Running`, and return them.
    ///
    /// Nothing is returned once the run has failed.
    pub fn collect_ready(&mut self) -> Vec<ScheduledTask> {
        if self.failed {
            return Vec::new();
        }

        // Decide first, then mutate, to keep the borrow checker happy.
        let candidates: Vec<TaskName> = self
            .order
            .iter()
            .filter(|name| {
                self.tasks.get(name.as_str()).is_some_and(|info| {
                    info.run_state == RunState::Pending && self.deps_satisfied_for(info)
                })
            })
            .cloned()
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                debug!(task = %info.name, "prerequisites satisfied; marking Running");
                info.run_state = RunState::Running;
                ready.push(ScheduledTask::from_task_info(info));
            }
        }
        ready
    }

    /// Record the outcome of a running task and return newly ready tasks.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> Vec<ScheduledTask> {
        let Some(info) = self.tasks.get_mut(task) else {
            warn!(task = %task, "completion for task outside this run; ignoring");
            return Vec::new();
        };

        if info.run_state != RunState::Running {
            warn!(
                task = %task,
                state = ?info.run_state,
                "completion for task that is not running; ignoring"
            );
            return Vec::new();
        }

        match outcome {
            TaskOutcome::Success => {
                info.run_state = RunState::DoneSuccess;
                debug!(task = %task, "task marked DoneSuccess");
            }
            TaskOutcome::Failed => {
                info.run_state = RunState::DoneFailed;
                warn!(task = %task, "task failed; skipping everything not yet started");
                self.fail_fast();
            }
        }

        if self.is_finished() {
            info!(requested = %self.target, failed = self.failed, "scheduler: run finished");
        }

        self.collect_ready()
    }

    fn fail_fast(&mut self) {
        self.failed = true;
        for info in self.tasks.values_mut() {
            if info.run_state == RunState::Pending {
                debug!(task = %info.name, "marking Skipped after failure");
                info.run_state = RunState::Skipped;
            }
        }
    }

    fn deps_satisfied_for(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep| {
            self.tasks
                .get(dep)
                .is_some_and(|d| d.run_state == RunState::DoneSuccess)
        })
    }
}
