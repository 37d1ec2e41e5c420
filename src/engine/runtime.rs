// src/engine/runtime.rs

use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::{ScheduledTask, Scheduler, TaskGraph};
use crate::engine::{RuntimeEvent, TaskName, TaskOutcome};
use crate::errors::{AssetdagError, Result};
use crate::exec::spawn_task;

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// The task that was requested.
    pub target: TaskName,
    /// Every task of the closure, in the order it completed.
    pub completed: Vec<TaskName>,
}

/// Executes requested tasks of a [`TaskGraph`].
///
/// Each call to [`Runner::run`] is an independent run with fresh per-run
/// state; the graph itself is never mutated.
#[derive(Debug, Clone)]
pub struct Runner {
    graph: Arc<TaskGraph>,
}

impl Runner {
    pub fn new(graph: TaskGraph) -> Self {
        Self {
            graph: Arc::new(graph),
        }
    }

    /// Run `target` after all of its transitive prerequisites.
    ///
    /// - Tasks whose prerequisites are done are started concurrently.
    /// - Every task of the closure runs at most once.
    /// - On the first failure nothing new is started; tasks already running
    ///   are awaited, then the first failure is returned.
    pub async fn run(&self, target: &str) -> Result<RunReport> {
        let mut scheduler = Scheduler::for_target(&self.graph, target)?;
        info!(requested = %target, tasks = ?scheduler.task_names().collect::<Vec<_>>(), "starting run");

        let (rt_tx, mut rt_rx) = mpsc::channel::<RuntimeEvent>(64);
        let mut completed: Vec<TaskName> = Vec::new();
        let mut first_failure: Option<(TaskName, anyhow::Error)> = None;

        let ready = scheduler.collect_ready();
        dispatch(ready, &rt_tx);

        while !scheduler.is_finished() {
            if scheduler.running_count() == 0 {
                // Pending tasks with nothing running can never become ready.
                error!(requested = %target, "scheduler stalled with pending tasks");
                return Err(AssetdagError::Other(anyhow!(
                    "run of '{target}' stalled: pending tasks can never become ready"
                )));
            }

            let Some(event) = rt_rx.recv().await else {
                return Err(AssetdagError::Other(anyhow!(
                    "runtime event channel closed during run of '{target}'"
                )));
            };
            debug!(?event, "runtime received event");

            let ready = match event {
                RuntimeEvent::TaskCompleted { task, result } => match result {
                    Ok(()) => {
                        completed.push(task.clone());
                        scheduler.handle_completion(&task, TaskOutcome::Success)
                    }
                    Err(err) => {
                        warn!(task = %task, error = %format!("{err:#}"), "task failed");
                        if first_failure.is_none() {
                            first_failure = Some((task.clone(), err));
                        }
                        scheduler.handle_completion(&task, TaskOutcome::Failed)
                    }
                },
            };
            dispatch(ready, &rt_tx);
        }

        if let Some((task, source)) = first_failure {
            error!(requested = %target, failed_task = %task, "run failed");
            return Err(AssetdagError::TaskFailed { task, source });
        }

        info!(requested = %target, completed = completed.len(), "run finished");
        Ok(RunReport {
            target: target.to_string(),
            completed,
        })
    }
}

/// Hand every ready task to the executor.
fn dispatch(tasks: Vec<ScheduledTask>, rt_tx: &mpsc::Sender<RuntimeEvent>) {
    for task in tasks {
        debug!(task = %task.name, "dispatching task to executor");
        spawn_task(task, rt_tx.clone());
    }
}
