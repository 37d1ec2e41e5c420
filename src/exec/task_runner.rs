// src/exec/task_runner.rs

//! Individual task runner.

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;

/// Run a single scheduled task on its own Tokio task and emit a
/// `TaskCompleted` event when its work finishes.
///
/// The work itself runs in a nested task so that a panic inside it is
/// reported as an ordinary failure instead of tearing down the run.
pub fn spawn_task(task: ScheduledTask, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        let ScheduledTask { name, work } = task;
        info!(task = %name, work = %work.describe(), "starting task");

        let handle = tokio::spawn(async move { work.run().await });
        let result = match handle.await {
            Ok(result) => result,
            Err(join_err) => Err(anyhow!("task panicked: {join_err}")),
        };

        match &result {
            Ok(()) => info!(task = %name, "task finished"),
            Err(err) => error!(task = %name, error = %format!("{err:#}"), "task failed"),
        }

        if runtime_tx
            .send(RuntimeEvent::TaskCompleted {
                task: name.clone(),
                result,
            })
            .await
            .is_err()
        {
            debug!(task = %name, "runtime loop gone; dropping completion event");
        }
    });
}
