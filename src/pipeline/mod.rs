// src/pipeline/mod.rs

//! Asset tasks: turning `[task.<name>]` sections into runnable work.
//!
//! - `sources.rs`: glob expansion.
//! - `steps.rs`: the transform steps and how they compose.
//! - `js.rs`, `css.rs`, `image.rs`: the content transforms themselves.
//! - `work.rs`: `CleanWork` and `PipelineWork`, the units of work.

pub mod css;
pub mod image;
pub mod js;
pub mod sources;
pub mod steps;
pub mod work;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::{ConfigFile, TaskConfig};
use crate::dag::TaskGraph;
use crate::errors::Result;
use crate::exec::{TaskWork, noop};
use crate::fs::FileSystem;

pub use steps::{AssetFile, Step};
pub use work::{CleanWork, PipelineWork};

/// Build the unit of work for one task section.
pub fn task_work(
    cfg: &ConfigFile,
    task: &TaskConfig,
    root: &Path,
    fs: &Arc<dyn FileSystem>,
) -> Result<Arc<dyn TaskWork>> {
    if let Some(paths) = &task.clean {
        return Ok(Arc::new(CleanWork {
            fs: Arc::clone(fs),
            root: root.to_path_buf(),
            paths: paths.clone(),
        }));
    }

    let (Some(sources), Some(dest)) = (&task.src, &task.dest) else {
        return Ok(noop());
    };

    let steps = task
        .steps
        .iter()
        .map(|step| Step::from_config(step, cfg))
        .collect::<Result<Vec<_>>>()?;

    Ok(Arc::new(PipelineWork {
        fs: Arc::clone(fs),
        root: root.to_path_buf(),
        sources: sources.clone(),
        base: task.base.as_ref().map(PathBuf::from),
        dest: PathBuf::from(dest),
        steps,
    }))
}

/// Register every task of a validated task file.
///
/// Paths in the file are resolved against `root`, normally the directory
/// holding the task file.
pub fn build_task_graph(
    cfg: &ConfigFile,
    root: &Path,
    fs: Arc<dyn FileSystem>,
) -> Result<TaskGraph> {
    let mut graph = TaskGraph::new();
    for (name, task) in cfg.task.iter() {
        let work = task_work(cfg, task, root, &fs)?;
        debug!(task = %name, work = %work.describe(), "built task");
        graph.register(name.as_str(), task.after.clone(), work)?;
    }
    Ok(graph)
}
