// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::TaskGraph;
use crate::engine::{RunReport, Runner};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::build_task_graph;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the task file, builds the task graph rooted at the
/// task file's directory, then either lists tasks, prints the plan
/// (`--dry-run`) or runs the requested task.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config;
    let cfg = load_and_validate(&config_path)?;
    let root = config_root_dir(&config_path);
    debug!(root = ?root, "project root");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let graph = build_task_graph(&cfg, &root, fs)?;

    if args.list {
        print!("{}", render_task_list(&cfg, &graph));
        return Ok(());
    }

    let target = args
        .task
        .unwrap_or_else(|| cfg.config.default_task.clone());

    if args.dry_run {
        let plan = graph.plan(&target)?;
        print!("{}", render_plan(&target, &plan, &graph));
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    let report = run_task(graph, &target).await?;
    info!(requested = %report.target, tasks = ?report.completed, "all done");
    Ok(())
}

/// Run one task of an already built graph.
pub async fn run_task(graph: TaskGraph, target: &str) -> Result<RunReport> {
    Runner::new(graph).run(target).await
}

/// Directory that task file paths are relative to.
///
/// A bare file name (`Assetdag.toml`) has an empty parent; that means the
/// current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `--list` output: every task, its prerequisites and what it does.
pub fn render_task_list(cfg: &ConfigFile, graph: &TaskGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "tasks ({}):", graph.len());
    for name in graph.tasks() {
        let marker = if name == cfg.config.default_task { " (default)" } else { "" };
        let _ = writeln!(out, "  - {name}{marker}");
        if let Some(description) = cfg.task.get(name).and_then(|t| t.description.as_deref()) {
            let _ = writeln!(out, "      {description}");
        }
        let deps = graph.dependencies_of(name);
        if !deps.is_empty() {
            let _ = writeln!(out, "      after: {}", deps.join(", "));
        }
        if let Some(def) = graph.get(name) {
            let _ = writeln!(out, "      work: {}", def.work.describe());
        }
    }
    out
}

/// `--dry-run` output: the closure of `target` grouped into levels that
/// may run concurrently.
pub fn render_plan(target: &str, plan: &[Vec<String>], graph: &TaskGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "assetdag dry-run: {target}");
    for (i, level) in plan.iter().enumerate() {
        let _ = writeln!(out, "  step {}:", i + 1);
        for name in level {
            let work = graph
                .get(name)
                .map(|def| def.work.describe())
                .unwrap_or_default();
            let _ = writeln!(out, "    {name}: {work}");
        }
    }
    out
}
