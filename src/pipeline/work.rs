// src/pipeline/work.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::exec::{TaskWork, WorkFuture};
use crate::fs::FileSystem;
use crate::pipeline::sources::collect_sources;
use crate::pipeline::steps::{AssetFile, Step};

/// Run blocking filesystem work off the async runtime.
async fn blocking<T, F>(what: String, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow!("{what} worker did not complete: {e}"))?
}

/// Delete paths recursively. Missing paths are fine.
#[derive(Debug, Clone)]
pub struct CleanWork {
    pub fs: Arc<dyn FileSystem>,
    pub root: PathBuf,
    pub paths: Vec<String>,
}

impl CleanWork {
    pub fn execute(&self) -> Result<()> {
        for path in &self.paths {
            let full = self.root.join(path);
            debug!(path = ?full, "removing");
            self.fs
                .remove_all(&full)
                .with_context(|| format!("failed to clean '{path}'"))?;
        }
        info!(paths = ?self.paths, "cleaned");
        Ok(())
    }
}

impl TaskWork for CleanWork {
    fn run(&self) -> WorkFuture<'_> {
        let this = self.clone();
        Box::pin(blocking("clean".to_string(), move || this.execute()))
    }

    fn describe(&self) -> String {
        format!("clean {}", self.paths.join(", "))
    }
}

/// Read sources, apply steps in order, write the result under `dest`.
#[derive(Debug, Clone)]
pub struct PipelineWork {
    pub fs: Arc<dyn FileSystem>,
    pub root: PathBuf,
    pub sources: Vec<String>,
    pub base: Option<PathBuf>,
    pub dest: PathBuf,
    pub steps: Vec<Step>,
}

impl PipelineWork {
    /// Returns the output paths written, relative to the project root.
    pub fn execute(&self) -> Result<Vec<PathBuf>> {
        let sources = collect_sources(
            self.fs.as_ref(),
            &self.root,
            &self.sources,
            self.base.as_deref(),
        )?;

        let mut files = Vec::with_capacity(sources.len());
        for source in sources {
            let contents = self.fs.read(&source.path)?;
            files.push(AssetFile {
                path: source.relative,
                contents,
            });
        }
        debug!(files = files.len(), "sources loaded");

        for step in &self.steps {
            files = step.apply(files)?;
            debug!(step = %step, files = files.len(), "step applied");
        }

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            let out = self.dest.join(&file.path);
            self.fs
                .write(&self.root.join(&out), &file.contents)
                .with_context(|| format!("failed to write {:?}", out))?;
            written.push(out);
        }
        info!(dest = ?self.dest, written = written.len(), "pipeline wrote files");
        Ok(written)
    }
}

impl TaskWork for PipelineWork {
    fn run(&self) -> WorkFuture<'_> {
        let this = self.clone();
        Box::pin(async move {
            blocking("pipeline".to_string(), move || this.execute()).await?;
            Ok(())
        })
    }

    fn describe(&self) -> String {
        let mut text = format!("{} -> {}", self.sources.join(" "), display(&self.dest));
        if !self.steps.is_empty() {
            let steps: Vec<String> = self.steps.iter().map(ToString::to_string).collect();
            text.push_str(&format!(" [{}]", steps.join(", ")));
        }
        text
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
