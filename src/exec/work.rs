// src/exec/work.rs

//! The unit of work attached to every task.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by [`TaskWork::run`].
pub type WorkFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Something a task does once all of its prerequisites have completed.
///
/// Implementations must be re-runnable: the same work object is invoked once
/// per run in which its task takes part.
pub trait TaskWork: Send + Sync {
    /// Start the work; the returned future resolves when it is finished.
    fn run(&self) -> WorkFuture<'_>;

    /// Short human-readable description, used by `--list` and `--dry-run`.
    fn describe(&self) -> String {
        "custom work".to_string()
    }
}

/// Work of aggregate tasks: nothing to do beyond waiting for prerequisites.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWork;

impl TaskWork for NoopWork {
    fn run(&self) -> WorkFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    fn describe(&self) -> String {
        "no work (aggregate)".to_string()
    }
}

/// Shared handle to a [`NoopWork`].
pub fn noop() -> Arc<dyn TaskWork> {
    Arc::new(NoopWork)
}

/// Adapter turning an async closure into a [`TaskWork`].
pub struct FnWork<F> {
    f: F,
}

impl<F> fmt::Debug for FnWork<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnWork").finish_non_exhaustive()
    }
}

impl<F, Fut> TaskWork for FnWork<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn run(&self) -> WorkFuture<'_> {
        Box::pin((self.f)())
    }
}

/// Wrap an async closure as shared task work.
///
/// ```ignore
/// graph.register("hello", Vec::new(), work_fn(|| async { Ok(()) }))?;
/// ```
pub fn work_fn<F, Fut>(f: F) -> Arc<dyn TaskWork>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnWork { f })
}
