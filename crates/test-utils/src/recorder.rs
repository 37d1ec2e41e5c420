use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use assetdag::dag::TaskGraph;
use assetdag::exec::{TaskWork, WorkFuture};

/// Something that happened to a recorded task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
}

/// How a [`RecordingWork`] behaves once started.
#[derive(Debug, Clone, Default)]
pub struct Behaviour {
    pub delay: Duration,
    pub fail: Option<String>,
    pub panic: bool,
}

impl Behaviour {
    pub fn succeed() -> Self {
        Self::default()
    }

    pub fn slow(ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(ms),
            ..Self::default()
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            fail: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn panic() -> Self {
        Self {
            panic: true,
            ..Self::default()
        }
    }

    pub fn after_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }
}

/// Shared log of task starts and finishes, plus a concurrency gauge.
///
/// Hand out works with [`Recorder::work`]; every clone of a recorder
/// writes to the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn work(&self, name: &str, behaviour: Behaviour) -> Arc<dyn TaskWork> {
        Arc::new(RecordingWork {
            name: name.to_string(),
            behaviour,
            recorder: self.clone(),
        })
    }

    /// Register a task that records itself and otherwise succeeds.
    pub fn register(&self, graph: &mut TaskGraph, name: &str, deps: &[&str]) {
        self.register_with(graph, name, deps, Behaviour::succeed());
    }

    pub fn register_with(&self, graph: &mut TaskGraph, name: &str, deps: &[&str], behaviour: Behaviour) {
        graph
            .register(
                name,
                deps.iter().map(|d| d.to_string()).collect(),
                self.work(name, behaviour),
            )
            .expect("task registration failed");
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(name) => Some(name),
                Event::Finished(_) => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Finished(name) => Some(name),
                Event::Started(_) => None,
            })
            .collect()
    }

    pub fn times_started(&self, name: &str) -> usize {
        self.started().iter().filter(|n| *n == name).count()
    }

    /// Index of an event in the log, if it happened.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    /// True when `first` finished before `second` started.
    pub fn finished_before_start(&self, first: &str, second: &str) -> bool {
        match (
            self.position(&Event::Finished(first.to_string())),
            self.position(&Event::Started(second.to_string())),
        ) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }

    /// Highest number of works that were running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

/// Unit of work that records its lifecycle in a [`Recorder`].
#[derive(Debug)]
pub struct RecordingWork {
    name: String,
    behaviour: Behaviour,
    recorder: Recorder,
}

impl TaskWork for RecordingWork {
    fn run(&self) -> WorkFuture<'_> {
        Box::pin(async move {
            let recorder = &self.recorder;
            recorder.push(Event::Started(self.name.clone()));
            let now = recorder.active.fetch_add(1, Ordering::SeqCst) + 1;
            recorder.max_active.fetch_max(now, Ordering::SeqCst);

            if self.behaviour.delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.behaviour.delay).await;
            }

            recorder.active.fetch_sub(1, Ordering::SeqCst);
            recorder.push(Event::Finished(self.name.clone()));

            if self.behaviour.panic {
                panic!("task '{}' panicked on purpose", self.name);
            }
            match &self.behaviour.fail {
                Some(message) => Err(anyhow!("{message}")),
                None => Ok(()),
            }
        })
    }

    fn describe(&self) -> String {
        format!("recorded work '{}'", self.name)
    }
}
