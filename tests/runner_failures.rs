mod common;

use assetdag::dag::TaskGraph;
use assetdag::engine::Runner;
use assetdag::errors::AssetdagError;
use assetdag::exec::noop;
use assetdag_test_utils::recorder::{Behaviour, Recorder};
use common::{init_tracing, with_timeout};

#[tokio::test]
async fn failed_prerequisite_stops_dependents_but_running_siblings_finish() {
    init_tracing();
    let recorder = Recorder::new();
    let mut graph = TaskGraph::new();
    recorder.register(&mut graph, "clean", &[]);
    recorder.register_with(&mut graph, "scripts", &["clean"], Behaviour::fail("uglify exploded"));
    recorder.register_with(&mut graph, "styles", &["clean"], Behaviour::slow(100));
    recorder.register(&mut graph, "build", &["scripts", "styles"]);

    let err = with_timeout(Runner::new(graph).run("build")).await.unwrap_err();

    assert_eq!(err.failed_task(), Some("scripts"));
    assert!(!err.is_configuration_error());
    assert!(err.to_string().contains("uglify exploded"));

    assert_eq!(recorder.times_started("build"), 0);
    // The sibling was already running and was allowed to complete.
    assert!(recorder.finished().contains(&"styles".to_string()));
}

#[tokio::test]
async fn nothing_new_starts_after_a_failure() {
    init_tracing();
    let recorder = Recorder::new();
    let mut graph = TaskGraph::new();
    recorder.register_with(&mut graph, "fast_fail", &[], Behaviour::fail("boom"));
    recorder.register_with(&mut graph, "slow", &[], Behaviour::slow(80));
    recorder.register(&mut graph, "after_slow", &["slow"]);
    recorder.register(&mut graph, "all", &["fast_fail", "after_slow"]);

    let err = with_timeout(Runner::new(graph).run("all")).await.unwrap_err();

    assert_eq!(err.failed_task(), Some("fast_fail"));
    assert_eq!(recorder.finished(), vec!["fast_fail".to_string(), "slow".to_string()]);
    assert_eq!(recorder.times_started("after_slow"), 0);
    assert_eq!(recorder.times_started("all"), 0);
}

#[tokio::test]
async fn first_failure_is_reported_when_several_fail() {
    init_tracing();
    let recorder = Recorder::new();
    let mut graph = TaskGraph::new();
    recorder.register_with(&mut graph, "early", &[], Behaviour::fail("first"));
    recorder.register_with(&mut graph, "late", &[], Behaviour::fail("second").after_ms(60));
    recorder.register(&mut graph, "all", &["early", "late"]);

    let err = with_timeout(Runner::new(graph).run("all")).await.unwrap_err();

    assert_eq!(err.failed_task(), Some("early"));
    assert_eq!(recorder.finished().len(), 2);
}

#[tokio::test]
async fn panicking_work_fails_its_task() {
    init_tracing();
    let recorder = Recorder::new();
    let mut graph = TaskGraph::new();
    recorder.register_with(&mut graph, "images", &[], Behaviour::panic());
    recorder.register(&mut graph, "build", &["images"]);

    let err = with_timeout(Runner::new(graph).run("build")).await.unwrap_err();

    assert_eq!(err.failed_task(), Some("images"));
    assert!(err.to_string().contains("panicked"));
    assert_eq!(recorder.times_started("build"), 0);
}

#[tokio::test]
async fn unknown_task_is_a_configuration_error() {
    init_tracing();
    let recorder = Recorder::new();
    let mut graph = TaskGraph::new();
    recorder.register(&mut graph, "build", &[]);

    let err = Runner::new(graph).run("deploy").await.unwrap_err();

    assert!(matches!(err, AssetdagError::UnknownTask(ref t) if t == "deploy"));
    assert!(err.is_configuration_error());
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn cycle_is_a_configuration_error_and_runs_nothing() {
    init_tracing();
    let recorder = Recorder::new();
    let mut graph = TaskGraph::new();
    recorder.register(&mut graph, "clean", &[]);
    recorder.register(&mut graph, "a", &["clean", "b"]);
    recorder.register(&mut graph, "b", &["a"]);

    let err = Runner::new(graph).run("a").await.unwrap_err();

    assert!(matches!(err, AssetdagError::DagCycle(_)));
    assert!(err.is_configuration_error());
    // `clean` was ready, but no work starts before the graph is checked.
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn unknown_prerequisite_is_a_configuration_error_and_runs_nothing() {
    init_tracing();
    let recorder = Recorder::new();
    let mut graph = TaskGraph::new();
    recorder.register(&mut graph, "clean", &[]);
    recorder.register(&mut graph, "build", &["clean", "scripts"]);

    let err = Runner::new(graph).run("build").await.unwrap_err();

    assert!(matches!(
        err,
        AssetdagError::UnknownDependency { ref task, ref dependency }
            if task == "build" && dependency == "scripts"
    ));
    assert!(recorder.events().is_empty());
}

#[test]
fn duplicate_registration_is_a_configuration_error() {
    let mut graph = TaskGraph::new();
    graph.register("styles", vec![], noop()).unwrap();

    let err = graph.register("styles", vec!["clean".into()], noop()).unwrap_err();

    assert!(matches!(err, AssetdagError::DuplicateTask(ref t) if t == "styles"));
    assert!(err.is_configuration_error());
    assert_eq!(graph.len(), 1);
}
