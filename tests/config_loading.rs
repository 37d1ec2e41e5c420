mod common;

use assetdag::cli::CliArgs;
use assetdag::config::StepConfig;
use assetdag::config::loader::{load_and_validate, load_from_path};
use assetdag::errors::AssetdagError;
use assetdag_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use common::{demo_project, demos_dir, init_tracing, read, with_timeout};

#[test]
fn demo_task_file_is_valid() {
    let cfg = load_and_validate(demos_dir().join("Assetdag.toml")).unwrap();

    assert_eq!(cfg.config.default_task, "default");
    assert_eq!(
        cfg.task.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["build", "center", "clean", "default", "fonts", "images", "scripts", "styles"]
    );
    for leaf in ["center", "images", "fonts", "styles", "scripts"] {
        assert_eq!(cfg.task[leaf].after, vec!["clean".to_string()], "{leaf}");
    }
    assert_eq!(
        cfg.task["build"].after,
        vec!["scripts", "styles", "fonts", "images"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
    assert_eq!(cfg.task["scripts"].steps[0], StepConfig::Concat { file: "all.js".into() });
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_from_path("does/not/exist/Assetdag.toml").unwrap_err();
    assert!(matches!(err, AssetdagError::IoError(_)));
}

#[test]
fn invalid_toml_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Assetdag.toml");
    std::fs::write(&path, "[task.default\nafter = ").unwrap();

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, AssetdagError::TomlError(_)));
    assert!(err.is_configuration_error());
}

#[test]
fn builder_rejects_dependency_cycles() {
    let err = ConfigFileBuilder::new()
        .with_task("default", TaskConfigBuilder::aggregate().after("a").build())
        .with_task("a", TaskConfigBuilder::aggregate().after("b").build())
        .with_task("b", TaskConfigBuilder::aggregate().after("a").build())
        .try_build()
        .unwrap_err();
    assert!(matches!(err, AssetdagError::DagCycle(_)));
}

#[test]
fn builder_rejects_swap_url_without_environment_value() {
    let err = ConfigFileBuilder::new()
        .with_env("local", "center", "http://localhost")
        .with_task(
            "default",
            TaskConfigBuilder::pipeline(&["src/center.js"], "dist")
                .step(StepConfig::SwapUrl { key: "center".into() })
                .build(),
        )
        .try_build()
        .unwrap_err();
    assert!(err.to_string().contains("[env.production]"));
}

fn args(config: &std::path::Path, task: Option<&str>) -> CliArgs {
    CliArgs {
        task: task.map(String::from),
        config: config.to_path_buf(),
        log_level: None,
        dry_run: false,
        list: false,
    }
}

#[tokio::test]
async fn entry_point_runs_default_task_relative_to_task_file() {
    init_tracing();
    let project = demo_project();
    let root = project.path();

    with_timeout(assetdag::run(args(&root.join("Assetdag.toml"), None)))
        .await
        .unwrap();

    assert!(read(root, "dist/index.html").contains("all.min.js"));
    assert!(root.join("dist/javascripts/all.min.js").is_file());
}

#[tokio::test]
async fn dry_run_and_list_do_no_work() {
    init_tracing();
    let project = demo_project();
    let root = project.path();
    let config = root.join("Assetdag.toml");

    let mut dry = args(&config, Some("build"));
    dry.dry_run = true;
    with_timeout(assetdag::run(dry)).await.unwrap();

    let mut list = args(&config, None);
    list.list = true;
    with_timeout(assetdag::run(list)).await.unwrap();

    assert!(!root.join("dist").exists());
}

#[tokio::test]
async fn entry_point_reports_unknown_task() {
    init_tracing();
    let project = demo_project();

    let err = with_timeout(assetdag::run(args(&project.path().join("Assetdag.toml"), Some("deploy"))))
        .await
        .unwrap_err();
    assert!(matches!(err, AssetdagError::UnknownTask(ref t) if t == "deploy"));
}
