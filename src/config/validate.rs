// src/config/validate.rs

use std::path::{Component, Path};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, StepConfig, TaskConfig};
use crate::errors::{AssetdagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.env, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_dependencies(cfg)?;
    for (name, task) in cfg.task.iter() {
        validate_task_shape(name, task)?;
        validate_env_references(cfg, name, task)?;
    }
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(AssetdagError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let default_task = &cfg.config.default_task;
    if !cfg.task.contains_key(default_task) {
        return Err(AssetdagError::ConfigError(format!(
            "[config].default_task '{default_task}' is not a defined task"
        )));
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == name {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{name}' cannot depend on itself in `after`"
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(AssetdagError::UnknownDependency {
                    task: name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Paths the runner deletes or writes to must stay inside the project root.
fn ensure_inside_root(task: &str, field: &str, value: &str) -> Result<()> {
    let path = Path::new(value);
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{task}': `{field}` path '{value}' must be relative and must not contain '..'"
                )));
            }
        }
    }
    if depth == 0 {
        return Err(AssetdagError::ConfigError(format!(
            "task '{task}': `{field}` path '{value}' must name a directory below the project root"
        )));
    }
    Ok(())
}

fn validate_task_shape(name: &str, task: &TaskConfig) -> Result<()> {
    let shape_error = |msg: &str| Err(AssetdagError::ConfigError(format!("task '{name}': {msg}")));

    match (&task.clean, &task.src) {
        (Some(_), Some(_)) => return shape_error("`clean` and `src` are mutually exclusive"),
        (Some(paths), None) => {
            if paths.is_empty() {
                return shape_error("`clean` must list at least one path");
            }
            if task.dest.is_some() || task.base.is_some() || !task.steps.is_empty() {
                return shape_error("`dest`, `base` and `steps` are only valid together with `src`");
            }
            for path in paths {
                ensure_inside_root(name, "clean", path)?;
            }
        }
        (None, Some(patterns)) => {
            if patterns.is_empty() {
                return shape_error("`src` must list at least one pattern");
            }
            let Some(dest) = &task.dest else {
                return shape_error("`src` requires `dest`");
            };
            ensure_inside_root(name, "dest", dest)?;
        }
        (None, None) => {
            if task.dest.is_some() || task.base.is_some() || !task.steps.is_empty() {
                return shape_error("`dest`, `base` and `steps` are only valid together with `src`");
            }
        }
    }

    for step in &task.steps {
        let problem = match step {
            StepConfig::Replace { from, .. } if from.is_empty() => "a non-empty `from`",
            StepConfig::Concat { file } if file.is_empty() || file.contains('/') => {
                "a plain file name in `file`"
            }
            StepConfig::Rename { suffix } if suffix.is_empty() => "a non-empty `suffix`",
            _ => continue,
        };
        return shape_error(&format!("`{}` step needs {problem}", step.op()));
    }
    Ok(())
}

fn validate_env_references(cfg: &RawConfigFile, name: &str, task: &TaskConfig) -> Result<()> {
    for step in &task.steps {
        let StepConfig::SwapUrl { key } = step else {
            continue;
        };
        for env in [&cfg.config.source_env, &cfg.config.target_env] {
            let found = cfg.env.get(env).is_some_and(|values| values.contains_key(key));
            if !found {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{name}': `swap_url` key '{key}' is missing from [env.{env}]"
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task, so `[task.B] after = ["A"]` adds A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(AssetdagError::DagCycle(format!(
            "cycle detected in task DAG involving task '{}'",
            cycle.node_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_str;

    fn err(toml: &str) -> AssetdagError {
        parse_str(toml).expect_err("config should be rejected")
    }

    #[test]
    fn defaults_apply_when_config_section_is_absent() {
        let cfg = parse_str("[task.default]\n").unwrap();
        assert_eq!(cfg.config.default_task, "default");
        assert_eq!(cfg.config.source_env, "local");
        assert_eq!(cfg.config.target_env, "production");
        assert!(cfg.env.is_empty());
    }

    #[test]
    fn empty_file_and_missing_default_task_are_rejected() {
        assert!(err("").to_string().contains("at least one"));
        let e = err("[config]\ndefault_task = \"build\"\n[task.default]\n");
        assert!(e.to_string().contains("default_task 'build'"));
        assert!(e.is_configuration_error());
    }

    #[test]
    fn unknown_and_self_dependencies_are_rejected() {
        let e = err("[task.default]\nafter = [\"missing\"]\n");
        assert!(matches!(
            e,
            AssetdagError::UnknownDependency { ref task, ref dependency }
                if task == "default" && dependency == "missing"
        ));

        let e = err("[task.default]\nafter = [\"default\"]\n");
        assert!(e.to_string().contains("cannot depend on itself"));
    }

    #[test]
    fn cycles_are_rejected() {
        let e = err(
            "[task.default]\nafter = [\"a\"]\n[task.a]\nafter = [\"b\"]\n[task.b]\nafter = [\"a\"]\n",
        );
        assert!(matches!(e, AssetdagError::DagCycle(_)));
    }

    #[test]
    fn task_shapes_are_checked() {
        let e = err("[task.default]\nclean = [\"dist\"]\nsrc = [\"a.js\"]\ndest = \"dist\"\n");
        assert!(e.to_string().contains("mutually exclusive"));

        let e = err("[task.default]\nsrc = [\"a.js\"]\n");
        assert!(e.to_string().contains("requires `dest`"));

        let e = err("[task.default]\nsteps = [{ op = \"minify_js\" }]\n");
        assert!(e.to_string().contains("only valid together with `src`"));

        let e = err("[task.default]\nsrc = [\"a.js\"]\ndest = \"dist\"\nsteps = [{ op = \"concat\", file = \"\" }]\n");
        assert!(e.to_string().contains("`concat` step needs a plain file name in `file`"));

        let e = err("[task.default]\nsrc = [\"a.js\"]\ndest = \"dist\"\nsteps = [{ op = \"rename\", suffix = \"\" }]\n");
        assert!(e.to_string().contains("`rename` step needs a non-empty `suffix`"));
    }

    #[test]
    fn output_paths_must_stay_inside_the_project() {
        for bad in ["../dist", "/tmp/dist", "dist/../..", "."] {
            let toml = format!("[task.default]\nclean = [\"{bad}\"]\n");
            let e = err(&toml);
            assert!(e.to_string().contains("`clean` path"), "{bad}: {e}");
        }
        let e = err("[task.default]\nsrc = [\"a.js\"]\ndest = \"../out\"\n");
        assert!(e.to_string().contains("`dest` path"));
    }

    #[test]
    fn swap_url_keys_must_exist_in_both_environments() {
        let base = "[task.default]\nsrc = [\"a.js\"]\ndest = \"dist\"\nsteps = [{ op = \"swap_url\", key = \"center\" }]\n";

        let e = err(&format!("{base}[env.local]\ncenter = \"http://localhost\"\n"));
        assert!(e.to_string().contains("[env.production]"));

        let ok = format!(
            "{base}[env.local]\ncenter = \"http://localhost\"\n[env.production]\ncenter = \"https://cdn\"\n"
        );
        let cfg = parse_str(&ok).unwrap();
        assert_eq!(cfg.env_value("production", "center"), Some("https://cdn"));
    }

    #[test]
    fn unknown_fields_and_ops_fail_to_parse() {
        assert!(matches!(err("[task.default]\ncmd = \"x\"\n"), AssetdagError::TomlError(_)));
        assert!(matches!(
            err("[task.default]\nsrc = [\"a\"]\ndest = \"d\"\nsteps = [{ op = \"uglify\" }]\n"),
            AssetdagError::TomlError(_)
        ));
    }
}
