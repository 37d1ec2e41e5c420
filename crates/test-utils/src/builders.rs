#![allow(dead_code)]

use std::collections::BTreeMap;

use assetdag::config::{ConfigFile, ConfigSection, RawConfigFile, StepConfig, TaskConfig};
use assetdag::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                env: BTreeMap::new(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_env(mut self, env: &str, key: &str, value: &str) -> Self {
        self.config
            .env
            .entry(env.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn default_task(mut self, name: &str) -> Self {
        self.config.config.default_task = name.to_string();
        self
    }

    /// Validate without panicking, for tests that expect rejection.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// A task with no work of its own.
    pub fn aggregate() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn clean(paths: &[&str]) -> Self {
        let mut builder = Self::aggregate();
        builder.task.clean = Some(paths.iter().map(|p| p.to_string()).collect());
        builder
    }

    pub fn pipeline(src: &[&str], dest: &str) -> Self {
        let mut builder = Self::aggregate();
        builder.task.src = Some(src.iter().map(|p| p.to_string()).collect());
        builder.task.dest = Some(dest.to_string());
        builder
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn base(mut self, base: &str) -> Self {
        self.task.base = Some(base.to_string());
        self
    }

    pub fn step(mut self, step: StepConfig) -> Self {
        self.task.steps.push(step);
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.task.description = Some(text.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
