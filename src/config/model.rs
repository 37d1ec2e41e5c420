// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level task file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// default_task = "default"
///
/// [env.local]
/// center = "http://localhost:3000/center"
///
/// [env.production]
/// center = "https://example.com/center"
///
/// [task.clean]
/// clean = ["dist"]
///
/// [task.scripts]
/// after = ["clean"]
/// src = ["build/javascripts/all_nosearch.js"]
/// dest = "dist/javascripts"
/// steps = [
///   { op = "concat", file = "all.js" },
///   { op = "strip_debug" },
///   { op = "minify_js" },
///   { op = "rename", suffix = ".min" },
/// ]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Named environment records from `[env.<name>]`.
    #[serde(default)]
    pub env: BTreeMap<String, EnvSection>,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated task file.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)`, so holding
/// one means every `after` reference resolves, the graph is acyclic and
/// every task has a coherent shape.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub env: BTreeMap<String, EnvSection>,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        env: BTreeMap<String, EnvSection>,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self { config, env, task }
    }

    /// Look up `key` in the environment record `env`.
    pub fn env_value(&self, env: &str, key: &str) -> Option<&str> {
        self.env.get(env)?.get(key).map(String::as_str)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Task run when no task is named on the command line.
    #[serde(default = "default_default_task")]
    pub default_task: String,

    /// Environment whose values `swap_url` steps replace.
    #[serde(default = "default_source_env")]
    pub source_env: String,

    /// Environment whose values `swap_url` steps write.
    #[serde(default = "default_target_env")]
    pub target_env: String,
}

fn default_default_task() -> String {
    "default".to_string()
}

fn default_source_env() -> String {
    "local".to_string()
}

fn default_target_env() -> String {
    "production".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            default_task: default_default_task(),
            source_env: default_source_env(),
            target_env: default_target_env(),
        }
    }
}

/// `[env.<name>]` section: free-form string values such as URLs.
pub type EnvSection = BTreeMap<String, String>;

/// `[task.<name>]` section.
///
/// A task is one of three shapes:
/// - `clean = [..]`: delete paths;
/// - `src` + `dest` (+ `steps`): read files, transform, write;
/// - neither: an aggregate that only waits for `after`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Free-text description shown by `--list`.
    #[serde(default)]
    pub description: Option<String>,

    /// Prerequisites: this task starts only after all of them succeeded.
    #[serde(default)]
    pub after: Vec<String>,

    /// Paths to remove recursively.
    #[serde(default)]
    pub clean: Option<Vec<String>>,

    /// Source files or glob patterns.
    #[serde(default)]
    pub src: Option<Vec<String>>,

    /// Output directory.
    #[serde(default)]
    pub dest: Option<String>,

    /// Overrides the base directory that output paths are relative to.
    #[serde(default)]
    pub base: Option<String>,

    /// Transforms applied in order.
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// One transform step, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepConfig {
    /// Replace every occurrence of `from` with `to`.
    Replace { from: String, to: String },
    /// Replace the `source_env` value of `key` with its `target_env` value.
    SwapUrl { key: String },
    StripDebug,
    MinifyJs,
    MinifyCss,
    OptimizeImage,
    /// Join all files into one named `file`.
    Concat { file: String },
    /// Insert `suffix` before each file's extension.
    Rename { suffix: String },
}

impl StepConfig {
    pub fn op(&self) -> &'static str {
        match self {
            StepConfig::Replace { .. } => "replace",
            StepConfig::SwapUrl { .. } => "swap_url",
            StepConfig::StripDebug => "strip_debug",
            StepConfig::MinifyJs => "minify_js",
            StepConfig::MinifyCss => "minify_css",
            StepConfig::OptimizeImage => "optimize_image",
            StepConfig::Concat { .. } => "concat",
            StepConfig::Rename { .. } => "rename",
        }
    }
}
