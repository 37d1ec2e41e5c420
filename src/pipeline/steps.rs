// src/pipeline/steps.rs

//! The closed set of transform steps a pipeline task can apply.
//!
//! Content steps map each file's bytes independently. File-set steps
//! (`concat`, `rename`) change which files exist or what they are called.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{ConfigFile, StepConfig};
use crate::errors::AssetdagError;
use crate::pipeline::{css, image, js};

/// A file moving through a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Output path relative to the task's `dest`.
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl AssetFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.contents)
            .with_context(|| format!("{:?} is not valid UTF-8 text", self.path))
    }
}

/// A resolved transform step.
///
/// `swap_url` does not appear here: it is resolved against the environment
/// records into a plain [`Step::Replace`] when the task is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Replace { from: String, to: String },
    StripDebug,
    MinifyJs,
    MinifyCss,
    OptimizeImage,
    Concat { file: String },
    Rename { suffix: String },
}

impl Step {
    pub fn from_config(step: &StepConfig, cfg: &ConfigFile) -> crate::errors::Result<Self> {
        Ok(match step {
            StepConfig::Replace { from, to } => Step::Replace {
                from: from.clone(),
                to: to.clone(),
            },
            StepConfig::SwapUrl { key } => {
                let lookup = |env: &str| {
                    cfg.env_value(env, key).map(str::to_string).ok_or_else(|| {
                        AssetdagError::ConfigError(format!(
                            "`swap_url` key '{key}' is missing from [env.{env}]"
                        ))
                    })
                };
                Step::Replace {
                    from: lookup(&cfg.config.source_env)?,
                    to: lookup(&cfg.config.target_env)?,
                }
            }
            StepConfig::StripDebug => Step::StripDebug,
            StepConfig::MinifyJs => Step::MinifyJs,
            StepConfig::MinifyCss => Step::MinifyCss,
            StepConfig::OptimizeImage => Step::OptimizeImage,
            StepConfig::Concat { file } => Step::Concat { file: file.clone() },
            StepConfig::Rename { suffix } => Step::Rename {
                suffix: suffix.clone(),
            },
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Replace { .. } => "replace",
            Step::StripDebug => "strip_debug",
            Step::MinifyJs => "minify_js",
            Step::MinifyCss => "minify_css",
            Step::OptimizeImage => "optimize_image",
            Step::Concat { .. } => "concat",
            Step::Rename { .. } => "rename",
        }
    }

    /// Apply this step to the whole file set.
    pub fn apply(&self, files: Vec<AssetFile>) -> Result<Vec<AssetFile>> {
        match self {
            Step::Concat { file } => Ok(concat(files, file)),
            Step::Rename { suffix } => Ok(files
                .into_iter()
                .map(|f| AssetFile {
                    path: with_suffix(&f.path, suffix),
                    contents: f.contents,
                })
                .collect()),
            _ => files
                .into_iter()
                .map(|f| -> Result<AssetFile> {
                    let contents = self
                        .transform(&f)
                        .with_context(|| format!("step '{}' failed on {:?}", self.name(), f.path))?;
                    Ok(AssetFile {
                        path: f.path,
                        contents,
                    })
                })
                .collect(),
        }
    }

    fn transform(&self, file: &AssetFile) -> Result<Vec<u8>> {
        match self {
            Step::Replace { from, to } => Ok(replace_bytes(&file.contents, from.as_bytes(), to.as_bytes())),
            Step::StripDebug => Ok(js::strip_debug(file.text()?)?.into_bytes()),
            Step::MinifyJs => Ok(js::minify_js(file.text()?).into_bytes()),
            Step::MinifyCss => Ok(css::minify_css(file.text()?).into_bytes()),
            Step::OptimizeImage => image::optimize_image(&file.contents),
            Step::Concat { .. } | Step::Rename { .. } => Ok(file.contents.clone()),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Replace { from, to } => write!(f, "replace({from:?} -> {to:?})"),
            Step::Concat { file } => write!(f, "concat({file})"),
            Step::Rename { suffix } => write!(f, "rename(+{suffix})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Replace every non-overlapping occurrence of `from`, scanning left to right.
pub fn replace_bytes(input: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() || input.len() < from.len() {
        return input.to_vec();
    }

    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(input[i]);
            i += 1;
        }
    }
    out
}

/// Join every file, separated by a newline, into one file named `name`.
/// An empty set stays empty.
fn concat(files: Vec<AssetFile>, name: &str) -> Vec<AssetFile> {
    if files.is_empty() {
        return files;
    }

    let mut contents = Vec::new();
    for (i, f) in files.into_iter().enumerate() {
        if i > 0 {
            contents.push(b'\n');
        }
        contents.extend(f.contents);
    }
    vec![AssetFile::new(name, contents)]
}

/// `js/all.js` + `.min` -> `js/all.min.js`.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(file_name)
}
