// src/errors.rs

//! Crate-wide error type.
//!
//! Errors fall into two families:
//! - configuration errors (bad task file, unknown/duplicate task, cycle),
//!   raised before any work runs;
//! - execution errors, raised when a task's unit of work fails.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),

    #[error("Task not found: {0}")]
    UnknownTask(String),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Task '{task}' failed: {source:#}")]
    TaskFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssetdagError {
    /// True for errors that are detected before any work is started.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AssetdagError::ConfigError(_)
                | AssetdagError::DuplicateTask(_)
                | AssetdagError::UnknownTask(_)
                | AssetdagError::UnknownDependency { .. }
                | AssetdagError::DagCycle(_)
                | AssetdagError::TomlError(_)
        )
    }

    /// Name of the failed task for execution errors.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            AssetdagError::TaskFailed { task, .. } => Some(task),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssetdagError>;
