//! Launch failure taxonomy (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Launch errors represent the ways the bootstrap sequence can stop.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Cannot find {} in {}", target.display(), base_dir.display())]
    MissingTargetScript { target: PathBuf, base_dir: PathBuf },

    #[error(
        "Python was not found (tried: {}). Install Python and make sure it is on PATH, then retry.",
        candidates.join(", ")
    )]
    InterpreterNotFound { candidates: Vec<String> },

    #[error("failed to create virtual environment {}{}", env_dir.display(), status_suffix(*code))]
    EnvironmentCreationFailed { env_dir: PathBuf, code: Option<i32> },

    #[error("cannot activate virtual environment: {reason}")]
    ActivationFailed { interpreter: PathBuf, reason: String },

    #[error("installing dependencies from {} failed{}", manifest.display(), status_suffix(*code))]
    DependencyInstallFailure { manifest: PathBuf, code: Option<i32> },

    #[error("{} failed{}", target.display(), status_suffix(*code))]
    TargetExecutionFailure { target: PathBuf, code: Option<i32> },
}

fn status_suffix(code: Option<i32>) -> String {
    match code {
        Some(c) => format!(" (exit status {c})"),
        None => " (terminated by signal or could not be started)".to_string(),
    }
}
