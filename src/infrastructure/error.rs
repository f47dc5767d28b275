//! Infrastructure errors: application errors plus direct I/O failures

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::application::ApplicationError;

#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// I/O outside the launch sequence (config files written by the CLI)
    #[error("cannot {action} {}", path.display())]
    Io {
        action: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InfraError {
    pub fn io(action: impl Into<String>, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action: action.into(),
            path: path.to_path_buf(),
            source,
        }
    }
}
