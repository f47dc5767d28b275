//! Attach the failing action and path to `io::Error`s

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

pub trait IoResultExt<T> {
    /// Wrap an I/O error as `OperationFailed { context: "<action>: <path>" }`.
    ///
    /// ```ignore
    /// fs.read_to_string(&manifest)
    ///     .with_path_context("read manifest", &manifest)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::OperationFailed {
            context: format!("{action}: {}", path.display()),
            source: source.into(),
        })
    }
}
