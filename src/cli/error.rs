//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::LaunchError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Launch(launch) => launch_exit_code(launch),
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                },
            },
        }
    }
}

/// Launcher failures exit with 1; a failing target passes its own code through.
fn launch_exit_code(e: &LaunchError) -> i32 {
    match e {
        LaunchError::TargetExecutionFailure { code, .. } => {
            code.unwrap_or(crate::exitcode::FAILURE)
        }
        LaunchError::MissingTargetScript { .. }
        | LaunchError::InterpreterNotFound { .. }
        | LaunchError::EnvironmentCreationFailed { .. }
        | LaunchError::ActivationFailed { .. }
        | LaunchError::DependencyInstallFailure { .. } => crate::exitcode::FAILURE,
    }
}
