//! Domain entities: core data structures

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::venv::VenvLayout;

/// The base directory and the three relative names every step works with.
///
/// Built once at startup and handed to each step, so no step depends on the
/// process working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchLayout {
    /// Absolute, canonical base directory
    pub base_dir: PathBuf,
    /// Target script, relative to `base_dir`
    pub target: PathBuf,
    /// Dependency manifest, relative to `base_dir`
    pub manifest: PathBuf,
    /// Virtual environment directory, relative to `base_dir`
    pub env_dir: PathBuf,
}

impl LaunchLayout {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        manifest: impl Into<PathBuf>,
        env_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            target: target.into(),
            manifest: manifest.into(),
            env_dir: env_dir.into(),
        }
    }

    pub fn target_path(&self) -> PathBuf {
        self.resolve(&self.target)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.resolve(&self.manifest)
    }

    pub fn env_path(&self) -> PathBuf {
        self.resolve(&self.env_dir)
    }

    /// Layout of the virtual environment for the running platform.
    pub fn venv(&self) -> VenvLayout {
        VenvLayout::for_current_platform(self.env_path())
    }

    /// Join a relative name onto the base directory; absolute names pass through.
    fn resolve(&self, name: &Path) -> PathBuf {
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.base_dir.join(name)
        }
    }
}

/// Stages of the bootstrap sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ResolveBase,
    VerifyTarget,
    VerifyInterpreter,
    EnsureEnvironment,
    Activate,
    InstallDependencies,
    LaunchTarget,
    Terminate,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::ResolveBase,
        Step::VerifyTarget,
        Step::VerifyInterpreter,
        Step::EnsureEnvironment,
        Step::Activate,
        Step::InstallDependencies,
        Step::LaunchTarget,
        Step::Terminate,
    ];

    /// Status line printed when the step starts.
    pub fn banner(&self) -> &'static str {
        match self {
            Step::ResolveBase => "Resolving base directory...",
            Step::VerifyTarget => "Checking for target script...",
            Step::VerifyInterpreter => "Checking for Python...",
            Step::EnsureEnvironment => "Creating virtual environment (if needed)...",
            Step::Activate => "Activating virtual environment...",
            Step::InstallDependencies => "Installing dependencies...",
            Step::LaunchTarget => "Launching target script...",
            Step::Terminate => "Done.",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ResolveBase => "resolve-base",
            Step::VerifyTarget => "verify-target",
            Step::VerifyInterpreter => "verify-interpreter",
            Step::EnsureEnvironment => "ensure-environment",
            Step::Activate => "activate",
            Step::InstallDependencies => "install-dependencies",
            Step::LaunchTarget => "launch-target",
            Step::Terminate => "terminate",
        };
        f.write_str(name)
    }
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done(String),
    Skipped(String),
    /// Failure that did not stop the sequence (lenient mode)
    Failed(String),
}

impl StepOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, StepOutcome::Done(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Everything a completed sequence produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchReport {
    pub records: Vec<StepRecord>,
    /// Interpreter command that answered the version query
    pub interpreter: Option<String>,
    /// Exit code of the last invoked step
    pub exit_code: i32,
}

impl LaunchReport {
    pub fn push(&mut self, step: Step, outcome: StepOutcome) {
        self.records.push(StepRecord { step, outcome });
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.records
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }

    /// Steps that failed without halting the sequence.
    pub fn tolerated_failures(&self) -> Vec<&StepRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome.is_failed())
            .collect()
    }
}

/// One entry of the launch history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Local time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` syntax
/// - `${VAR}` syntax
/// - `~` for home directory
///
/// Uses shellexpand crate for robust expansion.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
