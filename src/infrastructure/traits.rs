//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use crate::domain::{Activation, Step, StepRecord};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Read raw file contents.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Canonicalize path (resolve symlinks, make absolute).
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// A child process to run: program, arguments, working directory and
/// environment changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(OsString, OsString)>,
    pub env_remove: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Apply an environment activation, if any.
    pub fn activated(mut self, activation: Option<&Activation>) -> Self {
        if let Some(activation) = activation {
            self.env.extend(activation.vars());
            self.env_remove
                .extend(activation.removed().iter().map(OsString::from));
        }
        self
    }

    /// Whether any argument equals `arg`.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Value set for `key` by this invocation, if any.
    pub fn env_value(&self, key: &str) -> Option<&OsStr> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run to completion with stdout and stderr captured.
    fn output(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;

    /// Run to completion with stdin, stdout and stderr inherited.
    /// Returns the exit code, `None` when terminated by a signal.
    fn status(&self, invocation: &Invocation) -> io::Result<Option<i32>>;
}

/// Blocking wait for user acknowledgment.
pub trait Pauser: Send + Sync {
    /// Show `prompt` and block until the user acknowledges.
    fn pause(&self, prompt: &str) -> io::Result<()>;
}

/// Receives progress of the bootstrap sequence as it happens.
pub trait StatusReporter: Send + Sync {
    /// A step is about to run.
    fn step_started(&self, step: Step);

    /// A step produced its outcome.
    fn step_finished(&self, record: &StepRecord);

    /// Supplementary line (interpreter version, requirement count, ...).
    fn detail(&self, message: &str);

    /// Non-fatal problem.
    fn warning(&self, message: &str);

    /// Fatal problem, shown before the final pause.
    fn error(&self, message: &str);
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Real command runner implementation.
#[derive(Debug, Default)]
pub struct RealCommandRunner;

impl RealCommandRunner {
    fn command(invocation: &Invocation) -> std::process::Command {
        let mut cmd = std::process::Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        for key in &invocation.env_remove {
            cmd.env_remove(key);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl CommandRunner for RealCommandRunner {
    fn output(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let out = Self::command(invocation)
            .stdin(std::process::Stdio::null())
            .output()?;
        Ok(ProcessOutput {
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }

    fn status(&self, invocation: &Invocation) -> io::Result<Option<i32>> {
        let status = Self::command(invocation).status()?;
        Ok(status.code())
    }
}

/// Pauser reading a line from stdin.
///
/// With `only_on_terminal` set it returns immediately unless stdin is a terminal,
/// so piped and scripted runs never block.
#[derive(Debug, Default)]
pub struct ConsolePauser {
    pub only_on_terminal: bool,
}

impl Pauser for ConsolePauser {
    fn pause(&self, prompt: &str) -> io::Result<()> {
        let stdin = io::stdin();
        if self.only_on_terminal && !stdin.is_terminal() {
            return Ok(());
        }
        let mut stdout = io::stdout();
        write!(stdout, "{} ", prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        Ok(())
    }
}

/// Pauser that never blocks.
#[derive(Debug, Default)]
pub struct NoPause;

impl Pauser for NoPause {
    fn pause(&self, _prompt: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Reporter that discards everything; progress still reaches the tracing log.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl StatusReporter for SilentReporter {
    fn step_started(&self, step: Step) {
        tracing::debug!("step started: {}", step);
    }

    fn step_finished(&self, record: &StepRecord) {
        tracing::debug!("step finished: {} -> {:?}", record.step, record.outcome);
    }

    fn detail(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
