//! Bootstrap launcher service
//!
//! Runs the setup-and-launch sequence: resolve the base directory, verify the
//! target script and an interpreter, ensure and activate the virtual
//! environment, install requirements, launch the target, pause.
//!
//! Every step yields a typed outcome that is checked before the next step.
//! With `strict = false` the environment, install and launch failures are
//! downgraded to warnings, matching the unchecked flow of a plain batch file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::hash::{manifest_digest, stamp_matches, stamp_path};
use crate::application::services::HistoryService;
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    Activation, LaunchError, LaunchLayout, LaunchReport, Manifest, Step, StepOutcome,
};
use crate::infrastructure::traits::{
    CommandRunner, FileSystem, Invocation, Pauser, StatusReporter,
};

/// Prompt shown by the final pause.
pub const PAUSE_PROMPT: &str = "Press Enter to continue...";

/// Kind recorded in the launch history.
pub const HISTORY_KIND: &str = "python project";

/// Service running the bootstrap sequence.
pub struct BootstrapService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    pauser: Arc<dyn Pauser>,
    reporter: Arc<dyn StatusReporter>,
    settings: Arc<Settings>,
}

impl BootstrapService {
    /// Create a new bootstrap service.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        pauser: Arc<dyn Pauser>,
        reporter: Arc<dyn StatusReporter>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            fs,
            cmd,
            pauser,
            reporter,
            settings,
        }
    }

    /// Run the sequence, report a fatal error, then pause.
    ///
    /// The error (if any) has already been passed to the reporter when this
    /// returns, so it stays visible during the pause.
    pub fn execute(&self, target_args: &[String]) -> ApplicationResult<LaunchReport> {
        let result = self.run(target_args);
        if let Err(e) = &result {
            self.reporter.error(&e.to_string());
        }
        self.terminate();
        result
    }

    /// Run the sequence without the final pause.
    #[instrument(skip(self))]
    pub fn run(&self, target_args: &[String]) -> ApplicationResult<LaunchReport> {
        let mut report = LaunchReport::default();

        let layout = self.resolve_layout(&mut report)?;
        self.verify_target(&layout, &mut report)?;
        let interpreter = self.verify_interpreter(&layout, &mut report)?;
        report.interpreter = Some(interpreter.clone());

        self.ensure_environment(&layout, &interpreter, &mut report)?;
        let activation = self.activate(&layout, &mut report)?;
        self.install_dependencies(&layout, &interpreter, activation.as_ref(), &mut report)?;
        report.exit_code = self.launch_target(
            &layout,
            &interpreter,
            activation.as_ref(),
            target_args,
            &mut report,
        )?;

        info!("sequence finished with exit code {}", report.exit_code);
        Ok(report)
    }

    /// Build the layout from settings, anchored at the resolved base directory.
    pub fn resolve_layout(&self, report: &mut LaunchReport) -> ApplicationResult<LaunchLayout> {
        self.reporter.step_started(Step::ResolveBase);
        let base = match &self.settings.base_dir {
            Some(dir) => dir.clone(),
            None => launcher_dir()?,
        };
        let base = self
            .fs
            .canonicalize(&base)
            .with_path_context("resolve base directory", &base)?;
        debug!("base directory: {}", base.display());

        let layout = LaunchLayout::new(
            base,
            self.settings.target.clone(),
            self.settings.manifest.clone(),
            self.settings.env_dir.clone(),
        );
        self.record(
            report,
            Step::ResolveBase,
            StepOutcome::Done(layout.base_dir.display().to_string()),
        );
        Ok(layout)
    }

    fn verify_target(&self, layout: &LaunchLayout, report: &mut LaunchReport) -> ApplicationResult<()> {
        self.reporter.step_started(Step::VerifyTarget);
        let target = layout.target_path();
        if !self.fs.is_file(&target) {
            return Err(LaunchError::MissingTargetScript {
                target: layout.target.clone(),
                base_dir: layout.base_dir.clone(),
            }
            .into());
        }
        self.record(
            report,
            Step::VerifyTarget,
            StepOutcome::Done(target.display().to_string()),
        );
        Ok(())
    }

    /// Find the first interpreter candidate whose version query succeeds.
    pub fn find_interpreter(&self, base_dir: &Path) -> Option<(String, String)> {
        for candidate in &self.settings.interpreters {
            let invocation = Invocation::new(candidate)
                .arg("--version")
                .current_dir(base_dir);
            match self.cmd.output(&invocation) {
                Ok(out) if out.success() => {
                    // Python 2 reported its version on stderr
                    let version = if out.stdout.trim().is_empty() {
                        out.stderr.trim().to_string()
                    } else {
                        out.stdout.trim().to_string()
                    };
                    debug!("interpreter {} answered: {}", candidate, version);
                    return Some((candidate.clone(), version));
                }
                Ok(out) => debug!("interpreter {} exited with {:?}", candidate, out.code),
                Err(e) => debug!("interpreter {} not runnable: {}", candidate, e),
            }
        }
        None
    }

    fn verify_interpreter(
        &self,
        layout: &LaunchLayout,
        report: &mut LaunchReport,
    ) -> ApplicationResult<String> {
        self.reporter.step_started(Step::VerifyInterpreter);
        let (interpreter, version) =
            self.find_interpreter(&layout.base_dir)
                .ok_or_else(|| LaunchError::InterpreterNotFound {
                    candidates: self.settings.interpreters.clone(),
                })?;
        self.reporter.detail(&version);
        self.record(report, Step::VerifyInterpreter, StepOutcome::Done(version));
        Ok(interpreter)
    }

    fn ensure_environment(
        &self,
        layout: &LaunchLayout,
        interpreter: &str,
        report: &mut LaunchReport,
    ) -> ApplicationResult<()> {
        self.reporter.step_started(Step::EnsureEnvironment);
        let env_path = layout.env_path();
        if self.fs.is_dir(&env_path) {
            debug!("environment exists: {}", env_path.display());
            self.record(
                report,
                Step::EnsureEnvironment,
                StepOutcome::Skipped(format!("{} already exists", layout.env_dir.display())),
            );
            return Ok(());
        }

        let invocation = Invocation::new(interpreter)
            .args(["-m", "venv"])
            .arg(&env_path)
            .current_dir(&layout.base_dir);
        info!("creating environment: {}", invocation);
        let code = self.run_inherited(&invocation);
        if code == Some(0) {
            self.record(
                report,
                Step::EnsureEnvironment,
                StepOutcome::Done(format!("created {}", layout.env_dir.display())),
            );
            return Ok(());
        }

        self.tolerate(
            report,
            Step::EnsureEnvironment,
            LaunchError::EnvironmentCreationFailed {
                env_dir: env_path,
                code,
            },
        )
    }

    fn activate(
        &self,
        layout: &LaunchLayout,
        report: &mut LaunchReport,
    ) -> ApplicationResult<Option<Activation>> {
        self.reporter.step_started(Step::Activate);
        let venv = layout.venv();
        let interpreter = venv.interpreter();

        let activation = if self.fs.is_file(&interpreter) {
            if !self.fs.is_file(&venv.activate_script()) {
                debug!("no activation script at {}", venv.activate_script().display());
            }
            let inherited = std::env::var_os("PATH");
            Activation::new(&venv, inherited.as_deref())
        } else {
            Err(LaunchError::ActivationFailed {
                reason: format!("interpreter missing: {}", interpreter.display()),
                interpreter,
            })
        };

        match activation {
            Ok(activation) => {
                self.record(
                    report,
                    Step::Activate,
                    StepOutcome::Done(activation.virtual_env.display().to_string()),
                );
                Ok(Some(activation))
            }
            Err(e) => {
                self.tolerate(report, Step::Activate, e)?;
                Ok(None)
            }
        }
    }

    fn install_dependencies(
        &self,
        layout: &LaunchLayout,
        interpreter: &str,
        activation: Option<&Activation>,
        report: &mut LaunchReport,
    ) -> ApplicationResult<()> {
        self.reporter.step_started(Step::InstallDependencies);
        let manifest_path = layout.manifest_path();
        if !self.fs.is_file(&manifest_path) {
            let message = format!(
                "{} not found, skipping dependency installation",
                layout.manifest.display()
            );
            self.reporter.warning(&message);
            self.record(report, Step::InstallDependencies, StepOutcome::Skipped(message));
            return Ok(());
        }

        // An unreadable manifest still goes to the installer
        let bytes = match self.fs.read(&manifest_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!("manifest not read for summary: {}: {}", manifest_path.display(), e);
                None
            }
        };
        if let Some(bytes) = &bytes {
            let manifest = Manifest::from_bytes(bytes);
            if manifest.is_empty() {
                self.record(
                    report,
                    Step::InstallDependencies,
                    StepOutcome::Skipped(format!(
                        "{} lists no requirements",
                        layout.manifest.display()
                    )),
                );
                return Ok(());
            }
            self.reporter.detail(&format!(
                "{} requirement(s) in {}",
                manifest.len(),
                layout.manifest.display()
            ));
        }

        let hash = bytes.as_deref().map(manifest_digest);
        let stamp = stamp_path(&layout.env_path());
        let unchanged = self.settings.skip_unchanged_install
            && hash
                .as_deref()
                .is_some_and(|hash| self.stamp_is_current(&stamp, hash));
        if unchanged {
            self.record(
                report,
                Step::InstallDependencies,
                StepOutcome::Skipped(format!("{} unchanged", layout.manifest.display())),
            );
            return Ok(());
        }

        let invocation = Invocation::new(program_for(interpreter, activation))
            .args(["-m", "pip", "install", "-r"])
            .arg(&manifest_path)
            .current_dir(&layout.base_dir)
            .activated(activation);
        info!("installing dependencies: {}", invocation);
        let code = self.run_inherited(&invocation);
        if code != Some(0) {
            return self.tolerate(
                report,
                Step::InstallDependencies,
                LaunchError::DependencyInstallFailure {
                    manifest: manifest_path,
                    code,
                },
            );
        }

        if let (true, Some(hash)) = (self.settings.skip_unchanged_install, &hash) {
            if let Err(e) = self.fs.write(&stamp, &format!("{hash}\n")) {
                warn!("cannot write install stamp {}: {}", stamp.display(), e);
            }
        }
        self.record(
            report,
            Step::InstallDependencies,
            StepOutcome::Done(format!("installed from {}", layout.manifest.display())),
        );
        Ok(())
    }

    fn stamp_is_current(&self, stamp: &Path, hash: &str) -> bool {
        self.fs
            .read_to_string(stamp)
            .map(|content| stamp_matches(&content, hash))
            .unwrap_or(false)
    }

    fn launch_target(
        &self,
        layout: &LaunchLayout,
        interpreter: &str,
        activation: Option<&Activation>,
        target_args: &[String],
        report: &mut LaunchReport,
    ) -> ApplicationResult<i32> {
        self.reporter.step_started(Step::LaunchTarget);
        let target = layout.target_path();

        if self.settings.history {
            let history = HistoryService::new(self.fs.clone(), &layout.base_dir);
            let name = layout
                .target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| layout.target.display().to_string());
            if let Err(e) = history.record(&name, &target.display().to_string(), HISTORY_KIND) {
                self.reporter
                    .warning(&format!("cannot save launch history: {e}"));
            }
        }

        let invocation = Invocation::new(program_for(interpreter, activation))
            .arg(&target)
            .args(target_args)
            .current_dir(&layout.base_dir)
            .activated(activation);
        info!("launching: {}", invocation);
        let code = self.run_inherited(&invocation);

        if code == Some(0) {
            self.record(
                report,
                Step::LaunchTarget,
                StepOutcome::Done(format!("{} exited with status 0", layout.target.display())),
            );
            return Ok(0);
        }

        self.tolerate(
            report,
            Step::LaunchTarget,
            LaunchError::TargetExecutionFailure {
                target: layout.target.clone(),
                code,
            },
        )?;
        Ok(code.unwrap_or(crate::exitcode::FAILURE))
    }

    /// Final step: wait for acknowledgment. Never fails the sequence.
    fn terminate(&self) {
        self.reporter.step_started(Step::Terminate);
        if let Err(e) = self.pauser.pause(PAUSE_PROMPT) {
            debug!("pause interrupted: {}", e);
        }
    }

    /// Run with inherited stdio; a spawn failure counts as "no exit code".
    fn run_inherited(&self, invocation: &Invocation) -> Option<i32> {
        match self.cmd.status(invocation) {
            Ok(code) => code,
            Err(e) => {
                warn!("cannot run {}: {}", invocation, e);
                None
            }
        }
    }

    /// Strict mode: propagate. Lenient mode: record, warn, continue.
    fn tolerate(
        &self,
        report: &mut LaunchReport,
        step: Step,
        error: LaunchError,
    ) -> ApplicationResult<()> {
        if self.settings.strict {
            return Err(error.into());
        }
        let message = error.to_string();
        self.reporter.warning(&message);
        self.record(report, step, StepOutcome::Failed(message));
        Ok(())
    }

    fn record(&self, report: &mut LaunchReport, step: Step, outcome: StepOutcome) {
        report.push(step, outcome);
        if let Some(record) = report.records.last() {
            self.reporter.step_finished(record);
        }
    }
}

/// Interpreter for steps after activation: the environment's own when active.
fn program_for(interpreter: &str, activation: Option<&Activation>) -> PathBuf {
    match activation {
        Some(a) => a.interpreter.clone(),
        None => PathBuf::from(interpreter),
    }
}

/// Directory containing the running executable.
pub fn launcher_dir() -> ApplicationResult<PathBuf> {
    let exe = std::env::current_exe().with_path_context("locate launcher", Path::new("."))?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}
