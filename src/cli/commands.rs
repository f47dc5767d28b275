//! Command dispatch and handlers

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{launcher_dir, PAUSE_PROMPT};
use crate::cli::args::{Cli, Commands, ConfigCommands, RunArgs};
use crate::cli::output::{self, ConsoleReporter};
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, PauseMode, Settings};
use crate::domain::{LaunchReport, Manifest};
use crate::infrastructure::di::{pauser_for, ServiceContainer};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

/// Dispatch the parsed command line. Returns the process exit code.
pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    match &cli.command {
        Some(Commands::Run(args)) => cmd_run(cli, args),
        Some(Commands::Info) => cmd_info(cli),
        Some(Commands::History { clear }) => cmd_history(cli, *clear),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        None => cmd_run(cli, &RunArgs::default()),
    }
}

// ============================================================
// Settings
// ============================================================

/// Directory whose `pylaunch.toml` is consulted: `-C`, then a base dir from
/// global config or environment, then the launcher's own directory.
fn base_dir_hint(cli: &Cli) -> CliResult<PathBuf> {
    if let Some(dir) = &cli.base_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = Settings::load(None)?.base_dir {
        return Ok(dir);
    }
    Ok(launcher_dir()?)
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let hint = base_dir_hint(cli)?;
    let mut settings = Settings::load(Some(&hint))?;
    settings.base_dir = cli
        .base_dir
        .clone()
        .or(settings.base_dir)
        .or(Some(hint));
    debug!("settings: {:?}", settings);
    Ok(settings)
}

/// Command line flags are the highest precedence layer.
fn apply_run_args(settings: &mut Settings, args: &RunArgs) {
    if let Some(target) = &args.target {
        settings.target = target.clone();
    }
    if let Some(manifest) = &args.manifest {
        settings.manifest = manifest.clone();
    }
    if let Some(env_dir) = &args.env_dir {
        settings.env_dir = env_dir.clone();
    }
    if !args.python.is_empty() {
        settings.interpreters = args.python.clone();
    }
    if args.no_pause {
        settings.pause = PauseMode::Never;
    }
    if args.lenient {
        settings.strict = false;
    }
}

// ============================================================
// Run
// ============================================================

#[instrument(skip(cli))]
fn cmd_run(cli: &Cli, args: &RunArgs) -> CliResult<i32> {
    let mut settings = match load_settings(cli) {
        Ok(settings) => settings,
        Err(e) => {
            // Keep a double-clicked console window open long enough to read this
            output::error(&e);
            let mode = if args.no_pause {
                PauseMode::Never
            } else {
                PauseMode::Auto
            };
            if let Err(pause_err) = pauser_for(mode).pause(PAUSE_PROMPT) {
                debug!("pause interrupted: {}", pause_err);
            }
            return Ok(e.exit_code());
        }
    };
    apply_run_args(&mut settings, args);

    let container = ServiceContainer::new(settings, Arc::new(ConsoleReporter));
    let service = container.bootstrap_service();

    // The service has already reported a failure before pausing
    match service.execute(&args.args) {
        Ok(report) => {
            for record in report.tolerated_failures() {
                debug!("tolerated failure in {}", record.step);
            }
            Ok(report.exit_code)
        }
        Err(e) => Ok(CliError::from(e).exit_code()),
    }
}

// ============================================================
// Info
// ============================================================

fn cmd_info(cli: &Cli) -> CliResult<i32> {
    let settings = load_settings(cli)?;
    let container = ServiceContainer::silent(settings);
    let service = container.bootstrap_service();
    let layout = service.resolve_layout(&mut LaunchReport::default())?;
    let fs = &container.fs;

    output::action("Base directory", &layout.base_dir.display());
    output::action(
        "Target",
        &format!(
            "{} ({})",
            layout.target.display(),
            presence(fs.is_file(&layout.target_path()))
        ),
    );

    let manifest_path = layout.manifest_path();
    if !fs.is_file(&manifest_path) {
        output::action(
            "Manifest",
            &format!("{} ({})", layout.manifest.display(), presence(false)),
        );
    } else {
        match fs.read(&manifest_path) {
            Ok(bytes) => {
                let manifest = Manifest::from_bytes(&bytes);
                output::action(
                    "Manifest",
                    &format!(
                        "{} ({} requirement(s))",
                        layout.manifest.display(),
                        manifest.len()
                    ),
                );
                if !manifest.requirements.is_empty() {
                    output::detail(&manifest.requirements.iter().map(|r| &r.name).join(", "));
                }
            }
            Err(e) => output::action(
                "Manifest",
                &format!("{} (unreadable: {})", layout.manifest.display(), e),
            ),
        }
    }

    let venv = layout.venv();
    let env_state = if fs.is_file(&venv.interpreter()) {
        "ready"
    } else if fs.is_dir(&layout.env_path()) {
        "incomplete"
    } else {
        "missing"
    };
    output::action(
        "Environment",
        &format!("{} ({})", layout.env_dir.display(), env_state),
    );

    match service.find_interpreter(&layout.base_dir) {
        Some((candidate, version)) => {
            output::action("Interpreter", &format!("{candidate} ({version})"))
        }
        None => output::action(
            "Interpreter",
            &format!(
                "not found (tried: {})",
                container.settings.interpreters.iter().join(", ")
            ),
        ),
    }
    output::action(
        "Mode",
        &format!(
            "{}, pause {}",
            if container.settings.strict {
                "strict"
            } else {
                "lenient"
            },
            container.settings.pause
        ),
    );
    Ok(crate::exitcode::OK)
}

fn presence(exists: bool) -> &'static str {
    if exists {
        "present"
    } else {
        "missing"
    }
}

// ============================================================
// History
// ============================================================

fn cmd_history(cli: &Cli, clear: bool) -> CliResult<i32> {
    let settings = load_settings(cli)?;
    let container = ServiceContainer::silent(settings);
    let layout = container
        .bootstrap_service()
        .resolve_layout(&mut LaunchReport::default())?;
    let history = container.history_service(&layout.base_dir);

    if clear {
        history.clear()?;
        output::success(&format!("Cleared {}", history.path().display()));
        return Ok(crate::exitcode::OK);
    }

    let entries = history.load();
    if entries.is_empty() {
        output::info("No launches recorded");
        return Ok(crate::exitcode::OK);
    }
    output::header(&format!("Launch history ({})", entries.len()));
    for entry in entries.iter().rev() {
        let shown = relative_to(Path::new(&entry.path), &layout.base_dir);
        output::detail(&format!(
            "{}  {}  {}",
            entry.timestamp,
            entry.name,
            shown.display()
        ));
    }
    Ok(crate::exitcode::OK)
}

/// Path relative to `base` when it lies below it, otherwise unchanged.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    match pathdiff::diff_paths(path, base) {
        Some(rel) if !rel.starts_with("..") => rel,
        _ => path.to_path_buf(),
    }
}

// ============================================================
// Config
// ============================================================

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?
            } else {
                local_config_path(&base_dir_hint(cli)?)
            };
            if RealFileSystem.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            let fs = RealFileSystem;
            fs.ensure_parent(&path)
                .map_err(|e| InfraError::io("create config dir for", &path, e))?;
            fs.write(&path, &Settings::template())
                .map_err(|e| InfraError::io("write config", &path, e))?;
            output::success(&format!("Created {}", path.display()));
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action(
                    "Global",
                    &format!("{} ({})", path.display(), presence(path.exists())),
                ),
                None => output::action("Global", "unavailable"),
            }
            let local = local_config_path(&base_dir_hint(cli)?);
            output::action(
                "Local",
                &format!("{} ({})", local.display(), presence(local.exists())),
            );
        }
    }
    Ok(crate::exitcode::OK)
}

// ============================================================
// Completion
// ============================================================

fn cmd_completion(shell: clap_complete::Shell) -> CliResult<i32> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "pylaunch", &mut io::stdout());
    Ok(crate::exitcode::OK)
}
