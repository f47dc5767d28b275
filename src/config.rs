//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/pylaunch/pylaunch.toml`
//! 3. Local config: `<base_dir>/pylaunch.toml`
//! 4. Environment variables: `PYLAUNCH_*` prefix
//! 5. Command line flags (applied by the CLI layer)

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

/// Name of the local config file inside the base directory.
pub const LOCAL_CONFIG_FILE: &str = "pylaunch.toml";

/// When to wait for user acknowledgment before exiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PauseMode {
    /// Pause only when stdin is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for PauseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(PauseMode::Auto),
            "always" => Ok(PauseMode::Always),
            "never" => Ok(PauseMode::Never),
            other => Err(format!(
                "invalid pause mode '{other}' (expected auto, always or never)"
            )),
        }
    }
}

impl fmt::Display for PauseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PauseMode::Auto => "auto",
            PauseMode::Always => "always",
            PauseMode::Never => "never",
        };
        f.write_str(s)
    }
}

/// Raw settings for intermediate parsing (every field optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub base_dir: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub env_dir: Option<PathBuf>,
    pub interpreters: Option<Vec<String>>,
    pub pause: Option<PauseMode>,
    pub strict: Option<bool>,
    pub history: Option<bool>,
    pub skip_unchanged_install: Option<bool>,
}

/// Unified configuration for pylaunch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base directory (default: directory of the pylaunch executable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    /// Target script, relative to the base directory
    pub target: PathBuf,
    /// Dependency manifest, relative to the base directory
    pub manifest: PathBuf,
    /// Virtual environment directory, relative to the base directory
    pub env_dir: PathBuf,
    /// Interpreter commands tried in order
    pub interpreters: Vec<String>,
    /// Final pause behavior
    pub pause: PauseMode,
    /// Halt on install/launch failures (false reproduces the unchecked batch flow)
    pub strict: bool,
    /// Record launches in `launch_history.json`
    pub history: bool,
    /// Skip installation when the manifest hash matches the install stamp
    pub skip_unchanged_install: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: None,
            target: PathBuf::from("main.py"),
            manifest: PathBuf::from("requirements.txt"),
            env_dir: PathBuf::from("venv"),
            interpreters: default_interpreters(),
            pause: PauseMode::Auto,
            strict: true,
            history: false,
            skip_unchanged_install: false,
        }
    }
}

/// `python` on Windows; `python3` then `python` elsewhere.
pub fn default_interpreters() -> Vec<String> {
    if cfg!(windows) {
        vec!["python".into()]
    } else {
        vec!["python3".into(), "python".into()]
    }
}

/// Get the XDG config directory for pylaunch.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pylaunch").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("pylaunch.toml"))
}

/// Get the path to the local config file in a base directory.
pub fn local_config_path(base_dir: &Path) -> PathBuf {
    base_dir.join(LOCAL_CONFIG_FILE)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        if let Some(base) = &self.base_dir {
            self.base_dir = Some(PathBuf::from(expand_env_vars(
                base.to_string_lossy().as_ref(),
            )));
        }
        self.target = PathBuf::from(expand_env_vars(self.target.to_string_lossy().as_ref()));
        self.manifest = PathBuf::from(expand_env_vars(
            self.manifest.to_string_lossy().as_ref(),
        ));
        self.env_dir = PathBuf::from(expand_env_vars(self.env_dir.to_string_lossy().as_ref()));
    }

    /// Apply an overlay: every field the overlay specifies replaces the current value.
    ///
    /// Interpreter lists are ordered candidates, so they are replaced, never merged.
    pub fn apply(&self, overlay: &RawSettings) -> Self {
        Self {
            base_dir: overlay.base_dir.clone().or_else(|| self.base_dir.clone()),
            target: overlay.target.clone().unwrap_or_else(|| self.target.clone()),
            manifest: overlay
                .manifest
                .clone()
                .unwrap_or_else(|| self.manifest.clone()),
            env_dir: overlay
                .env_dir
                .clone()
                .unwrap_or_else(|| self.env_dir.clone()),
            interpreters: overlay
                .interpreters
                .clone()
                .filter(|list| !list.is_empty())
                .unwrap_or_else(|| self.interpreters.clone()),
            pause: overlay.pause.unwrap_or(self.pause),
            strict: overlay.strict.unwrap_or(self.strict),
            history: overlay.history.unwrap_or(self.history),
            skip_unchanged_install: overlay
                .skip_unchanged_install
                .unwrap_or(self.skip_unchanged_install),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `base_dir` - Optional base directory for the local config file
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/pylaunch/pylaunch.toml`
    /// 3. Local config: `<base_dir>/pylaunch.toml`
    /// 4. Environment variables: `PYLAUNCH_*` prefix
    pub fn load(base_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply(&raw);
            }
        }

        // 3. Local config next to the target script
        if let Some(base) = base_dir {
            let local_path = local_config_path(base);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.apply(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        // Expand ~ and $VAR in path-like fields
        current.expand_paths();

        Ok(current)
    }

    /// Apply PYLAUNCH_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let builder = Config::builder().add_source(
            Environment::with_prefix("PYLAUNCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("interpreters"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("base_dir") {
            settings.base_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("target") {
            settings.target = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("manifest") {
            settings.manifest = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("env_dir") {
            settings.env_dir = PathBuf::from(val);
        }
        match config.get::<Vec<String>>("interpreters") {
            Ok(val) => {
                let val: Vec<String> = val
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if !val.is_empty() {
                    settings.interpreters = val;
                }
            }
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }
        if let Ok(val) = config.get_string("pause") {
            settings.pause = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_bool("strict") {
            settings.strict = val;
        }
        if let Ok(val) = config.get_bool("history") {
            settings.history = val;
        }
        if let Ok(val) = config.get_bool("skip_unchanged_install") {
            settings.skip_unchanged_install = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# pylaunch configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/pylaunch/pylaunch.toml   (your baseline)
#   Local:  <base_dir>/pylaunch.toml           (next to the script)
#   Env:    PYLAUNCH_* environment variables   (explicit overrides)
#   CLI:    --target, --manifest, --env-dir, --python, --no-pause, --lenient

# Script to run, relative to the base directory
# target = "main.py"

# Requirements file passed to pip install -r
# manifest = "requirements.txt"

# Virtual environment directory (created on first run)
# env_dir = "venv"

# Interpreter commands tried in order for the version check
# interpreters = ["python3", "python"]

# Wait for Enter before exiting: "auto" (only in a terminal), "always", "never"
# pause = "auto"

# Stop when dependency installation fails and report a failing script.
# false reproduces the old batch behavior: warn and keep going.
# strict = true

# Record launches in launch_history.json (newest 50 kept)
# history = false

# Skip pip when requirements are unchanged since the last successful install
# skip_unchanged_install = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
