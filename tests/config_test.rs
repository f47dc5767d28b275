//! Integration tests for Settings loading with layered precedence.
//!
//! These tests run without a global config (temp directories only), so they
//! exercise the local `pylaunch.toml` layer over compiled defaults.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use pylaunch::config::{local_config_path, PauseMode, Settings, LOCAL_CONFIG_FILE};

// ============================================================
// Local config
// ============================================================

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    // Arrange
    let base = TempDir::new().unwrap();
    fs::write(
        base.path().join(LOCAL_CONFIG_FILE),
        r#"
target = "app.py"
env_dir = ".venv"
interpreters = ["py", "python"]
pause = "never"
strict = false
history = true
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(base.path())).expect("load settings");

    // Assert
    assert_eq!(settings.target, PathBuf::from("app.py"));
    assert_eq!(settings.env_dir, PathBuf::from(".venv"));
    assert_eq!(settings.interpreters, vec!["py", "python"]);
    assert_eq!(settings.pause, PauseMode::Never);
    assert!(!settings.strict);
    assert!(settings.history);
    // untouched
    assert_eq!(settings.manifest, PathBuf::from("requirements.txt"));
    assert!(!settings.skip_unchanged_install);
}

#[test]
fn given_no_local_config_when_load_then_defaults() {
    let base = TempDir::new().unwrap();

    let settings = Settings::load(Some(base.path())).expect("load settings");

    assert_eq!(settings.target, PathBuf::from("main.py"));
    assert!(settings.strict);
}

#[test]
fn given_invalid_toml_when_load_then_config_error() {
    // Arrange
    let base = TempDir::new().unwrap();
    fs::write(local_config_path(base.path()), "target = [unclosed").unwrap();

    // Act
    let err = Settings::load(Some(base.path())).unwrap_err();

    // Assert
    assert!(err.to_string().contains(LOCAL_CONFIG_FILE), "{err}");
}

#[test]
fn given_unknown_pause_mode_when_load_then_config_error() {
    let base = TempDir::new().unwrap();
    fs::write(local_config_path(base.path()), "pause = \"sometimes\"\n").unwrap();

    assert!(Settings::load(Some(base.path())).is_err());
}

#[test]
fn given_env_var_in_local_env_dir_when_load_then_expanded() {
    // Arrange
    let base = TempDir::new().unwrap();
    fs::write(local_config_path(base.path()), "env_dir = \"~/venvs/app\"\n").unwrap();

    // Act
    let settings = Settings::load(Some(base.path())).unwrap();

    // Assert
    let home = std::env::var("HOME").expect("HOME should be set");
    assert!(settings.env_dir.starts_with(&home));
}

#[test]
fn given_template_written_when_load_then_equals_defaults() {
    let base = TempDir::new().unwrap();
    fs::write(local_config_path(base.path()), Settings::template()).unwrap();

    let settings = Settings::load(Some(base.path())).unwrap();

    assert_eq!(settings, Settings::load(None).unwrap());
}
