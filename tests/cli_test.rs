//! End-to-end tests running the pylaunch binary.
//!
//! Tests that need a working Python with `venv` return early when none is
//! installed.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn pylaunch(base: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pylaunch"));
    cmd.arg("-C").arg(base).args(args);
    cmd.env_remove("PYLAUNCH_PAUSE").env("NO_COLOR", "1");
    cmd
}

fn run(mut cmd: Command) -> Output {
    cmd.stdin(Stdio::null()).output().expect("spawn pylaunch")
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn python_with_venv() -> bool {
    Command::new("python3")
        .args(["-c", "import venv, ensurepip"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

// ============================================================
// Failures before any process is started
// ============================================================

#[test]
fn given_missing_target_when_running_then_exit_one_with_message() {
    // Arrange
    let temp = TempDir::new().unwrap();

    // Act
    let out = run(pylaunch(temp.path(), &["run", "--no-pause"]));

    // Assert
    assert_eq!(out.status.code(), Some(1));
    let stderr = text(&out.stderr);
    assert!(stderr.contains("Cannot find main.py in"), "{stderr}");
    assert!(!temp.path().join("venv").exists());
}

#[test]
fn given_no_interpreter_when_running_then_exit_one_with_install_hint() {
    // Arrange
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("main.py"), "print('hello')\n").unwrap();

    // Act
    let out = run(pylaunch(
        temp.path(),
        &["run", "--no-pause", "--python", "no-such-python-xyz"],
    ));

    // Assert
    assert_eq!(out.status.code(), Some(1));
    let stderr = text(&out.stderr);
    assert!(stderr.contains("Python was not found"), "{stderr}");
    assert!(!temp.path().join("venv").exists());
}

#[test]
fn given_invalid_local_config_when_running_then_config_exit_code() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("pylaunch.toml"), "strict = \"maybe\"\n").unwrap();

    let out = run(pylaunch(temp.path(), &["run", "--no-pause"]));

    assert_eq!(out.status.code(), Some(78));
}

// ============================================================
// Auxiliary commands
// ============================================================

#[test]
fn given_empty_dir_when_info_then_reports_missing_pieces() {
    let temp = TempDir::new().unwrap();

    let out = run(pylaunch(temp.path(), &["info"]));

    assert_eq!(out.status.code(), Some(0));
    let stdout = text(&out.stdout);
    assert!(stdout.contains("Target: main.py (missing)"), "{stdout}");
    assert!(stdout.contains("Environment: venv (missing)"), "{stdout}");
}

#[test]
fn given_utf16_manifest_when_info_then_lists_requirements() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "requests==2.31.0\r\n".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(temp.path().join("requirements.txt"), bytes).unwrap();

    // Act
    let out = run(pylaunch(temp.path(), &["info"]));

    // Assert
    assert_eq!(out.status.code(), Some(0));
    let stdout = text(&out.stdout);
    assert!(
        stdout.contains("Manifest: requirements.txt (1 requirement(s))"),
        "{stdout}"
    );
    assert!(stdout.contains("  requests"), "{stdout}");
}

#[test]
fn given_config_init_twice_when_running_then_second_is_usage_error() {
    // Arrange
    let temp = TempDir::new().unwrap();

    // Act
    let first = run(pylaunch(temp.path(), &["config", "init"]));
    let second = run(pylaunch(temp.path(), &["config", "init"]));

    // Assert
    assert_eq!(first.status.code(), Some(0));
    assert!(temp.path().join("pylaunch.toml").is_file());
    assert_eq!(second.status.code(), Some(64));
}

#[test]
fn given_no_history_when_listing_then_says_so() {
    let temp = TempDir::new().unwrap();

    let out = run(pylaunch(temp.path(), &["history"]));

    assert_eq!(out.status.code(), Some(0));
    assert!(text(&out.stdout).contains("No launches recorded"));
}

#[test]
fn given_shell_when_completion_then_prints_script() {
    let temp = TempDir::new().unwrap();

    let out = run(pylaunch(temp.path(), &["completion", "bash"]));

    assert_eq!(out.status.code(), Some(0));
    assert!(text(&out.stdout).contains("pylaunch"));
}

// ============================================================
// Full launch with a real interpreter
// ============================================================

#[test]
fn given_real_python_when_running_then_creates_env_runs_script_and_pauses() {
    if !python_with_venv() {
        eprintln!("skipping: python3 with venv not available");
        return;
    }

    // Arrange
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("main.py"),
        "import os, sys\nprint('hello', *sys.argv[1:])\nprint('venv', os.environ.get('VIRTUAL_ENV'))\nsys.exit(3 if 'fail' in sys.argv else 0)\n",
    )
    .unwrap();
    fs::write(temp.path().join("requirements.txt"), "").unwrap();

    // Act
    let mut cmd = pylaunch(temp.path(), &["run", "--python", "python3", "--", "world"]);
    cmd.env("PYLAUNCH_PAUSE", "always")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().expect("spawn pylaunch");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"\n")
        .expect("write enter");
    let out = child.wait_with_output().unwrap();

    // Assert
    let stdout = text(&out.stdout);
    assert_eq!(out.status.code(), Some(0), "{stdout}\n{}", text(&out.stderr));
    let ran = stdout.find("hello world").expect("script output");
    let paused = stdout.find("Press Enter to continue...").expect("pause prompt");
    assert!(ran < paused, "pause must come after the script: {stdout}");
    assert!(!stdout.contains("venv None"), "script ran activated: {stdout}");
    assert!(temp.path().join("venv").is_dir());

    // Second run reuses the environment and passes the exit code through
    let out = run(pylaunch(temp.path(), &["run", "--no-pause", "--python", "python3", "--", "fail"]));
    assert_eq!(out.status.code(), Some(3));
    assert!(text(&out.stdout).contains("already exists"));
}
