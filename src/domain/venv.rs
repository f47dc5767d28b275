//! Virtual environment layout and activation
//!
//! Activation is modelled as the variable changes an `activate` script would
//! make, applied to child processes only. The launcher's own environment is
//! never modified.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use super::error::LaunchError;

/// Variables an activated environment must not inherit.
pub const UNSET_ON_ACTIVATION: &[&str] = &["PYTHONHOME"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// Paths inside a virtual environment directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvLayout {
    root: PathBuf,
    platform: Platform,
}

impl VenvLayout {
    pub fn new(root: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            root: root.into(),
            platform,
        }
    }

    pub fn for_current_platform(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Platform::current())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `Scripts` on Windows, `bin` elsewhere.
    pub fn scripts_dir(&self) -> PathBuf {
        match self.platform {
            Platform::Windows => self.root.join("Scripts"),
            Platform::Unix => self.root.join("bin"),
        }
    }

    pub fn interpreter(&self) -> PathBuf {
        match self.platform {
            Platform::Windows => self.scripts_dir().join("python.exe"),
            Platform::Unix => self.scripts_dir().join("python"),
        }
    }

    pub fn activate_script(&self) -> PathBuf {
        match self.platform {
            Platform::Windows => self.scripts_dir().join("activate.bat"),
            Platform::Unix => self.scripts_dir().join("activate"),
        }
    }
}

/// Environment changes that make child processes resolve against a venv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub virtual_env: PathBuf,
    /// New `PATH`: scripts dir first, then the inherited entries
    pub path: OsString,
    pub interpreter: PathBuf,
}

impl Activation {
    /// Build the activation for `venv`, given the `PATH` the launcher inherited.
    pub fn new(venv: &VenvLayout, inherited_path: Option<&OsStr>) -> Result<Self, LaunchError> {
        let scripts = venv.scripts_dir();
        let mut entries = vec![scripts.clone()];
        if let Some(path) = inherited_path {
            entries.extend(std::env::split_paths(path).filter(|p| p != &scripts));
        }
        let path = std::env::join_paths(entries).map_err(|e| LaunchError::ActivationFailed {
            interpreter: venv.interpreter(),
            reason: format!("cannot build PATH with {}: {}", scripts.display(), e),
        })?;

        Ok(Self {
            virtual_env: venv.root().to_path_buf(),
            path,
            interpreter: venv.interpreter(),
        })
    }

    /// Variables to set on every child process.
    pub fn vars(&self) -> Vec<(OsString, OsString)> {
        vec![
            (
                OsString::from("VIRTUAL_ENV"),
                self.virtual_env.clone().into_os_string(),
            ),
            (OsString::from("PATH"), self.path.clone()),
        ]
    }

    /// Variables to remove from every child process.
    pub fn removed(&self) -> &'static [&'static str] {
        UNSET_ON_ACTIVATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_windows_layout_when_resolving_then_uses_scripts_dir() {
        let venv = VenvLayout::new("venv", Platform::Windows);

        assert_eq!(venv.scripts_dir(), PathBuf::from("venv").join("Scripts"));
        assert_eq!(
            venv.interpreter(),
            PathBuf::from("venv").join("Scripts").join("python.exe")
        );
        assert_eq!(
            venv.activate_script(),
            PathBuf::from("venv").join("Scripts").join("activate.bat")
        );
    }

    #[test]
    fn given_unix_layout_when_resolving_then_uses_bin_dir() {
        let venv = VenvLayout::new("venv", Platform::Unix);

        assert_eq!(
            venv.interpreter(),
            PathBuf::from("venv").join("bin").join("python")
        );
        assert_eq!(
            venv.activate_script(),
            PathBuf::from("venv").join("bin").join("activate")
        );
    }

    #[test]
    fn given_inherited_path_when_activating_then_scripts_dir_comes_first() {
        let root = std::env::temp_dir().join("pylaunch-venv");
        let venv = VenvLayout::for_current_platform(&root);
        let inherited =
            std::env::join_paths([PathBuf::from("/usr/local/bin"), PathBuf::from("/usr/bin")])
                .unwrap();

        let activation = Activation::new(&venv, Some(inherited.as_os_str())).unwrap();

        let entries: Vec<PathBuf> = std::env::split_paths(&activation.path).collect();
        assert_eq!(entries[0], venv.scripts_dir());
        assert_eq!(entries.len(), 3);
        assert_eq!(activation.virtual_env, root);
        assert!(activation
            .vars()
            .iter()
            .any(|(k, v)| k == "VIRTUAL_ENV" && v == root.as_os_str()));
        assert_eq!(activation.removed(), &["PYTHONHOME"]);
    }

    #[test]
    fn given_path_already_containing_scripts_dir_when_activating_then_not_duplicated() {
        let venv = VenvLayout::for_current_platform(std::env::temp_dir().join("v"));
        let inherited = std::env::join_paths([venv.scripts_dir()]).unwrap();

        let activation = Activation::new(&venv, Some(inherited.as_os_str())).unwrap();

        assert_eq!(std::env::split_paths(&activation.path).count(), 1);
    }

    #[test]
    fn given_no_inherited_path_when_activating_then_path_is_scripts_dir() {
        let venv = VenvLayout::for_current_platform(std::env::temp_dir().join("v"));

        let activation = Activation::new(&venv, None).unwrap();

        assert_eq!(activation.path, venv.scripts_dir().into_os_string());
    }
}
