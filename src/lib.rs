//! pylaunch: bootstrap launcher for Python scripts
//!
//! Finds an interpreter, creates and activates a virtual environment next to
//! the script, installs its requirements, runs it and waits for the user.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
