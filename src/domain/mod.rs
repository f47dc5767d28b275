//! Domain layer: launch layout, steps, failures and environment model
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod manifest;
pub mod venv;

pub use entities::*;
pub use error::LaunchError;
pub use manifest::{Manifest, Requirement};
pub use venv::{Activation, Platform, VenvLayout};
