//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, CommandRunner, etc.)
//! but are themselves concrete structs, not traits.

mod bootstrap;
mod history;

pub use bootstrap::{launcher_dir, BootstrapService, HISTORY_KIND, PAUSE_PROMPT};
pub use history::{HistoryService, HISTORY_FILE, MAX_HISTORY};
