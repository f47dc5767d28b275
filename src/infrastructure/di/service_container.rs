//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use crate::application::services::{BootstrapService, HistoryService};
use crate::config::{PauseMode, Settings};
use crate::infrastructure::traits::{
    CommandRunner, ConsolePauser, FileSystem, NoPause, Pauser, RealCommandRunner, RealFileSystem,
    SilentReporter, StatusReporter,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,

    /// Final pause
    pub pauser: Arc<dyn Pauser>,

    /// Progress output
    pub reporter: Arc<dyn StatusReporter>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings, reporter: Arc<dyn StatusReporter>) -> Self {
        let pauser = pauser_for(settings.pause);
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(RealCommandRunner),
            pauser,
            reporter,
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        pauser: Arc<dyn Pauser>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            cmd,
            pauser,
            reporter,
        }
    }

    /// Real implementations with progress going only to the tracing log.
    pub fn silent(settings: Settings) -> Self {
        Self::new(settings, Arc::new(SilentReporter))
    }

    pub fn bootstrap_service(&self) -> BootstrapService {
        BootstrapService::new(
            self.fs.clone(),
            self.cmd.clone(),
            self.pauser.clone(),
            self.reporter.clone(),
            self.settings.clone(),
        )
    }

    pub fn history_service(&self, base_dir: &Path) -> HistoryService {
        HistoryService::new(self.fs.clone(), base_dir)
    }
}

/// Pauser matching the configured mode.
pub fn pauser_for(mode: PauseMode) -> Arc<dyn Pauser> {
    match mode {
        PauseMode::Auto => Arc::new(ConsolePauser {
            only_on_terminal: true,
        }),
        PauseMode::Always => Arc::new(ConsolePauser {
            only_on_terminal: false,
        }),
        PauseMode::Never => Arc::new(NoPause),
    }
}
