//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{
    BuildService, DeployService, DocsService, ReleaseService, SetupService, VmService,
};
use crate::config::Settings;
use crate::infrastructure::traits::{CommandRunner, FileSystem, RealCommandRunner, RealFileSystem};

/// Container holding shared dependencies and service constructors.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(RealCommandRunner),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs, cmd }
    }

    pub fn build_service(&self) -> BuildService {
        BuildService::new(self.fs.clone(), self.cmd.clone(), self.settings.clone())
    }

    pub fn vm_service(&self) -> VmService {
        VmService::new(self.fs.clone(), self.cmd.clone(), self.settings.clone())
    }

    pub fn setup_service(&self) -> SetupService {
        SetupService::new(self.fs.clone(), self.cmd.clone(), self.settings.clone())
    }

    pub fn deploy_service(&self) -> DeployService {
        DeployService::new(self.fs.clone(), self.cmd.clone(), self.settings.clone())
    }

    pub fn docs_service(&self) -> DocsService {
        DocsService::new(self.fs.clone(), self.cmd.clone(), self.settings.clone())
    }

    pub fn release_service(&self) -> ReleaseService {
        ReleaseService::new(self.fs.clone(), self.cmd.clone(), self.settings.clone())
    }
}
