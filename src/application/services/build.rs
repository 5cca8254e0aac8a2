//! Build and run the bundled artifact
//!
//! `build` delegates the heavy lifting to the configured packaging tool
//! and compiles the vendored network utility into the output layout.
//! `run` executes the artifact directly with inherited stdio.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::run_checked_in;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::infrastructure::traits::{CommandRunner, FileSystem};

/// Packaging and artifact execution service.
pub struct BuildService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
}

impl BuildService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { fs, cmd, settings }
    }

    /// Build the bundled artifact.
    ///
    /// 1. Remove stale build directories and any previous artifact.
    /// 2. Run `<packager> clean`, then `<packager>`.
    /// 3. Compile the vendored network utility with make and copy its
    ///    binary into the output layout.
    pub fn build(&self) -> ApplicationResult<()> {
        self.clean()?;

        let project = &self.settings.project_dir;
        let packager = &self.settings.build.packager;

        debug!("build: invoking packager {}", packager);
        run_checked_in(self.cmd.as_ref(), project, "clean packaging state", packager, &["clean"])?;
        run_checked_in(self.cmd.as_ref(), project, "package project", packager, &[])?;

        self.build_utility()?;
        Ok(())
    }

    /// Remove stale build directories and a previous artifact, if present.
    fn clean(&self) -> ApplicationResult<()> {
        for dir in &self.settings.build.clean_dirs {
            let path = self.settings.project_dir.join(dir);
            if self.fs.exists(&path) {
                debug!("build: removing stale dir {}", path.display());
                self.fs
                    .remove_dir_all(&path)
                    .map_err(|e| ApplicationError::OperationFailed {
                        context: format!("remove stale build dir: {}", path.display()),
                        source: Box::new(e),
                    })?;
            }
        }

        let artifact = self.settings.artifact_path();
        if self.fs.is_file(&artifact) {
            debug!("build: removing stale artifact {}", artifact.display());
            self.fs
                .remove_file(&artifact)
                .map_err(|e| ApplicationError::OperationFailed {
                    context: format!("remove stale artifact: {}", artifact.display()),
                    source: Box::new(e),
                })?;
        }

        Ok(())
    }

    /// Compile the vendored utility and copy its binary into the output layout.
    fn build_utility(&self) -> ApplicationResult<()> {
        let utility_dir = self
            .settings
            .project_dir
            .join(&self.settings.build.utility_dir);
        if !self.fs.is_dir(&utility_dir) {
            return Err(ApplicationError::PathNotFound(utility_dir));
        }

        debug!("build: compiling utility in {}", utility_dir.display());
        run_checked_in(
            self.cmd.as_ref(),
            &utility_dir,
            "compile bundled utility",
            "make",
            &[],
        )?;

        let source = self.settings.utility_source_path();
        let dest = self.settings.utility_dest_path();
        if !self.fs.is_file(&source) {
            return Err(ApplicationError::PathNotFound(source));
        }

        self.fs
            .ensure_parent(&dest)
            .and_then(|_| self.fs.copy(&source, &dest).map(|_| ()))
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("install utility binary to {}", dest.display()),
                source: Box::new(e),
            })?;

        debug!("build: utility installed at {}", dest.display());
        Ok(())
    }

    /// Execute the bundled artifact directly. Returns its exit code.
    pub fn run(&self) -> ApplicationResult<i32> {
        let artifact = self.settings.artifact_path();
        if !self.fs.is_file(&artifact) {
            return Err(ApplicationError::ArtifactMissing(artifact));
        }

        debug!("run: executing {}", artifact.display());
        let artifact_str = artifact.to_str().unwrap_or_default();
        let status = self
            .cmd
            .run_interactive(artifact_str, &[])
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("execute artifact: {}", artifact.display()),
                source: Box::new(e),
            })?;

        Ok(status.code().unwrap_or(0))
    }
}
