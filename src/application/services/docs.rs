//! Dependency snapshot for documentation
//!
//! Builds a throwaway virtualenv, installs the project into it, and
//! writes the resulting `pip freeze` output to the snapshot file.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::run_checked;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::infrastructure::traits::{CommandRunner, FileSystem};

pub struct DocsService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
}

impl DocsService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { fs, cmd, settings }
    }

    /// Rebuild the isolated environment and snapshot its dependency list.
    /// Returns the snapshot path.
    pub fn snapshot(&self) -> ApplicationResult<PathBuf> {
        let env_dir = self.settings.docs_env_path();
        if self.fs.exists(&env_dir) {
            debug!("docs: removing previous env {}", env_dir.display());
            self.fs
                .remove_dir_all(&env_dir)
                .map_err(|e| ApplicationError::OperationFailed {
                    context: format!("remove previous docs env: {}", env_dir.display()),
                    source: Box::new(e),
                })?;
        }

        let env_str = env_dir.to_str().unwrap_or_default();
        run_checked(
            self.cmd.as_ref(),
            "create docs virtualenv",
            &self.settings.tools.python,
            &["-m", "venv", env_str],
        )?;

        let pip = env_dir.join("bin").join("pip");
        let pip_str = pip.to_str().unwrap_or_default();
        let project_str = self.settings.project_dir.to_str().unwrap_or_default();
        run_checked(
            self.cmd.as_ref(),
            "install project into docs env",
            pip_str,
            &["install", "-e", project_str],
        )?;

        let freeze = run_checked(self.cmd.as_ref(), "freeze dependency list", pip_str, &["freeze"])?;
        let requirements = String::from_utf8_lossy(&freeze.stdout).to_string();

        let snapshot = self.settings.requirements_path();
        self.fs
            .ensure_parent(&snapshot)
            .and_then(|_| self.fs.write(&snapshot, &requirements))
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("write dependency snapshot: {}", snapshot.display()),
                source: Box::new(e),
            })?;

        debug!("docs: snapshot written to {}", snapshot.display());
        Ok(snapshot)
    }
}
