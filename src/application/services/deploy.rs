//! Push the bundled artifact onto the running appliance
//!
//! Delegates the transfer to the remote install tool over the
//! forwarded SSH port, then removes the local package file so a stale
//! build is never installed twice.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::run_checked;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::infrastructure::traits::{CommandRunner, FileSystem};

/// Remote installation service.
pub struct DeployService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
}

impl DeployService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { fs, cmd, settings }
    }

    /// Install the artifact onto the appliance. Returns the path of the
    /// package file that was pushed and removed.
    pub fn install(&self) -> ApplicationResult<PathBuf> {
        let artifact = self.settings.artifact_path();
        if !self.fs.is_file(&artifact) {
            return Err(ApplicationError::ArtifactMissing(artifact));
        }

        let tool = &self.settings.tools.remote_installer;
        if self.cmd.lookup(tool).is_none() {
            return Err(ApplicationError::ToolMissing {
                tool: tool.clone(),
                hint: "run `applab setup`".into(),
            });
        }

        let target = format!(
            "ssh://{}@localhost:{}",
            self.settings.vm.ssh_user, self.settings.ports.ssh.host
        );
        let artifact_str = artifact.to_str().unwrap_or_default();

        debug!("install: pushing {} to {}", artifact.display(), target);
        run_checked(
            self.cmd.as_ref(),
            "push artifact to appliance",
            tool,
            &["--url", &target, "install", artifact_str],
        )?;

        self.fs
            .remove_file(&artifact)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("remove local package: {}", artifact.display()),
                source: Box::new(e),
            })?;

        debug!("install: done, removed {}", artifact.display());
        Ok(artifact)
    }
}
