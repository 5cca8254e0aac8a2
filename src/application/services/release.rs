//! Publish the companion tools package
//!
//! Rebuilds the sdist, uploads it to the configured package index and
//! upgrades the local installation to the published version.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{run_checked, run_checked_in};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::infrastructure::traits::{CommandRunner, FileSystem};

pub struct ReleaseService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
}

impl ReleaseService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { fs, cmd, settings }
    }

    /// Rebuild, upload and locally upgrade the tools package.
    pub fn update_tools(&self) -> ApplicationResult<()> {
        let tools_dir = self.settings.tools_path();
        if !self.fs.is_dir(&tools_dir) {
            return Err(ApplicationError::PathNotFound(tools_dir));
        }

        debug!("update-tools: building sdist in {}", tools_dir.display());
        run_checked_in(
            self.cmd.as_ref(),
            &tools_dir,
            "build tools sdist",
            &self.settings.tools.python,
            &["setup.py", "sdist"],
        )?;

        // twine gets explicit file arguments; there is no shell to
        // expand dist/*.
        let dist_dir = tools_dir.join("dist");
        let dist_files =
            self.fs
                .read_dir(&dist_dir)
                .map_err(|e| ApplicationError::OperationFailed {
                    context: format!("list sdist output: {}", dist_dir.display()),
                    source: Box::new(e),
                })?;
        if dist_files.is_empty() {
            return Err(ApplicationError::PathNotFound(dist_dir));
        }

        let mut args: Vec<String> = vec![
            "upload".into(),
            "-r".into(),
            self.settings.tools.repository.clone(),
        ];
        args.extend(
            dist_files
                .iter()
                .map(|p| p.to_str().unwrap_or_default().to_string()),
        );
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        debug!("update-tools: uploading {} file(s)", dist_files.len());
        run_checked_in(
            self.cmd.as_ref(),
            &tools_dir,
            "upload tools package",
            "twine",
            &arg_refs,
        )?;

        run_checked(
            self.cmd.as_ref(),
            "upgrade local tools install",
            &self.settings.tools.pip,
            &["install", "--upgrade", &self.settings.tools.package_name],
        )?;

        Ok(())
    }
}
