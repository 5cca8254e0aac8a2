//! One-time host provisioning
//!
//! Installs the VM launcher if missing, downloads and decompresses the
//! base disk image if missing, and installs the remote-install tooling
//! if missing. Every step is conditional; a fully provisioned host is
//! a no-op.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::application::hash::file_hash;
use crate::application::services::run_checked;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::infrastructure::traits::{CommandRunner, FileSystem};

/// Which provisioning actions actually ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub launcher_installed: bool,
    pub image_downloaded: bool,
    pub tools_installed: bool,
}

/// Host provisioning service.
pub struct SetupService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
}

impl SetupService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { fs, cmd, settings }
    }

    /// Provision the host, skipping whatever is already present.
    pub fn setup(&self) -> ApplicationResult<SetupReport> {
        let mut report = SetupReport::default();

        if self.cmd.lookup(&self.settings.vm.launcher).is_none() {
            self.install_launcher()?;
            report.launcher_installed = true;
        }

        if !self.fs.is_file(&self.settings.image_path()) {
            self.download_image()?;
            report.image_downloaded = true;
        }

        if self.cmd.lookup(&self.settings.tools.remote_installer).is_none() {
            self.install_remote_tools()?;
            report.tools_installed = true;
        }

        Ok(report)
    }

    fn install_launcher(&self) -> ApplicationResult<()> {
        let install = &self.settings.vm.launcher_install;
        let program = install.first().ok_or_else(|| ApplicationError::Config {
            message: "vm.launcher_install is empty".into(),
        })?;
        let args: Vec<&str> = install[1..].iter().map(String::as_str).collect();

        debug!("setup: installing launcher via {}", install.join(" "));
        run_checked(self.cmd.as_ref(), "install VM launcher", program, &args)?;
        Ok(())
    }

    /// Download the xz-compressed image, verify it when a checksum is
    /// configured, then decompress in place.
    fn download_image(&self) -> ApplicationResult<()> {
        let image = self.settings.image_path();
        let archive = archive_path(&image);
        let url = &self.settings.vm.image_url;

        self.fs
            .ensure_parent(&image)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("create image directory for {}", image.display()),
                source: Box::new(e),
            })?;

        debug!("setup: downloading {} -> {}", url, archive.display());
        let archive_str = archive.to_str().unwrap_or_default();
        run_checked(
            self.cmd.as_ref(),
            "download disk image",
            "wget",
            &["-O", archive_str, url],
        )?;

        if let Some(expected) = &self.settings.vm.image_sha256 {
            let actual = file_hash(&archive)?;
            if !actual.eq_ignore_ascii_case(expected) {
                // Do not leave a corrupt download behind.
                let _ = self.fs.remove_file(&archive);
                return Err(ApplicationError::ChecksumMismatch {
                    path: archive,
                    expected: expected.clone(),
                    actual,
                });
            }
            debug!("setup: checksum verified for {}", archive.display());
        }

        run_checked(
            self.cmd.as_ref(),
            "decompress disk image",
            "unxz",
            &[archive_str],
        )?;
        Ok(())
    }

    fn install_remote_tools(&self) -> ApplicationResult<()> {
        let package = &self.settings.tools.package_name;
        debug!("setup: installing remote tools package {}", package);
        run_checked(
            self.cmd.as_ref(),
            "install remote tools",
            &self.settings.tools.pip,
            &["install", package],
        )?;
        Ok(())
    }
}

/// The downloaded archive sits next to the final image with `.xz` appended.
fn archive_path(image: &std::path::Path) -> PathBuf {
    let mut os = image.as_os_str().to_os_string();
    os.push(".xz");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn given_image_path_when_archive_path_then_xz_appended() {
        let archive = archive_path(Path::new("/tmp/appliance.img"));
        assert_eq!(archive, PathBuf::from("/tmp/appliance.img.xz"));
    }
}
