//! Appliance VM lifecycle over the launch-record sentinel
//!
//! `up` spawns the launcher detached and writes the record; `down`
//! kills the recorded pid and removes it; `connect` opens an
//! interactive SSH session through the forwarded port. Presence of the
//! record file is the sole source of truth for "VM running".

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{LaunchRecord, VmStatus};
use crate::infrastructure::traits::{CommandRunner, FileSystem};

/// Outcome of `down`, for user-facing reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownReport {
    /// The record that was removed.
    pub record: LaunchRecord,
    /// False when the kill failed (stale record, process already gone).
    pub killed: bool,
}

/// VM lifecycle service.
pub struct VmService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
}

impl VmService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { fs, cmd, settings }
    }

    /// Read the sentinel. Absence means not running; a malformed record
    /// is surfaced as an error rather than ignored.
    pub fn status(&self) -> ApplicationResult<VmStatus> {
        let pid_path = self.settings.pid_path();
        if !self.fs.exists(&pid_path) {
            return Ok(VmStatus::NotRunning);
        }

        let content =
            self.fs
                .read_to_string(&pid_path)
                .map_err(|e| ApplicationError::OperationFailed {
                    context: format!("read launch record: {}", pid_path.display()),
                    source: Box::new(e),
                })?;
        let record = LaunchRecord::from_toml(&content)?;
        Ok(VmStatus::Running(record))
    }

    /// Launch the appliance VM and write the launch record.
    pub fn up(&self) -> ApplicationResult<LaunchRecord> {
        if let VmStatus::Running(record) = self.status()? {
            return Err(ApplicationError::VmAlreadyRunning { pid: record.pid });
        }

        let image = self.settings.image_path();
        if !self.fs.is_file(&image) {
            return Err(ApplicationError::ImageMissing(image));
        }

        let launcher = &self.settings.vm.launcher;
        if self.cmd.lookup(launcher).is_none() {
            return Err(ApplicationError::ToolMissing {
                tool: launcher.clone(),
                hint: "run `applab setup`".into(),
            });
        }

        let args = build_launcher_args(&self.settings, &image);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        debug!("up: spawning {} {}", launcher, args.join(" "));
        let pid = self
            .cmd
            .spawn_detached(launcher, &arg_refs)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("spawn VM launcher: {}", launcher),
                source: Box::new(e),
            })?;

        let record = LaunchRecord::new(pid);
        let content = record.to_toml()?;
        let pid_path = self.settings.pid_path();
        self.fs
            .ensure_parent(&pid_path)
            .and_then(|_| self.fs.write(&pid_path, &content))
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("write launch record: {}", pid_path.display()),
                source: Box::new(e),
            })?;

        debug!("up: VM running with pid {}", pid);
        Ok(record)
    }

    /// Terminate the running VM and remove the sentinel.
    ///
    /// A failed kill (process already gone) is reported in the returned
    /// [`DownReport`] but never leaves a stale record behind.
    pub fn down(&self) -> ApplicationResult<DownReport> {
        let record = match self.status()? {
            VmStatus::Running(record) => record,
            VmStatus::NotRunning => return Err(ApplicationError::VmNotRunning),
        };

        let pid = record.pid.to_string();
        let killed = match self.cmd.run("kill", &[&pid]) {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                warn!(
                    "down: kill {} failed: {}",
                    pid,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                false
            }
            Err(e) => {
                warn!("down: could not run kill: {}", e);
                false
            }
        };

        let pid_path = self.settings.pid_path();
        self.fs
            .remove_file(&pid_path)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("remove launch record: {}", pid_path.display()),
                source: Box::new(e),
            })?;

        debug!("down: VM pid {} stopped (killed={})", record.pid, killed);
        Ok(DownReport { record, killed })
    }

    /// Open an interactive SSH session to the running appliance.
    /// Returns the session's exit code.
    pub fn connect(&self) -> ApplicationResult<i32> {
        if let VmStatus::NotRunning = self.status()? {
            return Err(ApplicationError::VmNotRunning);
        }

        let port = self.settings.ports.ssh.host.to_string();
        let target = format!("{}@localhost", self.settings.vm.ssh_user);
        // Throwaway appliance: relax host-key checking so rebuilt images
        // do not trip the known-hosts cache.
        let args = [
            "-p",
            port.as_str(),
            "-o",
            "StrictHostKeyChecking=no",
            "-o",
            "UserKnownHostsFile=/dev/null",
            target.as_str(),
        ];

        debug!("connect: ssh {}", args.join(" "));
        let status = self
            .cmd
            .run_interactive("ssh", &args)
            .map_err(|e| ApplicationError::OperationFailed {
                context: "open ssh session".into(),
                source: Box::new(e),
            })?;

        Ok(status.code().unwrap_or(0))
    }
}

/// Assemble the launcher command line: user-mode networking with the
/// configured host forwards, virtio disk, headless.
fn build_launcher_args(settings: &Settings, image: &Path) -> Vec<String> {
    let mut hostfwd = String::from("user,id=net0");
    for fwd in settings.ports.forwards() {
        hostfwd.push_str(&format!(",hostfwd=tcp::{}-:{}", fwd.host, fwd.guest));
    }

    vec![
        "-m".into(),
        settings.vm.memory_mb.to_string(),
        "-smp".into(),
        settings.vm.cpus.to_string(),
        "-netdev".into(),
        hostfwd,
        "-device".into(),
        "virtio-net-pci,netdev=net0".into(),
        "-drive".into(),
        format!("file={},format=raw,if=virtio", image.display()),
        "-display".into(),
        "none".into(),
    ]
}
