//! Core entities for the appliance VM lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// A host-to-guest TCP port forward for the appliance VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortForward {
    /// Port opened on the host (localhost).
    pub host: u16,
    /// Port the guest listens on.
    pub guest: u16,
}

impl PortForward {
    pub const fn new(host: u16, guest: u16) -> Self {
        Self { host, guest }
    }
}

impl fmt::Display for PortForward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.host, self.guest)
    }
}

/// Launch record written when the appliance VM is started.
///
/// Presence of the record file is the single source of truth for
/// "a VM is running"; the content adds the pid needed to stop it and
/// the start time for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRecord {
    /// Process id of the detached VM launcher.
    pub pid: u32,
    /// UTC timestamp of the launch.
    pub started_at: DateTime<Utc>,
}

impl LaunchRecord {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            started_at: Utc::now(),
        }
    }

    /// Serialize for the sentinel file.
    pub fn to_toml(&self) -> DomainResult<String> {
        toml::to_string(self).map_err(|e| DomainError::InvalidLaunchRecord(e.to_string()))
    }

    /// Parse the sentinel file content. A malformed record is an error,
    /// not silently treated as "not running".
    pub fn from_toml(content: &str) -> DomainResult<Self> {
        toml::from_str(content).map_err(|e| DomainError::InvalidLaunchRecord(e.to_string()))
    }
}

/// Observed lifecycle state of the appliance VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmStatus {
    /// A launch record exists on disk.
    Running(LaunchRecord),
    /// No launch record exists.
    NotRunning,
}
