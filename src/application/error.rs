//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add precondition failures.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("bundled artifact not found: {0} (run `applab build` first)")]
    ArtifactMissing(PathBuf),

    #[error("disk image not found: {0} (run `applab setup` first)")]
    ImageMissing(PathBuf),

    #[error("a VM is already running (pid {pid}); run `applab down` first")]
    VmAlreadyRunning { pid: u32 },

    #[error("no VM is running; run `applab up` first")]
    VmNotRunning,

    #[error("required tool not found on PATH: {tool} ({hint})")]
    ToolMissing { tool: String, hint: String },

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("required path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
