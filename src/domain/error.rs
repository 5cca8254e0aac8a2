//! Domain-level errors

use thiserror::Error;

/// Errors arising from domain entities themselves.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid launch record: {0}")]
    InvalidLaunchRecord(String),
}

/// Result type for domain layer operations.
pub type DomainResult<T> = Result<T, DomainError>;
