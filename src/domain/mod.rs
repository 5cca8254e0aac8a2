//! Domain layer: appliance lifecycle entities
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;

pub use entities::{LaunchRecord, PortForward, VmStatus};
pub use error::DomainError;
