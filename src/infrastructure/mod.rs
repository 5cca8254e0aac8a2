//! Infrastructure layer: I/O boundaries and wiring

pub mod di;
pub mod error;
pub mod traits;

pub use error::{InfraError, InfraResult};
