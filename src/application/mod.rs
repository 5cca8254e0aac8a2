//! Application layer: one service per subcommand concern

pub mod error;
pub mod hash;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
