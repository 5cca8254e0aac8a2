//! applab: build, boot, and deploy a package onto a local virtual appliance
//!
//! Layered like a classic CLI dev tool: `domain` holds the lifecycle
//! entities, `application` the per-subcommand services, `infrastructure`
//! the I/O boundary traits and wiring, `cli` the argument surface.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
