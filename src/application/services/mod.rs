//! Application services

pub mod build;
pub mod deploy;
pub mod docs;
pub mod release;
pub mod setup;
pub mod vm;

pub use build::BuildService;
pub use deploy::DeployService;
pub use docs::DocsService;
pub use release::ReleaseService;
pub use setup::SetupService;
pub use vm::VmService;

use std::path::Path;
use std::process::Output;

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::CommandRunner;
use crate::infrastructure::InfraError;

/// Run an external command, mapping spawn failures and non-zero exits
/// to application errors carrying the tool's stderr.
pub(crate) fn run_checked(
    cmd: &dyn CommandRunner,
    context: &str,
    program: &str,
    args: &[&str],
) -> ApplicationResult<Output> {
    let result = cmd
        .run(program, args)
        .map_err(|e| ApplicationError::OperationFailed {
            context: format!("run {}: {}", program, context),
            source: Box::new(e),
        })?;
    ensure_success(context, program, result)
}

/// Like [`run_checked`], with an explicit working directory.
pub(crate) fn run_checked_in(
    cmd: &dyn CommandRunner,
    dir: &Path,
    context: &str,
    program: &str,
    args: &[&str],
) -> ApplicationResult<Output> {
    let result = cmd
        .run_in(dir, program, args)
        .map_err(|e| ApplicationError::OperationFailed {
            context: format!("run {}: {}", program, context),
            source: Box::new(e),
        })?;
    ensure_success(context, program, result)
}

fn ensure_success(context: &str, program: &str, output: Output) -> ApplicationResult<Output> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(ApplicationError::OperationFailed {
        context: format!("{}: {}", context, stderr.trim()),
        source: Box::new(InfraError::Command {
            program: program.to_string(),
            message: stderr.to_string(),
            exit_code: output.status.code(),
        }),
    })
}
