//! Command dispatch: one routine per subcommand

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands};
use crate::cli::output;
use crate::cli::CliResult;
use crate::config::Settings;
use crate::domain::VmStatus;
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let command = match &cli.command {
        Some(command) => command,
        None => return Ok(()),
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| {
            crate::infrastructure::InfraError::io("determine current directory", e)
        })?,
    };

    let settings = Settings::load(&project_dir)?;
    debug!("project_dir: {}", settings.project_dir.display());
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Build => _build(&container),
        Commands::Run => _run(&container),
        Commands::Install => _install(&container),
        Commands::Setup => _setup(&container),
        Commands::Up => _up(&container),
        Commands::Down => _down(&container),
        Commands::Connect => _connect(&container),
        Commands::Docs => _docs(&container),
        Commands::UpdateTools => _update_tools(&container),
        Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(skip(container))]
fn _build(container: &ServiceContainer) -> CliResult<()> {
    container.build_service().build()?;
    output::success(&format!(
        "built {}",
        container.settings.artifact_path().display()
    ));
    Ok(())
}

#[instrument(skip(container))]
fn _run(container: &ServiceContainer) -> CliResult<()> {
    let code = container.build_service().run()?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _install(container: &ServiceContainer) -> CliResult<()> {
    let pushed = container.deploy_service().install()?;
    output::success(&format!("installed {} onto the appliance", pushed.display()));
    output::detail(&"local package removed");
    Ok(())
}

#[instrument(skip(container))]
fn _setup(container: &ServiceContainer) -> CliResult<()> {
    let report = container.setup_service().setup()?;
    if report.launcher_installed {
        output::action("installed", &container.settings.vm.launcher);
    }
    if report.image_downloaded {
        output::action(
            "downloaded",
            &container.settings.image_path().display().to_string(),
        );
    }
    if report.tools_installed {
        output::action("installed", &container.settings.tools.remote_installer);
    }
    if report == Default::default() {
        output::info(&"host already provisioned, nothing to do");
    }
    Ok(())
}

#[instrument(skip(container))]
fn _up(container: &ServiceContainer) -> CliResult<()> {
    let record = container.vm_service().up()?;
    output::success(&format!("VM running (pid {})", record.pid));
    for fwd in container.settings.ports.forwards() {
        output::detail(&fwd);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _down(container: &ServiceContainer) -> CliResult<()> {
    let report = container.vm_service().down()?;
    if !report.killed {
        output::warning(&format!(
            "process {} was already gone, removed stale record",
            report.record.pid
        ));
    }
    output::success(&format!("VM stopped (pid {})", report.record.pid));
    Ok(())
}

#[instrument(skip(container))]
fn _connect(container: &ServiceContainer) -> CliResult<()> {
    if let VmStatus::Running(record) = container.vm_service().status()? {
        output::info(&format!(
            "connecting to appliance started {} (password: {})",
            record.started_at, container.settings.vm.ssh_password
        ));
    }
    let code = container.vm_service().connect()?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _docs(container: &ServiceContainer) -> CliResult<()> {
    let snapshot = container.docs_service().snapshot()?;
    output::success(&format!("dependency snapshot at {}", snapshot.display()));
    Ok(())
}

#[instrument(skip(container))]
fn _update_tools(container: &ServiceContainer) -> CliResult<()> {
    container.release_service().update_tools()?;
    output::success(&format!(
        "{} uploaded and local install upgraded",
        container.settings.tools.package_name
    ));
    Ok(())
}
