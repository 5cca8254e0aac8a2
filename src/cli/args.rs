//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Appliance lab: build, boot, and deploy a package onto a local virtual appliance
#[derive(Parser, Debug)]
#[command(name = "applab")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Raise log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the bundled artifact and the vendored network utility
    Build,

    /// Execute the bundled artifact directly
    Run,

    /// Push the artifact onto the running appliance
    Install,

    /// Provision the host: launcher, disk image, remote tooling
    Setup,

    /// Launch the appliance VM with port forwarding
    Up,

    /// Terminate the appliance VM
    Down,

    /// Open an SSH session to the running appliance
    Connect,

    /// Snapshot the project dependency list for documentation
    Docs,

    /// Rebuild, upload and upgrade the companion tools package
    UpdateTools,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
