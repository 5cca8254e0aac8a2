//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/applab/applab.toml`
//! 3. Local config: `<project_dir>/.applab.toml`
//! 4. Environment variables: `APPLAB_*` prefix (separator `__`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::PortForward;

/// Virtual appliance configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VmConfig {
    /// Download URL for the xz-compressed base disk image
    pub image_url: String,
    /// Expected SHA-256 of the downloaded archive (verification skipped if unset)
    pub image_sha256: Option<String>,
    /// Disk image location, relative to the project directory
    pub image_file: PathBuf,
    /// VM launcher binary (user-mode networking capable)
    pub launcher: String,
    /// Command run by `setup` when the launcher is missing
    pub launcher_install: Vec<String>,
    /// Memory allocation in megabytes
    pub memory_mb: u32,
    /// Number of virtual CPUs
    pub cpus: u32,
    /// SSH user of the demo appliance
    pub ssh_user: String,
    /// SSH password of the demo appliance
    pub ssh_password: String,
    /// Launch record sentinel, relative to the project directory
    pub pid_file: PathBuf,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            image_url:
                "https://releases.ubuntu.com/appliance/appliance-core-amd64.img.xz".into(),
            image_sha256: None,
            image_file: PathBuf::from(".applab/appliance.img"),
            launcher: "kvm".into(),
            launcher_install: vec![
                "sudo".into(),
                "apt-get".into(),
                "install".into(),
                "-y".into(),
                "qemu-kvm".into(),
            ],
            memory_mb: 512,
            cpus: 1,
            ssh_user: "ubuntu".into(),
            ssh_password: "ubuntu".into(),
            pid_file: PathBuf::from(".applab/vm.pid"),
        }
    }
}

/// Host port forwards into the appliance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PortsConfig {
    /// Appliance HTTP API
    pub http: PortForward,
    /// Appliance SSH
    pub ssh: PortForward,
    /// Debug channel
    pub debug: PortForward,
    /// Auxiliary channel
    pub extra: PortForward,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            http: PortForward::new(8090, 80),
            ssh: PortForward::new(8022, 22),
            debug: PortForward::new(7777, 7777),
            extra: PortForward::new(9999, 9999),
        }
    }
}

impl PortsConfig {
    /// All forwards in launch-argument order.
    pub fn forwards(&self) -> [PortForward; 4] {
        [self.http, self.ssh, self.debug, self.extra]
    }
}

/// Packaging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// Packaging tool producing the bundled artifact
    pub packager: String,
    /// Bundled artifact path, relative to the project directory
    pub artifact: PathBuf,
    /// Stale build directories removed before packaging
    pub clean_dirs: Vec<PathBuf>,
    /// Vendored network utility source directory
    pub utility_dir: PathBuf,
    /// Utility binary produced by make, relative to `utility_dir`
    pub utility_binary: PathBuf,
    /// Destination of the utility binary inside the output layout
    pub utility_dest: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            packager: "snapcraft".into(),
            artifact: PathBuf::from("build/appliance.snap"),
            clean_dirs: vec![
                PathBuf::from("parts"),
                PathBuf::from("stage"),
                PathBuf::from("prime"),
            ],
            utility_dir: PathBuf::from("vendor/dnsmasq"),
            utility_binary: PathBuf::from("src/dnsmasq"),
            utility_dest: PathBuf::from("prime/bin/dnsmasq"),
        }
    }
}

/// External tooling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Remote install tool pushing artifacts onto the appliance
    pub remote_installer: String,
    /// Python interpreter for docs/release operations
    pub python: String,
    /// pip used for tool installation and self-upgrade
    pub pip: String,
    /// Isolated docs environment, relative to the project directory
    pub docs_env_dir: PathBuf,
    /// Dependency snapshot target, relative to the project directory
    pub requirements_file: PathBuf,
    /// Companion tools package directory, relative to the project directory
    pub tools_dir: PathBuf,
    /// Published name of the companion tools package
    pub package_name: String,
    /// Package index repository passed to the uploader
    pub repository: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            remote_installer: "snappy-remote".into(),
            python: "python3".into(),
            pip: "pip3".into(),
            docs_env_dir: PathBuf::from("buildenv/env"),
            requirements_file: PathBuf::from("docs/requirements.txt"),
            tools_dir: PathBuf::from("tools"),
            package_name: "applab-tools".into(),
            repository: "pypi".into(),
        }
    }
}

/// Unified configuration for applab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Project directory all relative paths resolve against (from CLI, not config)
    #[serde(skip)]
    pub project_dir: PathBuf,
    /// Virtual appliance settings
    pub vm: VmConfig,
    /// Port forwarding rules
    pub ports: PortsConfig,
    /// Packaging settings
    pub build: BuildConfig,
    /// External tooling settings
    pub tools: ToolsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            vm: VmConfig::default(),
            ports: PortsConfig::default(),
            build: BuildConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the XDG config directory for applab.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "applab").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("applab.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".applab.toml")
}

impl Settings {
    /// Load settings with layered precedence for the given project directory.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/applab/applab.toml`
    /// 3. Local config: `<project_dir>/.applab.toml`
    /// 4. Environment variables: `APPLAB_*` prefix
    pub fn load(project_dir: &Path) -> Result<Self, ApplicationError> {
        let mut builder = Config::builder();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        let local_path = local_config_path(project_dir);
        if local_path.exists() {
            builder = builder.add_source(File::from(local_path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("APPLAB")
                .separator("__")
                .list_separator(","),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        settings.project_dir = project_dir.to_path_buf();
        settings.expand_paths();

        Ok(settings)
    }

    /// Expand shell variables and tilde in path-like fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        self.project_dir = expand_path(&self.project_dir);
        self.vm.image_file = expand_path(&self.vm.image_file);
        self.vm.pid_file = expand_path(&self.vm.pid_file);
        self.build.artifact = expand_path(&self.build.artifact);
    }

    /// Bundled artifact location.
    pub fn artifact_path(&self) -> PathBuf {
        self.project_dir.join(&self.build.artifact)
    }

    /// Base disk image location.
    pub fn image_path(&self) -> PathBuf {
        self.project_dir.join(&self.vm.image_file)
    }

    /// Launch record sentinel location.
    pub fn pid_path(&self) -> PathBuf {
        self.project_dir.join(&self.vm.pid_file)
    }

    /// Compiled utility binary inside the vendored source tree.
    pub fn utility_source_path(&self) -> PathBuf {
        self.project_dir
            .join(&self.build.utility_dir)
            .join(&self.build.utility_binary)
    }

    /// Utility binary destination inside the output layout.
    pub fn utility_dest_path(&self) -> PathBuf {
        self.project_dir.join(&self.build.utility_dest)
    }

    /// Isolated docs environment location.
    pub fn docs_env_path(&self) -> PathBuf {
        self.project_dir.join(&self.tools.docs_env_dir)
    }

    /// Dependency snapshot location.
    pub fn requirements_path(&self) -> PathBuf {
        self.project_dir.join(&self.tools.requirements_file)
    }

    /// Companion tools package location.
    pub fn tools_path(&self) -> PathBuf {
        self.project_dir.join(&self.tools.tools_dir)
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(raw.as_ref()) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
