//! Shared test doubles and fixtures
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::Mutex;

use applab::config::Settings;
use applab::infrastructure::traits::CommandRunner;

/// Recorded invocation: program plus arguments.
pub type Call = (String, Vec<String>);

/// Mock command runner that records invocations instead of spawning.
#[derive(Default)]
pub struct MockCommandRunner {
    calls: Mutex<Vec<Call>>,
    /// Programs resolvable via `lookup`
    available: Vec<String>,
    /// Stdout returned for a given program basename
    stdout_for: HashMap<String, Vec<u8>>,
    /// Programs that exit non-zero, with the stderr they emit
    failure_for: HashMap<String, Vec<u8>>,
    /// Pid returned by `spawn_detached`
    pid: u32,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self {
            pid: 4242,
            ..Default::default()
        }
    }

    pub fn with_available(mut self, programs: &[&str]) -> Self {
        self.available = programs.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_stdout(mut self, program: &str, stdout: &str) -> Self {
        self.stdout_for
            .insert(program.to_string(), stdout.as_bytes().to_vec());
        self
    }

    /// Make a program exit non-zero with the given stderr.
    pub fn with_failure(mut self, program: &str, stderr: &str) -> Self {
        self.failure_for
            .insert(program.to_string(), stderr.as_bytes().to_vec());
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    /// All recorded invocations, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Program names of all recorded invocations, in order.
    pub fn called_programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|(p, _)| p).collect()
    }

    fn record(&self, cmd: &str, args: &[&str]) {
        self.calls
            .lock()
            .unwrap()
            .push((cmd.to_string(), args.iter().map(|a| a.to_string()).collect()));
    }

    fn basename(cmd: &str) -> String {
        Path::new(cmd)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    fn output(&self, cmd: &str) -> Output {
        let key = Self::basename(cmd);
        if let Some(stderr) = self.failure_for.get(&key) {
            return Output {
                // wait status: exit code 1
                status: ExitStatus::from_raw(256),
                stdout: Vec::new(),
                stderr: stderr.clone(),
            };
        }
        Output {
            status: ExitStatus::from_raw(0),
            stdout: self.stdout_for.get(&key).cloned().unwrap_or_default(),
            stderr: Vec::new(),
        }
    }

    fn status(&self, cmd: &str) -> ExitStatus {
        if self.failure_for.contains_key(&Self::basename(cmd)) {
            ExitStatus::from_raw(256)
        } else {
            ExitStatus::from_raw(0)
        }
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        self.record(cmd, args);
        Ok(self.output(cmd))
    }

    fn run_in(&self, _dir: &Path, cmd: &str, args: &[&str]) -> io::Result<Output> {
        self.record(cmd, args);
        Ok(self.output(cmd))
    }

    fn run_interactive(&self, cmd: &str, args: &[&str]) -> io::Result<ExitStatus> {
        self.record(cmd, args);
        Ok(self.status(cmd))
    }

    fn spawn_detached(&self, cmd: &str, args: &[&str]) -> io::Result<u32> {
        self.record(cmd, args);
        Ok(self.pid)
    }

    fn lookup(&self, program: &str) -> Option<PathBuf> {
        if self.available.iter().any(|p| p == program) {
            Some(PathBuf::from("/usr/bin").join(program))
        } else {
            None
        }
    }
}

/// Default settings rooted in a temporary project directory.
pub fn test_settings(project_dir: &Path) -> Settings {
    Settings {
        project_dir: project_dir.to_path_buf(),
        ..Settings::default()
    }
}
