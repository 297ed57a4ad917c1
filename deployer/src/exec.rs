//! External command execution
//!
//! Every environment mutation goes through an external process. Commands
//! run sequentially and block the orchestrator until they finish; a
//! non-zero exit is fatal and carries the child's exit code.

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::errors::DeployerError;
use crate::host::probe::HostProfile;

/// Build a command without elevation
pub fn command(program: &str, args: &[&str]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd
}

/// Run a command to completion, mapping a non-zero exit to an error
pub async fn run_checked(action: &str, cmd: &mut Command) -> Result<(), DeployerError> {
    debug!("running: {}", action);
    let status = cmd
        .status()
        .await
        .map_err(|e| DeployerError::CommandSpawn {
            action: action.to_string(),
            source: e,
        })?;

    if !status.success() {
        return Err(DeployerError::CommandFailed {
            action: action.to_string(),
            code: status.code().unwrap_or(1),
        });
    }
    Ok(())
}

/// Run a command and capture its stdout as a string
pub async fn capture_stdout(action: &str, cmd: &mut Command) -> Result<String, DeployerError> {
    debug!("running: {}", action);
    let output = cmd
        .output()
        .await
        .map_err(|e| DeployerError::CommandSpawn {
            action: action.to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(DeployerError::CommandFailed {
            action: action.to_string(),
            code: output.status.code().unwrap_or(1),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Runner for privileged operations
///
/// Prefixes commands with `sudo` when the invoking user is not root, so
/// the same step list runs unmodified either way.
#[derive(Debug, Clone, Copy)]
pub struct Runner {
    elevate: bool,
}

impl Runner {
    /// Create a runner with explicit elevation
    pub fn new(elevate: bool) -> Self {
        Self { elevate }
    }

    /// Elevation derived from the probed host profile
    pub fn for_host(profile: &HostProfile) -> Self {
        Self::new(!profile.is_privileged)
    }

    pub fn is_elevated(&self) -> bool {
        self.elevate
    }

    /// Build a command, prefixed with `sudo` when elevation is needed
    pub fn command(&self, program: &str, args: &[&str]) -> Command {
        if self.elevate {
            let mut cmd = Command::new("sudo");
            cmd.arg(program);
            cmd.args(args);
            cmd
        } else {
            command(program, args)
        }
    }

    /// Run a command to completion under the elevation rule
    pub async fn run(
        &self,
        action: &str,
        program: &str,
        args: &[&str],
    ) -> Result<(), DeployerError> {
        run_checked(action, &mut self.command(program, args)).await
    }

    /// Run a command with a working directory under the elevation rule
    pub async fn run_in(
        &self,
        dir: &Path,
        action: &str,
        program: &str,
        args: &[&str],
    ) -> Result<(), DeployerError> {
        let mut cmd = self.command(program, args);
        cmd.current_dir(dir);
        run_checked(action, &mut cmd).await
    }

    /// Capture stdout under the elevation rule
    pub async fn capture(
        &self,
        action: &str,
        program: &str,
        args: &[&str],
    ) -> Result<String, DeployerError> {
        capture_stdout(action, &mut self.command(program, args)).await
    }
}
