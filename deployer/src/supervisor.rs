//! In-container process supervisor
//!
//! Launches the webhook API detached and the dashboard in the
//! foreground. The dashboard's lifetime is the container's lifetime: a
//! single liveness anchor, not a multi-process manager.

use tokio::process::Command;
use tracing::{info, warn};

use crate::errors::DeployerError;
use crate::settings::SupervisorSettings;

/// What happens when the detached webhook process exits.
///
/// The policy is an explicit seam: today the only variant records the
/// exit without relaunching, and the dashboard remains the sole
/// liveness anchor. A restart variant slots in here without
/// restructuring the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebhookExitPolicy {
    /// Log the exit and keep the container alive on the dashboard alone
    #[default]
    LogOnly,
}

/// Split a configured command into program and arguments
pub fn split_command(command: &[String]) -> Result<(&String, &[String]), DeployerError> {
    match command.split_first() {
        Some(split) => Ok(split),
        None => Err(DeployerError::SupervisorError(
            "empty process command".to_string(),
        )),
    }
}

/// Run both application processes; returns the dashboard's exit code
pub async fn supervise(
    settings: &SupervisorSettings,
    policy: WebhookExitPolicy,
) -> Result<i32, DeployerError> {
    // Webhook first, fire-and-forget: no readiness wait, no ordering
    // guarantee against the dashboard
    let (program, args) = split_command(&settings.webhook_command)?;
    let mut webhook = Command::new(program)
        .args(args)
        .spawn()
        .map_err(|e| DeployerError::SupervisorError(format!("failed to launch webhook: {}", e)))?;
    info!("webhook process launched (detached)");

    tokio::spawn(async move {
        match webhook.wait().await {
            Ok(status) => match policy {
                WebhookExitPolicy::LogOnly => {
                    warn!("webhook process exited with {}; not relaunching", status)
                }
            },
            Err(e) => warn!("failed to wait on webhook process: {}", e),
        }
    });

    // Dashboard in the foreground; its exit ends the container
    let (program, args) = split_command(&settings.dashboard_command)?;
    info!("dashboard process starting (foreground)");
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| DeployerError::SupervisorError(format!("failed to launch dashboard: {}", e)))?;

    info!("dashboard process exited with {}", status);
    Ok(status.code().unwrap_or(1))
}
