//! Container deployment executor
//!
//! Converges the running container set to the compose descriptor in the
//! working copy: changed images are rebuilt, changed containers are
//! replaced, unrelated containers are left alone.

use tracing::{debug, info};

use crate::errors::DeployerError;
use crate::exec::Runner;
use crate::layout::DeployLayout;

/// Rebuild and (re)start the application containers
pub async fn build_and_start(runner: &Runner, layout: &DeployLayout) -> Result<(), DeployerError> {
    let working_copy = layout.working_copy();
    if !tokio::fs::try_exists(&working_copy).await? {
        return Err(DeployerError::DeployError(format!(
            "working copy does not exist: {}",
            working_copy.display()
        )));
    }

    // The synchronizer may have fetched a commit that reset permissions
    restore_update_script_permission(layout).await?;

    debug!("running docker compose up -d --build");
    runner
        .run_in(
            &working_copy,
            "build and start containers",
            "docker",
            &["compose", "up", "-d", "--build"],
        )
        .await?;

    info!("container set converged to the working copy");
    Ok(())
}

/// Re-set the executable bit on the update script in the working copy
async fn restore_update_script_permission(layout: &DeployLayout) -> Result<(), DeployerError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let script = layout.update_script();
        let meta = tokio::fs::metadata(&script).await?;
        let mut perms = meta.permissions();
        perms.set_mode(0o755);
        tokio::fs::set_permissions(&script, perms).await?;
    }
    Ok(())
}

/// Remove dangling images, stopped containers, and unused networks.
///
/// Unconditional and non-selective; the coarse retention policy bounds
/// disk growth between updates.
pub async fn prune_dangling(runner: &Runner) -> Result<(), DeployerError> {
    runner
        .run(
            "prune dangling artifacts",
            "docker",
            &["system", "prune", "-f"],
        )
        .await
}

/// List running application containers matching the name filter
pub async fn list_running(runner: &Runner, filter: &str) -> Result<String, DeployerError> {
    let name_filter = format!("name={}", filter);
    runner
        .capture(
            "list running containers",
            "docker",
            &[
                "ps",
                "--filter",
                &name_filter,
                "--format",
                "table {{.Names}}\t{{.Status}}\t{{.Ports}}",
            ],
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::probe::{HostProfile, OsFamily};

    #[tokio::test]
    async fn test_missing_working_copy_is_a_deploy_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DeployLayout::new(dir.path());
        let runner = Runner::for_host(&HostProfile {
            os_id: OsFamily::Debian,
            codename: "bookworm".to_string(),
            is_privileged: true,
        });

        let err = build_and_start(&runner, &layout).await.unwrap_err();
        assert!(matches!(err, DeployerError::DeployError(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_update_script_permission_is_restored() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let layout = DeployLayout::new(dir.path());
        let script = layout.update_script();
        tokio::fs::create_dir_all(script.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&script, "#!/bin/sh\n").await.unwrap();

        let mut perms = tokio::fs::metadata(&script).await.unwrap().permissions();
        perms.set_mode(0o644);
        tokio::fs::set_permissions(&script, perms).await.unwrap();

        restore_update_script_permission(&layout).await.unwrap();

        let mode = tokio::fs::metadata(&script).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
