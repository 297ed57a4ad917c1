//! Source synchronization
//!
//! Establishes or updates the application working copy. An existing
//! directory is fast-forwarded in place; divergent local history is a
//! hard failure with no automatic resolution. A missing directory is
//! cloned fresh with the selected authentication method.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::errors::DeployerError;
use crate::exec::{command, run_checked};
use crate::layout::DeployLayout;
use crate::settings::Settings;

/// What the synchronizer will do, decided from directory presence alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// No working copy yet: clone fresh
    Clone,

    /// Working copy present: fetch and fast-forward in place
    FastForward,
}

/// Pure decision for the working-copy state
pub fn sync_action(working_copy_exists: bool) -> SyncAction {
    if working_copy_exists {
        SyncAction::FastForward
    } else {
        SyncAction::Clone
    }
}

/// Authentication method for a fresh clone
///
/// The token variant never embeds the secret in the clone URL; it is
/// handed to git through an environment-scoped credential helper so it
/// stays out of process arguments and shell history.
pub enum AuthMethod {
    /// Unauthenticated public HTTPS URL
    Public,

    /// SSH remote using the deploy key
    Ssh,

    /// HTTPS with an access token
    Token(SecretString),
}

impl AuthMethod {
    pub fn describe(&self) -> &'static str {
        match self {
            AuthMethod::Public => "public URL",
            AuthMethod::Ssh => "deploy key over SSH",
            AuthMethod::Token(_) => "access token",
        }
    }
}

/// Inline git credential helper reading the token from the environment
pub const TOKEN_HELPER: &str =
    r#"!f() { echo "username=x-access-token"; echo "password=${GIT_TOKEN}"; }; f"#;

/// SSH command pinning git to the deploy key
pub fn ssh_command(key_path: &Path) -> String {
    format!(
        "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
        key_path.display()
    )
}

/// Ensure the working copy exists on the latest commit of the tracked
/// branch; returns the action that was performed
pub async fn sync_source(
    layout: &DeployLayout,
    settings: &Settings,
    auth: &AuthMethod,
) -> Result<SyncAction, DeployerError> {
    let target = layout.working_copy();
    let action = sync_action(tokio::fs::try_exists(&target).await?);

    match action {
        SyncAction::FastForward => {
            debug!("working copy exists, fast-forwarding in place");
            let mut cmd = command("git", &["pull", "--ff-only", "origin", &settings.branch]);
            cmd.current_dir(&target);
            run_checked("fast-forward working copy", &mut cmd).await?;
            info!("working copy fast-forwarded to origin/{}", settings.branch);
        }
        SyncAction::Clone => {
            debug!("no working copy, cloning via {}", auth.describe());
            clone_fresh(layout, settings, auth).await?;
            info!("cloned working copy to {}", target.display());
        }
    }

    Ok(action)
}

async fn clone_fresh(
    layout: &DeployLayout,
    settings: &Settings,
    auth: &AuthMethod,
) -> Result<(), DeployerError> {
    let target = layout.working_copy();
    let target_arg = target.to_string_lossy().into_owned();

    let mut cmd = match auth {
        AuthMethod::Public => command(
            "git",
            &[
                "clone",
                "--branch",
                &settings.branch,
                &settings.repo_url,
                &target_arg,
            ],
        ),
        AuthMethod::Ssh => {
            let mut cmd = command(
                "git",
                &[
                    "clone",
                    "--branch",
                    &settings.branch,
                    &settings.repo_ssh_url,
                    &target_arg,
                ],
            );
            cmd.env("GIT_SSH_COMMAND", ssh_command(&layout.deploy_key()));
            cmd
        }
        AuthMethod::Token(token) => {
            let helper = format!("credential.helper={}", TOKEN_HELPER);
            let mut cmd = command(
                "git",
                &[
                    "-c",
                    &helper,
                    "clone",
                    "--branch",
                    &settings.branch,
                    &settings.repo_url,
                    &target_arg,
                ],
            );
            cmd.env("GIT_TOKEN", token.expose_secret());
            cmd
        }
    };

    run_checked("clone working copy", &mut cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_decides_the_action() {
        assert_eq!(sync_action(false), SyncAction::Clone);
        assert_eq!(sync_action(true), SyncAction::FastForward);
    }

    #[test]
    fn test_token_helper_reads_from_environment_only() {
        // The helper must reference the environment variable, so the
        // secret never appears in process arguments
        assert!(TOKEN_HELPER.contains("${GIT_TOKEN}"));
        assert!(!TOKEN_HELPER.contains("https://"));
    }

    #[test]
    fn test_ssh_command_pins_the_deploy_key() {
        let cmd = ssh_command(Path::new("/home/deploy/.ssh/prism_deploy"));
        assert!(cmd.contains("-i /home/deploy/.ssh/prism_deploy"));
        assert!(cmd.contains("IdentitiesOnly=yes"));
    }

    #[tokio::test]
    async fn test_diverged_history_fails_without_mutation() {
        // A directory that is not a repository makes the fast-forward
        // path fail; the directory contents are left untouched
        let dir = tempfile::tempdir().unwrap();
        let layout = DeployLayout::new(dir.path());
        tokio::fs::create_dir_all(layout.working_copy())
            .await
            .unwrap();
        let marker = layout.working_copy().join("marker.txt");
        tokio::fs::write(&marker, "local state").await.unwrap();

        let settings = Settings::default();
        let err = sync_source(&layout, &settings, &AuthMethod::Public)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployerError::CommandFailed { .. }));

        let contents = tokio::fs::read_to_string(&marker).await.unwrap();
        assert_eq!(contents, "local state");
    }
}
