//! Deploy key provisioning
//!
//! The key pair is created at most once per host: an existing private
//! key file gates generation on presence alone, never on content. The
//! private half stays on disk; it is only ever displayed for manual or
//! CI-secret copy.

use tracing::info;

use crate::errors::DeployerError;
use crate::exec::{command, run_checked};
use crate::layout::DeployLayout;

/// Whether a key pair should be generated, given private-key presence
pub fn should_generate(private_key_exists: bool) -> bool {
    !private_key_exists
}

/// Comment tagging generated keys with the deploying host
pub fn key_comment() -> String {
    let host = sysinfo::System::host_name().unwrap_or_else(|| "unknown".to_string());
    format!("prism-deploy@{}", host)
}

/// Result of ensuring the deploy key pair
#[derive(Debug, Clone)]
pub struct KeyProvision {
    /// Public key material for out-of-band registration
    pub public_key: String,

    /// Whether a new pair was generated this run
    pub created: bool,
}

/// Ensure exactly one deploy key pair exists, returning the public half
pub async fn ensure_deploy_key(layout: &DeployLayout) -> Result<KeyProvision, DeployerError> {
    tokio::fs::create_dir_all(layout.ssh_dir()).await?;

    let key_path = layout.deploy_key();
    let created = if tokio::fs::try_exists(&key_path).await? {
        info!("deploy key already present at {}", key_path.display());
        false
    } else {
        let key_arg = key_path.to_string_lossy().into_owned();
        run_checked(
            "generate deploy key",
            &mut command(
                "ssh-keygen",
                &[
                    "-t",
                    "ed25519",
                    "-N",
                    "",
                    "-C",
                    &key_comment(),
                    "-f",
                    &key_arg,
                    "-q",
                ],
            ),
        )
        .await?;
        info!("generated deploy key at {}", key_path.display());
        true
    };

    let public_key = tokio::fs::read_to_string(layout.deploy_key_pub())
        .await
        .map_err(|e| {
            DeployerError::CredentialError(format!(
                "public key missing at {}: {}",
                layout.deploy_key_pub().display(),
                e
            ))
        })?;

    Ok(KeyProvision {
        public_key: public_key.trim_end().to_string(),
        created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existence_alone_gates_generation() {
        assert!(should_generate(false));
        assert!(!should_generate(true));
    }

    #[test]
    fn test_key_comment_names_the_host() {
        assert!(key_comment().starts_with("prism-deploy@"));
    }

    #[tokio::test]
    async fn test_existing_private_key_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DeployLayout::new(dir.path());
        tokio::fs::create_dir_all(layout.ssh_dir()).await.unwrap();

        // Garbage content must still short-circuit generation
        tokio::fs::write(layout.deploy_key(), "not a real key")
            .await
            .unwrap();
        tokio::fs::write(layout.deploy_key_pub(), "ssh-ed25519 AAAA test\n")
            .await
            .unwrap();

        let provision = ensure_deploy_key(&layout).await.unwrap();
        assert!(!provision.created);
        assert_eq!(provision.public_key, "ssh-ed25519 AAAA test");

        let private = tokio::fs::read_to_string(layout.deploy_key()).await.unwrap();
        assert_eq!(private, "not a real key");
    }

    #[tokio::test]
    async fn test_private_key_without_public_half_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DeployLayout::new(dir.path());
        tokio::fs::create_dir_all(layout.ssh_dir()).await.unwrap();
        tokio::fs::write(layout.deploy_key(), "").await.unwrap();

        let err = ensure_deploy_key(&layout).await.unwrap_err();
        assert!(matches!(err, DeployerError::CredentialError(_)));
    }
}
