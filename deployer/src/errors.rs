//! Error types for the Prism deployer

use thiserror::Error;

/// Main error type for the deployer
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("probe error: {0}")]
    ProbeError(String),

    #[error("install error: {0}")]
    InstallError(String),

    #[error("credential error: {0}")]
    CredentialError(String),

    #[error("sync error: {0}")]
    SyncError(String),

    #[error("deployment error: {0}")]
    DeployError(String),

    #[error("supervisor error: {0}")]
    SupervisorError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("{action} failed with exit code {code}")]
    CommandFailed { action: String, code: i32 },

    #[error("failed to run {action}: {source}")]
    CommandSpawn {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("another run holds the lock file at {0}")]
    LockHeld(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DeployerError {
    /// Process exit code to propagate for this error.
    ///
    /// A failed external command surfaces its own exit code; everything
    /// else collapses to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployerError::CommandFailed { code, .. } => *code,
            _ => 1,
        }
    }
}

impl From<anyhow::Error> for DeployerError {
    fn from(err: anyhow::Error) -> Self {
        DeployerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failure_exit_code_is_propagated() {
        let err = DeployerError::CommandFailed {
            action: "install container runtime".to_string(),
            code: 100,
        };
        assert_eq!(err.exit_code(), 100);
    }

    #[test]
    fn test_other_errors_exit_with_one() {
        let err = DeployerError::SyncError("fast-forward rejected".to_string());
        assert_eq!(err.exit_code(), 1);
    }
}
