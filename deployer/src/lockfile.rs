//! Single-invocation lock
//!
//! Concurrent update runs against the same host are not safe; a lock
//! file rejects the second invocation instead of leaving serialization
//! to caller convention.

use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::DeployerError;

/// Held for the duration of one orchestrator run
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock, failing fast when another run holds it
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, DeployerError> {
        let path = path.into();
        let result = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path);

        match result {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", std::process::id());
                debug!("acquired run lock at {}", path.display());
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(DeployerError::LockHeld(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquisition_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.lock");

        let lock = RunLock::acquire(&path).unwrap();
        let err = RunLock::acquire(&path).unwrap_err();
        assert!(matches!(err, DeployerError::LockHeld(_)));

        drop(lock);
        let _relock = RunLock::acquire(&path).unwrap();
    }

    #[test]
    fn test_lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.lock");

        {
            let _lock = RunLock::acquire(&path).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
