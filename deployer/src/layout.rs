//! Filesystem layout
//!
//! Every path the deployer touches is fixed relative to one base
//! directory. Nothing else on the host is written to.

use std::path::PathBuf;

/// Fixed filesystem layout for the deployer
#[derive(Debug, Clone)]
pub struct DeployLayout {
    /// Base directory for all deployer paths (the login user's home)
    pub base_dir: PathBuf,
}

impl DeployLayout {
    /// Create a layout rooted at the given base directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The application working copy
    pub fn working_copy(&self) -> PathBuf {
        self.base_dir.join("prism")
    }

    /// The update script shipped inside the working copy
    pub fn update_script(&self) -> PathBuf {
        self.working_copy().join("scripts").join("update.sh")
    }

    /// Directory holding the deploy key pair
    pub fn ssh_dir(&self) -> PathBuf {
        self.base_dir.join(".ssh")
    }

    /// Private half of the deploy key pair
    pub fn deploy_key(&self) -> PathBuf {
        self.ssh_dir().join("prism_deploy")
    }

    /// Public half of the deploy key pair
    pub fn deploy_key_pub(&self) -> PathBuf {
        self.ssh_dir().join("prism_deploy.pub")
    }

    /// Append-only deploy log written by the update orchestrator
    pub fn deploy_log(&self) -> PathBuf {
        self.base_dir.join("prism-update.log")
    }

    /// Lock file serializing update runs
    pub fn lock_file(&self) -> PathBuf {
        self.base_dir.join(".prism-update.lock")
    }

    /// Optional settings file overriding the defaults
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join(".prism-deployer.json")
    }

    /// Persistent data directory mounted into the container
    pub fn data_dir(&self) -> PathBuf {
        self.working_copy().join("app").join("data")
    }

    /// Persistent application log directory mounted into the container
    pub fn app_logs_dir(&self) -> PathBuf {
        self.working_copy().join("app").join("logs")
    }
}

impl Default for DeployLayout {
    fn default() -> Self {
        let base_dir = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/root"));
        Self::new(base_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_base() {
        let layout = DeployLayout::new("/home/deploy");
        assert_eq!(layout.working_copy(), PathBuf::from("/home/deploy/prism"));
        assert_eq!(
            layout.deploy_key(),
            PathBuf::from("/home/deploy/.ssh/prism_deploy")
        );
        assert_eq!(
            layout.deploy_key_pub(),
            PathBuf::from("/home/deploy/.ssh/prism_deploy.pub")
        );
        assert_eq!(
            layout.deploy_log(),
            PathBuf::from("/home/deploy/prism-update.log")
        );
    }

    #[test]
    fn test_mounted_dirs_live_inside_working_copy() {
        let layout = DeployLayout::new("/home/deploy");
        assert!(layout.data_dir().starts_with(layout.working_copy()));
        assert!(layout.app_logs_dir().starts_with(layout.working_copy()));
        assert!(layout.update_script().starts_with(layout.working_copy()));
    }
}
