//! Append-only deploy log
//!
//! One timestamped line per milestone. The file is never truncated or
//! rotated; unbounded growth is an accepted operational tradeoff.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::errors::DeployerError;

/// Timestamp layout used for every log line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Format one log line
pub fn format_line(timestamp: DateTime<Utc>, message: &str) -> String {
    format!("[{}] {}\n", timestamp.format(TIMESTAMP_FORMAT), message)
}

/// Handle on the append-only deploy log
#[derive(Debug, Clone)]
pub struct DeployLog {
    path: PathBuf,
}

impl DeployLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped milestone line
    pub async fn append(&self, message: &str) -> Result<(), DeployerError> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format_line(Utc::now(), message).as_bytes())
            .await?;
        file.flush().await?;
        Ok(())
    }
}
