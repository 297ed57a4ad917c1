//! Settings file management

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::DeployerError;
use crate::logs::LogLevel;

/// Deployer settings
///
/// Every field has a default so the orchestrator binaries run without any
/// configuration; a settings file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Public HTTPS clone URL of the application repository
    #[serde(default = "default_repo_url")]
    pub repo_url: String,

    /// SSH remote of the application repository (deploy-key auth)
    #[serde(default = "default_repo_ssh_url")]
    pub repo_ssh_url: String,

    /// Branch to track
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Name filter selecting the application's containers
    #[serde(default = "default_container_filter")]
    pub container_filter: String,

    /// Dashboard UI port
    #[serde(default = "default_dashboard_port")]
    pub dashboard_port: u16,

    /// Webhook API port
    #[serde(default = "default_webhook_port")]
    pub webhook_port: u16,

    /// In-container process supervisor configuration
    #[serde(default)]
    pub supervisor: SupervisorSettings,
}

fn default_repo_url() -> String {
    "https://github.com/prism-ops/prism.git".to_string()
}

fn default_repo_ssh_url() -> String {
    "git@github.com:prism-ops/prism.git".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_container_filter() -> String {
    "prism".to_string()
}

fn default_dashboard_port() -> u16 {
    8501
}

fn default_webhook_port() -> u16 {
    5000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            repo_url: default_repo_url(),
            repo_ssh_url: default_repo_ssh_url(),
            branch: default_branch(),
            container_filter: default_container_filter(),
            dashboard_port: default_dashboard_port(),
            webhook_port: default_webhook_port(),
            supervisor: SupervisorSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file, falling back to defaults when the
    /// file does not exist. A present but malformed file is an error.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, DeployerError> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let settings = serde_json::from_str(&contents)?;
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-container process supervisor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorSettings {
    /// Command launching the webhook API process (detached)
    #[serde(default = "default_webhook_command")]
    pub webhook_command: Vec<String>,

    /// Command launching the dashboard process (foreground)
    #[serde(default = "default_dashboard_command")]
    pub dashboard_command: Vec<String>,
}

fn default_webhook_command() -> Vec<String> {
    vec!["python".to_string(), "webhook_api.py".to_string()]
}

fn default_dashboard_command() -> Vec<String> {
    vec![
        "streamlit".to_string(),
        "run".to_string(),
        "main.py".to_string(),
        "--server.port=8501".to_string(),
        "--server.address=0.0.0.0".to_string(),
    ]
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            webhook_command: default_webhook_command(),
            dashboard_command: default_dashboard_command(),
        }
    }
}
