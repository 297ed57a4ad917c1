//! Container entry point - Process Supervisor
//!
//! Launches the webhook API detached and the dashboard in the
//! foreground; the container lives exactly as long as the dashboard.

use prism_deployer::layout::DeployLayout;
use prism_deployer::logs::{init_logging, LogOptions};
use prism_deployer::settings::Settings;
use prism_deployer::supervisor::{supervise, WebhookExitPolicy};

use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = init_logging(LogOptions::default()) {
        println!("Failed to initialize logging: {e}");
    }

    let layout = DeployLayout::default();
    let settings = match Settings::load_or_default(layout.settings_file()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {}", e);
            std::process::exit(1);
        }
    };

    match supervise(&settings.supervisor, WebhookExitPolicy::LogOnly).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("supervisor failed: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
