//! Update orchestrator - Entry Point
//!
//! Triggered by CI on every push: fast-forward the working copy,
//! rebuild and restart the container set, prune dangling artifacts.

use std::env;

use prism_deployer::layout::DeployLayout;
use prism_deployer::logs::{init_logging, LogOptions};
use prism_deployer::orchestrator::update::run_update;
use prism_deployer::settings::Settings;
use prism_deployer::utils::version_info;

use tracing::error;

#[tokio::main]
async fn main() {
    // Print version and exit
    if env::args().skip(1).any(|arg| arg == "--version") {
        println!("{}", serde_json::to_string_pretty(&version_info()).unwrap());
        return;
    }

    let layout = DeployLayout::default();
    let settings = match Settings::load_or_default(layout.settings_file()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {}", e);
            std::process::exit(1);
        }
    };

    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    if let Err(e) = run_update(&settings, &layout).await {
        error!("update failed: {e}");
        std::process::exit(e.exit_code());
    }
}
