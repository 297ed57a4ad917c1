//! Bootstrap orchestrator - Entry Point
//!
//! Brings a bare host to a running Prism application. Run once per host
//! lifetime; safe to re-run, every step is idempotent.

use std::collections::HashMap;
use std::env;

use prism_deployer::layout::DeployLayout;
use prism_deployer::logs::{init_logging, LogOptions};
use prism_deployer::orchestrator::bootstrap::run_bootstrap;
use prism_deployer::orchestrator::Mode;
use prism_deployer::settings::Settings;
use prism_deployer::utils::version_info;

use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version_info()).unwrap());
        return;
    }

    let mode = if cli_args.contains_key("automated") {
        Mode::Automated
    } else {
        Mode::Interactive
    };

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

    if let Err(e) = run_bootstrap(mode, &settings, &layout).await {
        error!("bootstrap failed: {e}");
        std::process::exit(e.exit_code());
    }
}
