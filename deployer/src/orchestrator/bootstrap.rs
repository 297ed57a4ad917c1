//! Bootstrap orchestrator
//!
//! Brings a bare host to a running application state, once per host
//! lifetime. Every step is gated by an idempotency check, so a second
//! run against the same host takes the "already exists" branch for each
//! step instead of duplicating work. Any step failure aborts the run
//! immediately; already-applied changes are not rolled back.

use colored::Colorize;
use secrecy::SecretString;
use tracing::info;

use crate::credentials::{ensure_deploy_key, KeyProvision};
use crate::deploy::compose;
use crate::deploy::source::{self, AuthMethod, SyncAction};
use crate::errors::DeployerError;
use crate::exec::Runner;
use crate::host::probe::probe_host;
use crate::installer::runtime;
use crate::layout::DeployLayout;
use crate::netinfo;
use crate::orchestrator::fsm::{BootstrapFsm, BootstrapState};
use crate::orchestrator::Mode;
use crate::outcome::{StepOutcome, StepTrace};
use crate::settings::Settings;
use crate::utils::login_user;

/// Run the bootstrap sequence end to end
pub async fn run_bootstrap(
    mode: Mode,
    settings: &Settings,
    layout: &DeployLayout,
) -> Result<(), DeployerError> {
    let mut fsm = BootstrapFsm::new();
    let mut trace = StepTrace::new();
    info!("bootstrap starting ({:?} mode)", mode);

    // Probing
    let profile = step(
        &mut trace,
        "probe host",
        probe_host().await.map(|p| (p, StepOutcome::Applied)),
    )?;
    info!(
        "host: {} {} ({})",
        profile.os_id.id(),
        profile.codename,
        if profile.is_privileged {
            "root"
        } else {
            "unprivileged"
        }
    );
    let runner = Runner::for_host(&profile);

    // InstallingPrereqs
    advance(&mut fsm)?;
    step(
        &mut trace,
        "install prerequisite packages",
        runtime::install_prerequisites(&runner, mode)
            .await
            .map(|()| ((), StepOutcome::Applied)),
    )?;

    // InstallingRuntime
    advance(&mut fsm)?;
    step(
        &mut trace,
        "install container runtime",
        runtime::install_runtime(&runner, mode, &profile)
            .await
            .map(|()| ((), StepOutcome::Applied)),
    )?;

    // VerifyingRuntime
    advance(&mut fsm)?;
    step(
        &mut trace,
        "verify container runtime",
        runtime::verify_runtime(&runner)
            .await
            .map(|()| ((), StepOutcome::Applied)),
    )?;

    // SyncingSource
    advance(&mut fsm)?;
    let needs_clone = !tokio::fs::try_exists(layout.working_copy()).await?;
    let auth = if needs_clone {
        select_auth_method(mode)?
    } else {
        AuthMethod::Public
    };
    step(
        &mut trace,
        "synchronize source",
        source::sync_source(layout, settings, &auth)
            .await
            .map(|action| ((), sync_outcome(action))),
    )?;

    // ProvisioningCredentials
    advance(&mut fsm)?;
    let provision = step(
        &mut trace,
        "provision deploy key",
        ensure_deploy_key(layout).await.map(|p| {
            let outcome = if p.created {
                StepOutcome::Applied
            } else {
                StepOutcome::skipped("deploy key already present")
            };
            (p, outcome)
        }),
    )?;

    // BuildingAndStarting
    advance(&mut fsm)?;
    step(
        &mut trace,
        "build and start containers",
        compose::build_and_start(&runner, layout)
            .await
            .map(|()| ((), StepOutcome::Applied)),
    )?;

    // Reporting
    advance(&mut fsm)?;
    report(layout, settings, &provision, &trace).await?;
    Ok(())
}

fn sync_outcome(action: SyncAction) -> StepOutcome {
    match action {
        SyncAction::Clone | SyncAction::FastForward => StepOutcome::Applied,
    }
}

fn advance(fsm: &mut BootstrapFsm) -> Result<BootstrapState, DeployerError> {
    let state = fsm.advance().map_err(DeployerError::Internal)?;
    info!("entering state: {}", state.as_str());
    Ok(state)
}

fn step<T>(
    trace: &mut StepTrace,
    name: &'static str,
    result: Result<(T, StepOutcome), DeployerError>,
) -> Result<T, DeployerError> {
    match result {
        Ok((value, outcome)) => {
            trace.record(name, outcome);
            Ok(value)
        }
        Err(e) => {
            trace.record(name, StepOutcome::failed(e.to_string()));
            Err(e)
        }
    }
}

/// Choose how a fresh clone authenticates.
///
/// Automated runs always use the public URL; interactive runs ask the
/// operator.
fn select_auth_method(mode: Mode) -> Result<AuthMethod, DeployerError> {
    if mode.is_automated() {
        return Ok(AuthMethod::Public);
    }

    println!("Clone authentication:");
    println!("  1) access token (HTTPS)");
    println!("  2) deploy key (SSH)");
    println!("  3) public repository (no authentication)");
    let choice = prompt("Select [1-3, default 3]: ")?;

    match choice.trim() {
        "1" => {
            let token = prompt("Access token: ")?;
            Ok(AuthMethod::Token(SecretString::from(
                token.trim().to_string(),
            )))
        }
        "2" => Ok(AuthMethod::Ssh),
        _ => Ok(AuthMethod::Public),
    }
}

fn prompt(message: &str) -> Result<String, DeployerError> {
    use std::io::Write;

    print!("{}", message);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line)
}

/// Print the post-condition summary: public IP, key material, and the
/// CI secrets the operator must configure by hand
async fn report(
    layout: &DeployLayout,
    settings: &Settings,
    provision: &KeyProvision,
    trace: &StepTrace,
) -> Result<(), DeployerError> {
    let public_ip = netinfo::detect_public_ip().await;
    let private_key = tokio::fs::read_to_string(layout.deploy_key()).await?;
    let user = login_user();

    let applied = trace
        .reports()
        .iter()
        .filter(|r| r.outcome == StepOutcome::Applied)
        .count();
    let skipped = trace.len() - applied;

    println!();
    println!("{}", "Bootstrap complete".green().bold());
    println!("({} steps: {} applied, {} skipped)", trace.len(), applied, skipped);
    println!();
    println!("{} {}", "Public IP:".bold(), public_ip);
    println!(
        "{} http://{}:{}",
        "Dashboard:".bold(),
        public_ip,
        settings.dashboard_port
    );
    println!(
        "{} http://{}:{}",
        "Webhook API:".bold(),
        public_ip,
        settings.webhook_port
    );
    println!();
    println!(
        "{}",
        "Register this public key as a repository deploy key:".bold()
    );
    println!("{}", provision.public_key);
    println!();
    println!("{}", "Configure these CI secrets:".bold());
    println!("  DEPLOY_HOST = {}", public_ip);
    println!("  DEPLOY_USER = {}", user);
    println!(
        "  DEPLOY_SSH_KEY = contents of {}, reproduced below",
        layout.deploy_key().display()
    );
    for line in private_key.lines() {
        println!("    {}", line);
    }
    println!();

    Ok(())
}
