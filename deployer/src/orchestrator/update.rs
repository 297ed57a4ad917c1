//! Update orchestrator
//!
//! Re-runs source synchronization and deployment on every CI trigger.
//! Each milestone appends one timestamped line to the deploy log; a
//! failed run leaves its partial block in place for postmortem.

use colored::Colorize;
use tracing::info;

use crate::deploy::compose;
use crate::deploy::source::{self, AuthMethod, SyncAction};
use crate::deploylog::DeployLog;
use crate::errors::DeployerError;
use crate::exec::Runner;
use crate::host::probe;
use crate::layout::DeployLayout;
use crate::lockfile::RunLock;
use crate::orchestrator::fsm::{UpdateFsm, UpdateState};
use crate::outcome::{StepOutcome, StepTrace};
use crate::settings::Settings;

/// Run the update sequence end to end
pub async fn run_update(settings: &Settings, layout: &DeployLayout) -> Result<(), DeployerError> {
    // Concurrent updates against one host are not safe; reject instead
    // of interleaving
    let _lock = RunLock::acquire(layout.lock_file())?;

    let log = DeployLog::new(layout.deploy_log());
    let mut fsm = UpdateFsm::new();
    let mut trace = StepTrace::new();

    info!("update starting");
    log.append("update started").await?;

    let is_privileged = probe::effective_uid().await? == 0;
    let runner = Runner::new(!is_privileged);

    // SyncingSource
    let action = step(
        &mut trace,
        "synchronize source",
        source::sync_source(layout, settings, &AuthMethod::Public)
            .await
            .map(|a| (a, StepOutcome::Applied)),
    )?;
    let milestone = match action {
        SyncAction::Clone => "source synchronized (cloned fresh)",
        SyncAction::FastForward => "source synchronized (fast-forwarded)",
    };
    log.append(milestone).await?;

    // BuildingAndStarting
    advance(&mut fsm)?;
    step(
        &mut trace,
        "build and start containers",
        compose::build_and_start(&runner, layout)
            .await
            .map(|()| ((), StepOutcome::Applied)),
    )?;
    log.append("containers rebuilt and started").await?;

    // Pruning
    advance(&mut fsm)?;
    step(
        &mut trace,
        "prune dangling artifacts",
        compose::prune_dangling(&runner)
            .await
            .map(|()| ((), StepOutcome::Applied)),
    )?;
    log.append("dangling artifacts pruned").await?;

    // Done
    advance(&mut fsm)?;
    log.append("update complete").await?;

    let listing = compose::list_running(&runner, &settings.container_filter).await?;
    println!("{}", "Running containers:".bold());
    println!("{}", listing);

    Ok(())
}

fn advance(fsm: &mut UpdateFsm) -> Result<UpdateState, DeployerError> {
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
