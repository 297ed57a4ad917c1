//! Idempotency and filesystem-state tests
//!
//! Exercises the decision logic and filesystem contracts against
//! temporary directories instead of a real host.

use prism_deployer::credentials::{ensure_deploy_key, should_generate};
use prism_deployer::deploy::source::{sync_action, SyncAction};
use prism_deployer::deploylog::DeployLog;
use prism_deployer::errors::DeployerError;
use prism_deployer::host::probe::{coerce_family, profile_from_os_release, OsFamily};
use prism_deployer::installer::runtime::repo_url;
use prism_deployer::layout::DeployLayout;
use prism_deployer::lockfile::RunLock;
use prism_deployer::settings::Settings;

#[test]
fn test_supported_families_select_matching_repo() {
    for (id, expected) in [
        ("ubuntu", "https://download.docker.com/linux/ubuntu"),
        ("debian", "https://download.docker.com/linux/debian"),
    ] {
        let (family, substituted) = coerce_family(id);
        assert!(!substituted);
        assert_eq!(repo_url(family), expected);
    }
}

#[test]
fn test_unsupported_family_falls_back_to_debian_repo() {
    for id in ["fedora", "arch", "nixos", ""] {
        let (family, substituted) = coerce_family(id);
        assert!(substituted);
        assert_eq!(repo_url(family), "https://download.docker.com/linux/debian");
    }
}

#[test]
fn test_probe_never_leaves_family_unset() {
    let profile = profile_from_os_release("PRETTY_NAME=\"Some OS\"\n", false);
    assert_eq!(profile.os_id, OsFamily::Debian);
    assert!(!profile.codename.is_empty());
}

#[test]
fn test_sync_decision_branches_on_presence_alone() {
    assert_eq!(sync_action(false), SyncAction::Clone);
    assert_eq!(sync_action(true), SyncAction::FastForward);
}

#[test]
fn test_key_generation_gated_by_existence() {
    assert!(should_generate(false));
    assert!(!should_generate(true));
}

#[tokio::test]
async fn test_second_provisioning_run_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DeployLayout::new(dir.path());
    tokio::fs::create_dir_all(layout.ssh_dir()).await.unwrap();
    tokio::fs::write(layout.deploy_key(), "private material")
        .await
        .unwrap();
    tokio::fs::write(layout.deploy_key_pub(), "ssh-ed25519 AAAA host\n")
        .await
        .unwrap();

    let first = ensure_deploy_key(&layout).await.unwrap();
    let second = ensure_deploy_key(&layout).await.unwrap();

    assert!(!first.created);
    assert!(!second.created);
    assert_eq!(first.public_key, second.public_key);

    let private = tokio::fs::read_to_string(layout.deploy_key()).await.unwrap();
    assert_eq!(private, "private material");
}

#[tokio::test]
async fn test_update_log_grows_by_one_block_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let log = DeployLog::new(dir.path().join("update.log"));

    // First run
    log.append("update started").await.unwrap();
    log.append("update complete").await.unwrap();

    // Second run appends, never truncates
    log.append("update started").await.unwrap();
    log.append("update complete").await.unwrap();

    let contents = tokio::fs::read_to_string(log.path()).await.unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|l| l.starts_with('[')));
    assert!(lines[0].ends_with("update started"));
    assert!(lines[2].ends_with("update started"));
    assert!(lines[3].ends_with("update complete"));
}

#[test]
fn test_concurrent_update_runs_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".update.lock");

    let held = RunLock::acquire(&path).unwrap();
    match RunLock::acquire(&path) {
        Err(DeployerError::LockHeld(_)) => {}
        other => panic!("expected LockHeld, got {other:?}"),
    }

    drop(held);
    RunLock::acquire(&path).unwrap();
}

#[tokio::test]
async fn test_settings_fall_back_to_defaults_on_fresh_host() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DeployLayout::new(dir.path());

    let settings = Settings::load_or_default(layout.settings_file())
        .await
        .unwrap();
    assert_eq!(settings.branch, "main");
    assert_eq!(settings.container_filter, "prism");
}
