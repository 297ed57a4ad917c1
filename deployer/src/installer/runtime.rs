//! Package and container-runtime installer
//!
//! All apt operations are idempotent at the package-manager level, so
//! installation runs unconditionally. The upstream signing key and
//! repository registration are overwritten each run to guarantee
//! freshness.

use tracing::{info, warn};

use crate::errors::DeployerError;
use crate::exec::{capture_stdout, command, Runner};
use crate::host::probe::{HostProfile, OsFamily};
use crate::orchestrator::Mode;

/// Packages required before the runtime repository can be registered
pub const PREREQ_PACKAGES: &[&str] = &["ca-certificates", "curl", "gnupg", "git", "openssh-client"];

/// Container runtime packages
pub const RUNTIME_PACKAGES: &[&str] = &[
    "docker-ce",
    "docker-ce-cli",
    "containerd.io",
    "docker-buildx-plugin",
    "docker-compose-plugin",
];

/// Where the upstream signing key is installed
pub const KEYRING_PATH: &str = "/etc/apt/keyrings/docker.gpg";

/// Where the apt source entry is written
pub const APT_SOURCE_PATH: &str = "/etc/apt/sources.list.d/docker.list";

/// Upstream package repository for a supported OS family
pub fn repo_url(family: OsFamily) -> &'static str {
    match family {
        OsFamily::Ubuntu => "https://download.docker.com/linux/ubuntu",
        OsFamily::Debian => "https://download.docker.com/linux/debian",
    }
}

/// Apt source line for the probed host
pub fn apt_source_line(profile: &HostProfile, arch: &str) -> String {
    format!(
        "deb [arch={} signed-by={}] {} {} stable",
        arch,
        KEYRING_PATH,
        repo_url(profile.os_id),
        profile.codename
    )
}

/// Apt install arguments for the given mode.
///
/// Automated runs pass `-y`; interactive runs let apt prompt.
pub fn apt_install_args<'a>(mode: Mode, packages: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec!["install"];
    if mode.is_automated() {
        args.push("-y");
    }
    args.extend_from_slice(packages);
    args
}

/// Install prerequisite packages unconditionally
pub async fn install_prerequisites(runner: &Runner, mode: Mode) -> Result<(), DeployerError> {
    runner
        .run("refresh package index", "apt-get", &["update"])
        .await?;
    runner
        .run(
            "install prerequisite packages",
            "apt-get",
            &apt_install_args(mode, PREREQ_PACKAGES),
        )
        .await
}

/// Register the upstream signing key and package repository.
///
/// Automated runs force-remove a stale key file first so an unattended
/// run cannot stall on gpg's overwrite prompt; interactive runs leave a
/// stale key in place and let gpg surface the conflict.
pub async fn register_package_repo(
    runner: &Runner,
    mode: Mode,
    profile: &HostProfile,
) -> Result<(), DeployerError> {
    runner
        .run(
            "create keyring directory",
            "install",
            &["-m", "0755", "-d", "/etc/apt/keyrings"],
        )
        .await?;

    if mode.is_automated() {
        runner
            .run("remove stale signing key", "rm", &["-f", KEYRING_PATH])
            .await?;
    }

    let fetch_key = format!(
        "curl -fsSL {}/gpg | gpg --dearmor -o {}",
        repo_url(profile.os_id),
        KEYRING_PATH
    );
    runner
        .run("register signing key", "sh", &["-c", &fetch_key])
        .await?;

    let arch = capture_stdout(
        "detect package architecture",
        &mut command("dpkg", &["--print-architecture"]),
    )
    .await?;
    let line = apt_source_line(profile, arch.trim());
    let write_source = format!("echo '{}' > {}", line, APT_SOURCE_PATH);
    runner
        .run("register package repository", "sh", &["-c", &write_source])
        .await
}

/// Install the container runtime packages
pub async fn install_runtime(
    runner: &Runner,
    mode: Mode,
    profile: &HostProfile,
) -> Result<(), DeployerError> {
    register_package_repo(runner, mode, profile).await?;

    runner
        .run("refresh package index", "apt-get", &["update"])
        .await?;
    runner
        .run(
            "install container runtime",
            "apt-get",
            &apt_install_args(mode, RUNTIME_PACKAGES),
        )
        .await?;

    if !profile.is_privileged {
        add_user_to_runtime_group(runner).await;
    }
    Ok(())
}

/// Add the invoking user to the runtime's administrative group.
///
/// Advisory only: membership is not verified afterwards, and the change
/// needs a fresh login session to take effect.
async fn add_user_to_runtime_group(runner: &Runner) {
    let Ok(user) = std::env::var("USER") else {
        warn!("cannot determine invoking user, skipping docker group membership");
        return;
    };

    match runner
        .run(
            "add user to docker group",
            "usermod",
            &["-aG", "docker", &user],
        )
        .await
    {
        Ok(()) => warn!(
            "added '{}' to the docker group; log out and back in for it to take effect",
            user
        ),
        Err(e) => warn!("could not add '{}' to the docker group: {}", user, e),
    }
}

/// Verify the runtime responds; a failure here aborts the whole run
pub async fn verify_runtime(runner: &Runner) -> Result<(), DeployerError> {
    runner
        .run("verify runtime version", "docker", &["--version"])
        .await?;
    runner
        .run("verify compose version", "docker", &["compose", "version"])
        .await?;
    info!("container runtime verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(family: OsFamily, codename: &str) -> HostProfile {
        HostProfile {
            os_id: family,
            codename: codename.to_string(),
            is_privileged: true,
        }
    }

    #[test]
    fn test_repo_url_matches_family() {
        assert_eq!(
            repo_url(OsFamily::Ubuntu),
            "https://download.docker.com/linux/ubuntu"
        );
        assert_eq!(
            repo_url(OsFamily::Debian),
            "https://download.docker.com/linux/debian"
        );
    }

    #[test]
    fn test_apt_source_line() {
        let line = apt_source_line(&profile(OsFamily::Debian, "bookworm"), "amd64");
        assert_eq!(
            line,
            "deb [arch=amd64 signed-by=/etc/apt/keyrings/docker.gpg] \
             https://download.docker.com/linux/debian bookworm stable"
        );
    }

    #[test]
    fn test_automated_installs_pass_yes() {
        let args = apt_install_args(Mode::Automated, &["git"]);
        assert_eq!(args, vec!["install", "-y", "git"]);

        let args = apt_install_args(Mode::Interactive, &["git"]);
        assert_eq!(args, vec!["install", "git"]);
    }
}
