//! Host capability probe
//!
//! Reads the OS identity file and the effective user id once per run.
//! The probe itself mutates nothing; the decision logic is kept in pure
//! functions so it is testable without a real host.

use tracing::warn;

use crate::errors::DeployerError;
use crate::exec::{capture_stdout, command};

/// Path of the platform's OS identity file
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Supported OS families
///
/// Anything else is coerced to the nearest supported family; the probe
/// never aborts on an unknown OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Ubuntu,
    Debian,
}

impl OsFamily {
    /// Exact match on an os-release `ID` value
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "ubuntu" => Some(OsFamily::Ubuntu),
            "debian" => Some(OsFamily::Debian),
            _ => None,
        }
    }

    /// The os-release `ID` value for this family
    pub fn id(&self) -> &'static str {
        match self {
            OsFamily::Ubuntu => "ubuntu",
            OsFamily::Debian => "debian",
        }
    }

    /// Fallback codename when the identity file does not declare one
    pub fn default_codename(&self) -> &'static str {
        match self {
            OsFamily::Ubuntu => "noble",
            OsFamily::Debian => "bookworm",
        }
    }
}

/// Coerce an os-release `ID` to a supported family.
///
/// Returns the family plus whether a fallback substitution happened.
pub fn coerce_family(id: &str) -> (OsFamily, bool) {
    match OsFamily::from_id(id) {
        Some(family) => (family, false),
        None => (OsFamily::Debian, true),
    }
}

/// Identity of the current host
#[derive(Debug, Clone)]
pub struct HostProfile {
    /// Detected (or coerced) OS family
    pub os_id: OsFamily,

    /// Version codename used for package repository selection
    pub codename: String,

    /// Whether the effective user is root
    pub is_privileged: bool,
}

/// Parse os-release content into `(id, codename)`.
///
/// Values may be quoted; unknown keys are ignored.
pub fn parse_os_release(content: &str) -> (Option<String>, Option<String>) {
    let mut id = None;
    let mut codename = None;

    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.trim() {
            "ID" => id = Some(value),
            "VERSION_CODENAME" => codename = Some(value),
            _ => {}
        }
    }

    (id, codename)
}

/// Derive a host profile from os-release content and the privilege flag
pub fn profile_from_os_release(content: &str, is_privileged: bool) -> HostProfile {
    let (id, codename) = parse_os_release(content);
    let id = id.unwrap_or_default();
    let (family, substituted) = coerce_family(&id);

    if substituted {
        warn!(
            "unsupported OS family '{}', falling back to {}",
            id,
            family.id()
        );
    }

    let codename = codename
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| family.default_codename().to_string());

    HostProfile {
        os_id: family,
        codename,
        is_privileged,
    }
}

/// Probe the current host
pub async fn probe_host() -> Result<HostProfile, DeployerError> {
    let content = tokio::fs::read_to_string(OS_RELEASE_PATH).await?;
    let is_privileged = effective_uid().await? == 0;
    Ok(profile_from_os_release(&content, is_privileged))
}

/// Effective user id of this process
pub async fn effective_uid() -> Result<u32, DeployerError> {
    let out = capture_stdout("query effective uid", &mut command("id", &["-u"])).await?;
    out.trim()
        .parse()
        .map_err(|_| DeployerError::ProbeError(format!("unparseable uid: {}", out.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UBUNTU_OS_RELEASE: &str = r#"
PRETTY_NAME="Ubuntu 24.04 LTS"
NAME="Ubuntu"
ID=ubuntu
ID_LIKE=debian
VERSION_CODENAME=noble
"#;

    const DEBIAN_OS_RELEASE: &str = r#"
PRETTY_NAME="Debian GNU/Linux 12 (bookworm)"
NAME="Debian GNU/Linux"
ID=debian
VERSION_CODENAME=bookworm
"#;

    #[test]
    fn test_parse_supported_families() {
        let profile = profile_from_os_release(UBUNTU_OS_RELEASE, false);
        assert_eq!(profile.os_id, OsFamily::Ubuntu);
        assert_eq!(profile.codename, "noble");
        assert!(!profile.is_privileged);

        let profile = profile_from_os_release(DEBIAN_OS_RELEASE, true);
        assert_eq!(profile.os_id, OsFamily::Debian);
        assert_eq!(profile.codename, "bookworm");
        assert!(profile.is_privileged);
    }

    #[test]
    fn test_unknown_family_falls_back_to_debian() {
        let (family, substituted) = coerce_family("fedora");
        assert_eq!(family, OsFamily::Debian);
        assert!(substituted);

        let profile = profile_from_os_release("ID=alpine\n", false);
        assert_eq!(profile.os_id, OsFamily::Debian);
    }

    #[test]
    fn test_missing_codename_uses_family_default() {
        let profile = profile_from_os_release("ID=ubuntu\n", false);
        assert_eq!(profile.codename, "noble");

        let profile = profile_from_os_release("ID=debian\nVERSION_CODENAME=\n", false);
        assert_eq!(profile.codename, "bookworm");
    }

    #[test]
    fn test_parse_strips_quotes() {
        let (id, codename) = parse_os_release("ID=\"ubuntu\"\nVERSION_CODENAME=\"noble\"\n");
        assert_eq!(id.as_deref(), Some("ubuntu"));
        assert_eq!(codename.as_deref(), Some("noble"));
    }
}
