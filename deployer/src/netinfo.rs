//! Best-effort public IP detection

use std::time::Duration;

use tracing::debug;

/// IP-echo endpoints tried in order
pub const IP_ECHO_ENDPOINTS: &[&str] = &["https://api.ipify.org", "https://ifconfig.me/ip"];

/// Sentinel reported when no endpoint answers
pub const UNDETECTABLE: &str = "<undetectable>";

/// Whether an echo response plausibly is an IP address
pub fn plausible_ip(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 45
        && s.chars()
            .all(|c| c.is_ascii_hexdigit() || c == '.' || c == ':')
}

/// Detect this host's public IP, falling back to the sentinel.
///
/// Lookup failures are never fatal; the caller always gets a string.
pub async fn detect_public_ip() -> String {
    detect_from(IP_ECHO_ENDPOINTS).await
}

/// Detection against an explicit endpoint list
pub async fn detect_from(endpoints: &[&str]) -> String {
    let Ok(client) = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    else {
        return UNDETECTABLE.to_string();
    };

    for endpoint in endpoints {
        match fetch_ip(&client, endpoint).await {
            Ok(ip) if plausible_ip(&ip) => return ip,
            Ok(other) => debug!("{} returned implausible answer: {}", endpoint, other),
            Err(e) => debug!("{} lookup failed: {}", endpoint, e),
        }
    }

    UNDETECTABLE.to_string()
}

async fn fetch_ip(client: &reqwest::Client, endpoint: &str) -> Result<String, reqwest::Error> {
    let body = client.get(endpoint).send().await?.text().await?;
    Ok(body.trim().to_string())
}
