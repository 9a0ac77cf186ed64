//! Discovery of the reporting identity and the shared server folder.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::info;

use crate::{Error, Result};

const PUBLIC_IP_ENDPOINT: &str = "http://ipv4bot.whatismyipaddress.com";
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Discover the public IPv4 address used as the reporting identity.
pub async fn public_ip() -> Result<String> {
    let http = reqwest::Client::builder()
        .timeout(DISCOVERY_TIMEOUT)
        .build()?;
    let body = http
        .get(PUBLIC_IP_ENDPOINT)
        .send()
        .await
        .map_err(|e| Error::IdentityDiscovery {
            reason: format!("cannot reach {PUBLIC_IP_ENDPOINT}: {e}"),
        })?
        .text()
        .await
        .map_err(|e| Error::IdentityDiscovery {
            reason: e.to_string(),
        })?;

    let ip = body.trim();
    // Endpoints under maintenance tend to answer with HTML, not an address
    if ip.parse::<Ipv4Addr>().is_err() {
        return Err(Error::IdentityDiscovery {
            reason: format!("unexpected reply from {PUBLIC_IP_ENDPOINT}: {ip:?}"),
        });
    }
    info!("Discovered public IP {}", ip);
    Ok(ip.to_string())
}

/// Locate the Dropbox root by reading the `host.db` the desktop client
/// maintains: its second whitespace-separated field is the base64-encoded
/// path of the synced folder.
pub fn share_root() -> Result<PathBuf> {
    let host_db = host_db_path()?;
    let contents = std::fs::read_to_string(&host_db).map_err(|e| Error::ShareRoot {
        reason: format!("cannot read {host_db:?}: {e}"),
    })?;
    let root = parse_host_db(&contents)?;
    info!("Detected shared folder root {:?}", root);
    Ok(root)
}

#[cfg(windows)]
fn host_db_path() -> Result<PathBuf> {
    let appdata = std::env::var_os("APPDATA").ok_or_else(|| Error::ShareRoot {
        reason: "APPDATA is not set".to_string(),
    })?;
    Ok(PathBuf::from(appdata).join("Dropbox").join("host.db"))
}

#[cfg(not(windows))]
fn host_db_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or_else(|| Error::ShareRoot {
        reason: "HOME is not set".to_string(),
    })?;
    Ok(PathBuf::from(home).join(".dropbox").join("host.db"))
}

fn parse_host_db(contents: &str) -> Result<PathBuf> {
    let encoded = contents
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::ShareRoot {
            reason: "host.db has no path field".to_string(),
        })?;
    let decoded = BASE64.decode(encoded).map_err(|e| Error::ShareRoot {
        reason: format!("host.db path field is not base64: {e}"),
    })?;
    let path = String::from_utf8(decoded).map_err(|e| Error::ShareRoot {
        reason: format!("host.db path is not UTF-8: {e}"),
    })?;
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_db() {
        // Second field is base64 of "/home/alice/Dropbox"
        let contents = "0123abcd L2hvbWUvYWxpY2UvRHJvcGJveA==\n";
        let root = parse_host_db(contents).unwrap();
        assert_eq!(root, PathBuf::from("/home/alice/Dropbox"));
    }

    #[test]
    fn test_parse_host_db_rejects_short_files() {
        assert!(matches!(
            parse_host_db("only-one-field"),
            Err(Error::ShareRoot { .. })
        ));
        assert!(matches!(parse_host_db(""), Err(Error::ShareRoot { .. })));
    }

    #[test]
    fn test_parse_host_db_rejects_bad_encoding() {
        assert!(matches!(
            parse_host_db("0123abcd not!base64!"),
            Err(Error::ShareRoot { .. })
        ));
    }
}
