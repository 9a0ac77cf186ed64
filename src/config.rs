//! Resolution of the command line into one explicit configuration value.
//!
//! Everything downstream receives this struct (or pieces of it) instead of
//! consulting any ambient state.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;

use crate::cli::Cli;
use crate::discover;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct AuthorityEndpoint {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub authority: Option<AuthorityEndpoint>,
    /// Shared folder holding the jar and the occupancy record.
    pub folder: PathBuf,
    pub jar: Option<PathBuf>,
    pub jvm_options: String,
    /// `None` until discovered.
    pub identity: Option<String>,
    pub heartbeat_interval: Duration,
    pub check_only: bool,
}

impl AgentConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let authority = match (cli.authority, cli.key) {
            (Some(url), Some(key)) => Some(AuthorityEndpoint { url, key }),
            (Some(_), None) => {
                return Err(Error::Other(anyhow!(
                    "a secret key is required when using an authority service (use -k)"
                )))
            }
            (None, _) => None,
        };

        let folder = match (cli.path, cli.name) {
            (Some(path), _) => path,
            (None, Some(name)) => {
                let root = match cli.share_root {
                    Some(root) => root,
                    None => discover::share_root()?,
                };
                root.join(name)
            }
            (None, None) => {
                return Err(Error::Other(anyhow!(
                    "a server folder must be determined: give the server name with -n \
                     or an explicit folder with -p"
                )))
            }
        };

        Ok(Self {
            authority,
            folder,
            jar: cli.jar,
            jvm_options: cli.jvm_options,
            identity: cli.identity,
            heartbeat_interval: Duration::from_secs(cli.heartbeat),
            check_only: cli.check,
        })
    }

    /// Replica records older than two renewal intervals are stale; a
    /// disabled heartbeat also disables staleness.
    pub fn staleness_threshold(&self) -> Duration {
        self.heartbeat_interval * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_explicit_path_wins() {
        let cli = Cli::parse_from(["solohost", "-p", "/srv/game"]);
        let config = AgentConfig::from_cli(cli).unwrap();
        assert_eq!(config.folder, PathBuf::from("/srv/game"));
        assert!(config.authority.is_none());
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_name_joins_share_root() {
        let cli = Cli::parse_from(["solohost", "-d", "/home/alice/Dropbox", "-n", "dei"]);
        let config = AgentConfig::from_cli(cli).unwrap();
        assert_eq!(config.folder, PathBuf::from("/home/alice/Dropbox/dei"));
    }

    #[test]
    fn test_authority_requires_key() {
        let cli = Cli::parse_from(["solohost", "-p", "/srv/game", "-s", "http://a:9000"]);
        assert!(AgentConfig::from_cli(cli).is_err());
    }

    #[test]
    fn test_folder_is_required() {
        let cli = Cli::parse_from(["solohost"]);
        assert!(AgentConfig::from_cli(cli).is_err());
    }

    #[test]
    fn test_zero_heartbeat_disables_staleness() {
        let cli = Cli::parse_from(["solohost", "-p", "/srv/game", "--heartbeat", "0"]);
        let config = AgentConfig::from_cli(cli).unwrap();
        assert!(config.staleness_threshold().is_zero());
    }
}
