use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Authority rejected the secret key")]
    InvalidKey,

    #[error("Server already running at {holder}")]
    AlreadyRunning { holder: String },

    #[error("Authority rejected the request: {reason}")]
    Protocol { reason: String },

    #[error("Cannot persist occupancy record to {path:?}: {source}")]
    ReplicaWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot determine a reporting identity: {reason}")]
    IdentityDiscovery { reason: String },

    #[error("No jar file found in {folder:?}")]
    NoJar { folder: PathBuf },

    #[error("Cannot locate the shared server folder: {reason}")]
    ShareRoot { reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
