#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod authority;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod discover;
pub mod error;
pub mod heartbeat;
pub mod protocol;
pub mod registry;
pub mod replica;
pub mod server;
pub mod session;
pub mod workload;

pub mod test_utils;

pub use error::{Error, Result};

/// Map `-v` counts onto an env-filter default; `RUST_LOG` still overrides.
pub fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "solohost=debug,info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
