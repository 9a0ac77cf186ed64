use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{ArgAction, Parser};
use tokio::net::TcpListener;
use tracing::info;

use solohost::registry::Registry;
use solohost::server::{router, AppState};
use solohost::{init_tracing, Result};

#[derive(Debug, Parser)]
#[command(name = "solohost-authority", version, about, long_about = None)]
struct Args {
    /// Listening port
    #[arg(short = 'p', long = "port", default_value_t = 9000)]
    port: u16,

    /// Path of the state file the registry mirrors itself to
    #[arg(
        short = 'f',
        long = "state-file",
        default_value = "solohost_authority_state.txt"
    )]
    state_file: PathBuf,

    /// Secret key clients must present
    #[arg(short = 'k', long = "key")]
    key: String,

    /// Verbose mode (-v, -vv)
    #[arg(short, action = ArgAction::Count)]
    verbosity: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbosity);

    let registry = Arc::new(Registry::open(args.state_file));
    let app = router(AppState::new(registry, &args.key));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Authority service listening on {}", addr);
    info!("  GET  /  - query occupancy");
    info!("  POST /  - report started/stopped");

    axum::serve(listener, app)
        .await
        .context("Server error")?;
    Ok(())
}
