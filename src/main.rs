use std::sync::Arc;

use clap::Parser;
use tracing::info;

use solohost::authority::{Authority, HttpAuthority};
use solohost::cli::Cli;
use solohost::config::AgentConfig;
use solohost::coordinator::Coordinator;
use solohost::replica::ReplicaStore;
use solohost::session::{Session, SessionOutcome};
use solohost::workload::WorkloadSpec;
use solohost::{discover, init_tracing, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbosity);

    let config = AgentConfig::from_cli(cli)?;

    let authority: Option<Arc<dyn Authority>> = match &config.authority {
        Some(endpoint) => Some(Arc::new(HttpAuthority::new(&endpoint.url, &endpoint.key)?)),
        None => None,
    };
    let replica = ReplicaStore::new(&config.folder);
    let coordinator = Arc::new(Coordinator::new(authority, replica));

    if config.check_only {
        match coordinator
            .is_someone_running(config.staleness_threshold())
            .await?
        {
            Some(holder) => println!("Server is running at {holder}"),
            None => println!("Server is not running"),
        }
        return Ok(());
    }

    let identity = match config.identity.clone() {
        Some(identity) => identity,
        None => discover::public_ip().await?,
    };
    info!("Reporting identity {}", identity);

    let workload = WorkloadSpec::resolve(
        config.folder.clone(),
        config.jar.clone(),
        config.jvm_options.clone(),
    )?;

    let session = Session::new(coordinator, workload, identity, config.heartbeat_interval);
    match session.run().await? {
        SessionOutcome::Occupied(holder) => println!("Server is running at {holder}"),
        SessionOutcome::Ran => info!("Done"),
    }
    Ok(())
}
