//! Arbor server binary.
//!
//! Multi-tenant hierarchical node-tree service over HTTP.

use clap::{Arg, Command};
use tokio::signal;
use tracing::{info, warn};

use arbor::core::Config;
use arbor::{NodeTreeService, Result, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("arbor")
        .version(arbor::VERSION)
        .about("Multi-tenant hierarchical node-tree service.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .value_name("N")
                .help("Number of worker threads"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .get_matches();

    // Load configuration
    let mut config = if let Some(config_path) = matches.get_one::<String>("config") {
        Config::from_file(config_path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    // Initialize logging
    arbor::init_logging(&config.logging);
    info!("Starting Arbor v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Using {} worker threads",
        config.optimal_worker_threads()
    );

    // Initialize the store and the request service
    let store = Store::new_shared(&config.storage);
    let service = NodeTreeService::new_shared(store, &config);

    // Serve until a shutdown signal fires, then drain in-flight connections
    let addr = config.server.http_addr;
    arbor::api::start_server(addr, service, async {
        setup_shutdown_handler().await;
        warn!("Received shutdown signal, draining in-flight connections...");
    })
    .await?;

    info!("Shutdown complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr
            .parse()
            .map_err(|e| arbor::Error::config(format!("Invalid HTTP address: {}", e)))?;
    }

    if let Some(workers) = matches.get_one::<String>("workers") {
        config.server.worker_threads = workers
            .parse()
            .map_err(|e| arbor::Error::config(format!("Invalid worker count: {}", e)))?;
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    Ok(())
}

/// Setup graceful shutdown signal handling
async fn setup_shutdown_handler() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
