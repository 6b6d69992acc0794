use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use tripoll::args::Args;
use tripoll::{Snmp2Connector, Supervisor, TripollConfig, build_sink};
use tripoll_common::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = TripollConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    // Initialize tracing
    init_tracing(&args.logging(&config.logging)).context("Failed to initialize tracing")?;

    tracing::info!(
        config = ?args.config,
        hosts = config.hosts.len(),
        metrics = ?config.polling.metrics,
        "tripoll starting"
    );

    let sink = build_sink(&config.sink)
        .await
        .context("Failed to create point sink")?;
    let connector = Arc::new(Snmp2Connector::new(config.snmp.request_timeout()));

    let supervisor = Supervisor::new(&config, connector, sink)?
        .with_point_logging(args.debug || config.polling.log_points);

    // Stop pollers on Ctrl+C
    let shutdown = supervisor.shutdown_token();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received shutdown signal"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
        }
        shutdown.cancel();
    });

    supervisor.run().await;

    tracing::info!("Goodbye!");

    Ok(())
}
