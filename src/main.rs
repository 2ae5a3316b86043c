//! Bounty Escrow Server
//!
//! Serves the escrow ledger over HTTP

use std::sync::Arc;

use anyhow::Context;
use bounty_escrow::{Config, EscrowService};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Bounty Escrow Server");

    let config = Config::load().context("Failed to load configuration")?;
    info!(
        "Ledger owner: {} (re-activation {})",
        config.ledger.owner,
        if config.ledger.allow_reactivation {
            "allowed"
        } else {
            "disabled"
        }
    );

    let service = Arc::new(EscrowService::from_config(&config)?);
    let summary = service.summary();
    info!(
        "Ledger ready: {} bounties, {} submissions, {} events, custody {}",
        summary.bounty_count, summary.submission_count, summary.event_count, summary.custody_total
    );

    bounty_escrow::server::run_server(config, service).await?;

    Ok(())
}
