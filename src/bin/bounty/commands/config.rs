//! Config command - show server configuration

use crate::client::LedgerClient;
use crate::style::*;
use anyhow::Result;

pub async fn run(client: &LedgerClient) -> Result<()> {
    print_header("Ledger Configuration");

    let config = client.config().await?;

    println!();
    println!(
        "Listen address:     {}:{}",
        config.server.host, config.server.port
    );
    println!("Initial owner:      {}", style_cyan(&config.ledger.owner));
    println!(
        "Re-activation:      {}",
        if config.ledger.allow_reactivation {
            style_yellow("allowed (issuers may top up active bounties)")
        } else {
            style_dim("disabled")
        }
    );
    println!(
        "Journal:            {}",
        match &config.storage.journal_path {
            Some(path) => path.clone(),
            None => style_yellow("none (in-memory)"),
        }
    );

    Ok(())
}
