//! Status command - ledger overview

use crate::client::LedgerClient;
use crate::style::*;
use anyhow::Result;

pub async fn run(client: &LedgerClient) -> Result<()> {
    print_header("Ledger Status");

    let health = client.health().await?;
    let summary = client.summary().await?;

    println!();
    println!(
        "Server:           {} (v{}, up {}s)",
        style_green("healthy"),
        health.version,
        health.uptime_secs
    );
    println!("Owner:            {}", style_cyan(summary.owner.as_str()));
    println!(
        "Circuit breaker:  {}",
        if summary.paused {
            style_red("paused")
        } else {
            style_green("running")
        }
    );
    println!("Bounties:         {}", style_bold(&summary.bounty_count.to_string()));
    println!(
        "Submissions:      {}",
        style_bold(&summary.submission_count.to_string())
    );
    println!("Custody total:    {}", style_bold(&summary.custody_total.to_string()));
    println!("Events:           {}", summary.event_count);

    if !health.persistent {
        println!();
        print_warning("Server runs without a journal; state is lost on restart");
    }
    if let Some(p) = client.principal() {
        println!();
        print_info(&format!("Acting as {}", style_cyan(p)));
    }

    Ok(())
}
