//! Event log and audit commands

use crate::client::LedgerClient;
use crate::style::*;
use anyhow::Result;

pub async fn run(client: &LedgerClient, since: u64) -> Result<()> {
    print_header("Event Log");

    let records = client.events(since).await?;
    if records.is_empty() {
        print_info("No events yet.");
        return Ok(());
    }

    println!();
    for record in &records {
        println!(
            "{:>6}  {}  {}  {}",
            format!("#{}", record.seq),
            style_dim(&record.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            record.event,
            style_dim(&truncate_id(&record.digest))
        );
    }
    Ok(())
}

pub async fn audit(client: &LedgerClient) -> Result<()> {
    print_header("Solvency Audit");

    let report = client.audit().await?;
    println!();
    println!("Events checked:    {}", report.event_count);
    println!(
        "Hash chain:        {}",
        match report.first_invalid_seq {
            None => style_green("valid"),
            Some(seq) => style_red(&format!("broken at #{}", seq)),
        }
    );
    println!("Custody total:     {}", report.custody_total);
    println!("Sum of balances:   {}", report.sum_of_balances);
    println!("From event log:    {}", report.event_custody);
    println!(
        "Released:          {} (events: {})",
        report.total_released, report.event_released
    );
    println!();

    if report.is_healthy() {
        print_success("Ledger is solvent and its history verifies");
    } else {
        print_error("Audit failed");
    }
    Ok(())
}
