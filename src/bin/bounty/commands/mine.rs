//! Per-principal views - my bounties, my submissions, released balance

use crate::client::LedgerClient;
use crate::style::*;
use anyhow::{anyhow, Result};

const PAGE: u64 = 50;

fn target(client: &LedgerClient, principal: Option<String>) -> Result<String> {
    principal
        .or_else(|| client.principal().map(str::to_string))
        .ok_or_else(|| anyhow!("No principal given. Pass one or use --as <principal>"))
}

pub async fn run(client: &LedgerClient, principal: Option<String>) -> Result<()> {
    let principal = target(client, principal)?;
    print_header(&format!("Activity of {}", principal));

    let bounties = client.bounties_of(&principal, 0, PAGE).await?;
    println!();
    println!("{}", style_bold(&format!("Bounties issued ({})", bounties.count)));
    if bounties.items.is_empty() {
        println!("  {}", style_dim("none"));
    }
    for bounty in &bounties.items {
        println!(
            "  #{:<5} balance {:<14} {}",
            bounty.id,
            bounty.balance,
            style_bounty_state(bounty.state)
        );
    }

    let submissions = client.submissions_of(&principal, 0, PAGE).await?;
    println!();
    println!(
        "{}",
        style_bold(&format!("Submissions made ({})", submissions.count))
    );
    if submissions.items.is_empty() {
        println!("  {}", style_dim("none"));
    }
    for submission in &submissions.items {
        println!(
            "  #{:<5} bounty #{:<5} {}",
            submission.id,
            submission.bounty_id,
            style_submission_state(submission.state)
        );
    }

    Ok(())
}

pub async fn balance(client: &LedgerClient, principal: Option<String>) -> Result<()> {
    let principal = target(client, principal)?;
    let resp = client.balance_of(&principal).await?;
    println!(
        "{} has received {}",
        style_cyan(resp.principal.as_str()),
        style_green(&resp.balance.to_string())
    );
    Ok(())
}
