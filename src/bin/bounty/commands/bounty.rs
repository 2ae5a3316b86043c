//! Bounty commands - list, show, create, activate, close

use super::print_committed;
use crate::client::LedgerClient;
use crate::style::*;
use anyhow::Result;
use bounty_escrow::Amount;

pub async fn list(client: &LedgerClient, offset: u64, limit: u64) -> Result<()> {
    print_header("Bounties");

    let page = client.bounties(offset, limit).await?;
    if page.items.is_empty() {
        print_info("No bounties in this range.");
        return Ok(());
    }

    println!();
    println!(
        "{:>5}  {:<18}  {:>14}  {:>14}  {:<30}  State",
        "ID", "Issuer", "Target", "Balance", "Data"
    );
    println!("{}", "─".repeat(100));
    for bounty in &page.items {
        println!(
            "{:>5}  {:<18}  {:>14}  {:>14}  {:<30}  {}",
            bounty.id,
            truncate_id(bounty.issuer.as_str()),
            bounty.target_reward,
            bounty.balance,
            ellipsize(&bounty.data, 30),
            style_bounty_state(bounty.state)
        );
    }

    println!();
    println!(
        "Showing {}-{} of {}",
        page.offset,
        page.offset + page.items.len() as u64,
        page.count
    );
    Ok(())
}

pub async fn show(client: &LedgerClient, id: u64) -> Result<()> {
    let bounty = client.bounty(id).await?;
    print_header(&format!("Bounty #{}", bounty.id));

    println!();
    println!("Issuer:           {}", style_cyan(bounty.issuer.as_str()));
    println!("State:            {}", style_bounty_state(bounty.state));
    println!("Target reward:    {}", bounty.target_reward);
    println!("Balance:          {}", style_bold(&bounty.balance.to_string()));
    println!("Created:          {}", bounty.created_at.to_rfc3339());
    println!("Data:             {}", bounty.data);

    let submissions = client.bounty_submissions(id, 0, 20).await?;
    println!();
    println!("{}", style_bold(&format!("Submissions ({})", submissions.count)));
    for submission in &submissions.items {
        println!(
            "  #{:<5} {:<18} {}",
            submission.id,
            truncate_id(submission.submitter.as_str()),
            style_submission_state(submission.state)
        );
    }
    if submissions.count > submissions.items.len() as u64 {
        println!(
            "  {}",
            style_dim(&format!("... run `bounty submission list {}` for all", id))
        );
    }
    Ok(())
}

pub async fn create(client: &LedgerClient, data: &str, reward: Amount) -> Result<()> {
    let resp = client.create_bounty(data, reward).await?;
    print_committed("Bounty created", &resp);
    Ok(())
}

pub async fn activate(client: &LedgerClient, id: u64, amount: Amount, value: Amount) -> Result<()> {
    let resp = client.activate_bounty(id, amount, value).await?;
    print_committed(&format!("Bounty #{} funded with {}", id, amount), &resp);
    Ok(())
}

pub async fn close(client: &LedgerClient, id: u64) -> Result<()> {
    let resp = client.close_bounty(id).await?;
    print_committed(&format!("Bounty #{} closed", id), &resp);
    Ok(())
}
