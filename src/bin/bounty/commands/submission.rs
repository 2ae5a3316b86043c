//! Submission commands

use super::print_committed;
use crate::client::LedgerClient;
use crate::style::*;
use anyhow::Result;

pub async fn list(client: &LedgerClient, bounty_id: u64, offset: u64, limit: u64) -> Result<()> {
    print_header(&format!("Submissions for bounty #{}", bounty_id));

    let page = client.bounty_submissions(bounty_id, offset, limit).await?;
    if page.items.is_empty() {
        print_info("No submissions in this range.");
        return Ok(());
    }

    println!();
    println!("{:>5}  {:<18}  {:<40}  State", "ID", "Submitter", "Data");
    println!("{}", "─".repeat(80));
    for submission in &page.items {
        println!(
            "{:>5}  {:<18}  {:<40}  {}",
            submission.id,
            truncate_id(submission.submitter.as_str()),
            ellipsize(&submission.data, 40),
            style_submission_state(submission.state)
        );
    }
    println!();
    println!("Total: {}", page.count);
    Ok(())
}

pub async fn show(client: &LedgerClient, id: u64) -> Result<()> {
    let submission = client.submission(id).await?;
    print_header(&format!("Submission #{}", submission.id));

    println!();
    println!("Bounty:           #{}", submission.bounty_id);
    println!("Submitter:        {}", style_cyan(submission.submitter.as_str()));
    println!("State:            {}", style_submission_state(submission.state));
    println!("Created:          {}", submission.created_at.to_rfc3339());
    println!("Data:             {}", submission.data);
    Ok(())
}

pub async fn create(client: &LedgerClient, bounty_id: u64, data: &str) -> Result<()> {
    let resp = client.create_submission(bounty_id, data).await?;
    print_committed(&format!("Submitted to bounty #{}", bounty_id), &resp);
    Ok(())
}

pub async fn accept(client: &LedgerClient, bounty_id: u64, submission_id: u64) -> Result<()> {
    let resp = client.accept_submission(bounty_id, submission_id).await?;
    print_committed(&format!("Submission #{} accepted", submission_id), &resp);
    Ok(())
}

pub async fn reject(client: &LedgerClient, bounty_id: u64, submission_id: u64) -> Result<()> {
    let resp = client.reject_submission(bounty_id, submission_id).await?;
    print_committed(&format!("Submission #{} rejected", submission_id), &resp);
    Ok(())
}
