//! Owner-only commands

use super::print_committed;
use crate::client::LedgerClient;
use anyhow::Result;

pub async fn pause(client: &LedgerClient) -> Result<()> {
    let resp = client.pause().await?;
    print_committed("Ledger paused", &resp);
    Ok(())
}

pub async fn unpause(client: &LedgerClient) -> Result<()> {
    let resp = client.unpause().await?;
    print_committed("Ledger unpaused", &resp);
    Ok(())
}

pub async fn transfer_owner(client: &LedgerClient, new_owner: &str) -> Result<()> {
    let resp = client.transfer_ownership(new_owner).await?;
    print_committed(&format!("Ownership transferred to {}", new_owner), &resp);
    Ok(())
}
