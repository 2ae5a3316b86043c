//! Escrow Ledger API Client
//!
//! Thin typed wrapper over the ledger server's HTTP API. The acting
//! principal, when set, is sent in the `x-principal` header.

use anyhow::{anyhow, Context, Result};
use bounty_escrow::server::{
    ActivateBountyRequest, BalanceResponse, CommitResponse, CreateBountyRequest,
    CreateSubmissionRequest, ErrorBody, HealthResponse, TransferOwnershipRequest,
    PRINCIPAL_HEADER,
};
use bounty_escrow::{
    Amount, AuditReport, Bounty, BountyId, Config, EventRecord, LedgerSummary, Page, Submission,
    SubmissionId,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct LedgerClient {
    client: Client,
    base_url: String,
    principal: Option<String>,
}

impl LedgerClient {
    pub fn new(base_url: &str, principal: Option<String>) -> Self {
        // Build HTTP client with timeout, falling back to default client if builder fails
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            principal,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn with_principal(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.principal {
            Some(p) => request.header(PRINCIPAL_HEADER, p),
            None => request,
        }
    }

    fn require_principal(&self) -> Result<()> {
        if self.principal.is_none() {
            return Err(anyhow!(
                "No principal set. Pass --as <principal> or set LEDGER_PRINCIPAL"
            ));
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.base_url))?;
        decode(resp).await
    }

    async fn post<B: Serialize>(&self, path: &str, body: Option<&B>) -> Result<CommitResponse> {
        self.require_principal()?;
        let mut request = self.with_principal(self.client.post(self.url(path)));
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.base_url))?;
        decode(resp).await
    }

    async fn post_empty(&self, path: &str) -> Result<CommitResponse> {
        self.post::<()>(path, None).await
    }

    // ========================================================================
    // LEDGER
    // ========================================================================

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("health").await
    }

    pub async fn config(&self) -> Result<Config> {
        self.get("config").await
    }

    pub async fn summary(&self) -> Result<LedgerSummary> {
        self.get("ledger").await
    }

    pub async fn events(&self, since: u64) -> Result<Vec<EventRecord>> {
        self.get(&format!("events?since={}", since)).await
    }

    pub async fn audit(&self) -> Result<AuditReport> {
        self.get("audit").await
    }

    // ========================================================================
    // BOUNTIES
    // ========================================================================

    pub async fn bounties(&self, offset: u64, limit: u64) -> Result<Page<Bounty>> {
        self.get(&format!("bounties?offset={}&limit={}", offset, limit))
            .await
    }

    pub async fn bounty(&self, id: BountyId) -> Result<Bounty> {
        self.get(&format!("bounties/{}", id)).await
    }

    pub async fn create_bounty(&self, data: &str, target_reward: Amount) -> Result<CommitResponse> {
        let body = CreateBountyRequest {
            data: data.to_string(),
            target_reward,
        };
        self.post("bounties", Some(&body)).await
    }

    pub async fn activate_bounty(
        &self,
        id: BountyId,
        amount: Amount,
        value: Amount,
    ) -> Result<CommitResponse> {
        let body = ActivateBountyRequest { amount, value };
        self.post(&format!("bounties/{}/activate", id), Some(&body))
            .await
    }

    pub async fn close_bounty(&self, id: BountyId) -> Result<CommitResponse> {
        self.post_empty(&format!("bounties/{}/close", id)).await
    }

    // ========================================================================
    // SUBMISSIONS
    // ========================================================================

    pub async fn bounty_submissions(
        &self,
        bounty_id: BountyId,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Submission>> {
        self.get(&format!(
            "bounties/{}/submissions?offset={}&limit={}",
            bounty_id, offset, limit
        ))
        .await
    }

    pub async fn submission(&self, id: SubmissionId) -> Result<Submission> {
        self.get(&format!("submissions/{}", id)).await
    }

    pub async fn create_submission(&self, bounty_id: BountyId, data: &str) -> Result<CommitResponse> {
        let body = CreateSubmissionRequest {
            data: data.to_string(),
        };
        self.post(&format!("bounties/{}/submissions", bounty_id), Some(&body))
            .await
    }

    pub async fn accept_submission(
        &self,
        bounty_id: BountyId,
        submission_id: SubmissionId,
    ) -> Result<CommitResponse> {
        self.post_empty(&format!(
            "bounties/{}/submissions/{}/accept",
            bounty_id, submission_id
        ))
        .await
    }

    pub async fn reject_submission(
        &self,
        bounty_id: BountyId,
        submission_id: SubmissionId,
    ) -> Result<CommitResponse> {
        self.post_empty(&format!(
            "bounties/{}/submissions/{}/reject",
            bounty_id, submission_id
        ))
        .await
    }

    // ========================================================================
    // PER-PRINCIPAL
    // ========================================================================

    pub async fn bounties_of(&self, principal: &str, offset: u64, limit: u64) -> Result<Page<Bounty>> {
        self.get(&format!(
            "{}?offset={}&limit={}",
            principal_path(principal, "bounties"),
            offset,
            limit
        ))
        .await
    }

    pub async fn submissions_of(
        &self,
        principal: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Submission>> {
        self.get(&format!(
            "{}?offset={}&limit={}",
            principal_path(principal, "submissions"),
            offset,
            limit
        ))
        .await
    }

    pub async fn balance_of(&self, principal: &str) -> Result<BalanceResponse> {
        self.get(&principal_path(principal, "balance")).await
    }

    // ========================================================================
    // ADMIN
    // ========================================================================

    pub async fn pause(&self) -> Result<CommitResponse> {
        self.post_empty("admin/pause").await
    }

    pub async fn unpause(&self) -> Result<CommitResponse> {
        self.post_empty("admin/unpause").await
    }

    pub async fn transfer_ownership(&self, new_owner: &str) -> Result<CommitResponse> {
        let body = TransferOwnershipRequest {
            new_owner: new_owner.to_string(),
        };
        self.post("admin/owner", Some(&body)).await
    }

    /// Principal the client acts as, if any.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }
}

/// Principals may carry `?`, `#`, `/` or `%`, so they are encoded as a
/// single path segment.
fn principal_path(principal: &str, resource: &str) -> String {
    format!("principals/{}/{}", urlencoding::encode(principal), resource)
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return resp.json().await.context("Unexpected response body");
    }

    let text = resp.text().await.unwrap_or_else(|_| "Unknown error".into());
    Err(match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => anyhow!("{}", describe_error(&body)),
        Err(_) => anyhow!("Request failed ({}): {}", status, text),
    })
}

fn describe_error(body: &ErrorBody) -> String {
    match &body.operation {
        Some(op) => format!("{} failed [{}]: {}", op, body.error, body.message),
        None => format!("[{}] {}", body.error, body.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = LedgerClient::new("http://localhost:8080", None);
        assert_eq!(client.base_url, "http://localhost:8080");
        assert!(client.principal().is_none());
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = LedgerClient::new("http://localhost:8080/", Some("0xalice".to_string()));
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.principal(), Some("0xalice"));
    }

    #[test]
    fn test_url() {
        let client = LedgerClient::new("http://localhost:8080", None);
        assert_eq!(client.url("/bounties/3"), "http://localhost:8080/bounties/3");
        assert_eq!(client.url("events?since=2"), "http://localhost:8080/events?since=2");
    }

    #[test]
    fn test_principal_path_encodes_segment() {
        assert_eq!(principal_path("0xalice", "balance"), "principals/0xalice/balance");
        assert_eq!(
            principal_path("0xa?b#c", "bounties"),
            "principals/0xa%3Fb%23c/bounties"
        );
        assert_eq!(
            principal_path("org/team%1", "submissions"),
            "principals/org%2Fteam%251/submissions"
        );
    }

    #[tokio::test]
    async fn test_mutation_requires_principal() {
        let client = LedgerClient::new("http://localhost:8080", None);
        let err = client.close_bounty(0).await.unwrap_err();
        assert!(err.to_string().contains("--as"));
    }

    #[test]
    fn test_describe_error() {
        let body = ErrorBody {
            error: "PAUSED".to_string(),
            message: "Ledger is paused".to_string(),
            operation: Some("close_bounty(id=0)".to_string()),
        };
        assert_eq!(
            describe_error(&body),
            "close_bounty(id=0) failed [PAUSED]: Ledger is paused"
        );
    }
}
