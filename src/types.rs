//! Ledger records: bounties, submissions and the principals acting on them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type BountyId = u64;
pub type SubmissionId = u64;

/// Smallest unit of value held in custody (wei-sized, hence 128 bits).
pub type Amount = u128;

/// Identity of a caller. Opaque to the ledger; compared byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BountyState {
    Created,
    Activated,
    Closed,
}

impl fmt::Display for BountyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BountyState::Created => "created",
            BountyState::Activated => "activated",
            BountyState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Created,
    Accepted,
    Rejected,
}

impl SubmissionState {
    /// Accepted and rejected submissions can never be acted on again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionState::Created)
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionState::Created => "created",
            SubmissionState::Accepted => "accepted",
            SubmissionState::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounty {
    pub id: BountyId,
    pub issuer: Principal,
    pub data: String,
    pub target_reward: Amount,
    pub balance: Amount,
    pub state: BountyState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub bounty_id: BountyId,
    pub submitter: Principal,
    pub data: String,
    pub state: SubmissionState,
    pub created_at: DateTime<Utc>,
}

/// A bounded slice of an append-only collection, read under one guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub offset: u64,
    pub items: Vec<T>,
}

/// Ledger-wide counters and circuit breaker state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub owner: Principal,
    pub paused: bool,
    pub bounty_count: u64,
    pub submission_count: u64,
    pub custody_total: Amount,
    pub event_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_serializes_as_plain_string() {
        let p = Principal::new("0xabc");
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"0xabc\"");
    }

    #[test]
    fn test_submission_terminal_states() {
        assert!(!SubmissionState::Created.is_terminal());
        assert!(SubmissionState::Accepted.is_terminal());
        assert!(SubmissionState::Rejected.is_terminal());
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&BountyState::Activated).unwrap(),
            "\"activated\""
        );
        assert_eq!(BountyState::Closed.to_string(), "closed");
    }
}
