//! Ledger events
//!
//! The event log is the external observability channel of the ledger: every
//! committed call appends exactly one event, failed calls append nothing.
//! Records are hash-chained so an auditor can detect a rewritten history.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{Amount, BountyId, Principal, SubmissionId};

/// Digest preceding the first record.
pub const GENESIS_DIGEST: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    BountyCreated {
        issuer: Principal,
        id: BountyId,
    },
    BountyActivated {
        id: BountyId,
        balance: Amount,
    },
    BountyClosed {
        id: BountyId,
        balance: Amount,
        refund_amount: Amount,
    },
    SubmissionCreated {
        submission_id: SubmissionId,
        bounty_id: BountyId,
        submitter: Principal,
    },
    SubmissionRejected {
        submission_id: SubmissionId,
        bounty_id: BountyId,
    },
    SubmissionAccepted {
        submission_id: SubmissionId,
        bounty_id: BountyId,
        old_balance: Amount,
        new_balance: Amount,
        reward_amount: Amount,
    },
    Paused {
        account: Principal,
    },
    Unpaused {
        account: Principal,
    },
    OwnershipTransferred {
        previous_owner: Principal,
        new_owner: Principal,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::BountyCreated { .. } => "BountyCreated",
            LedgerEvent::BountyActivated { .. } => "BountyActivated",
            LedgerEvent::BountyClosed { .. } => "BountyClosed",
            LedgerEvent::SubmissionCreated { .. } => "SubmissionCreated",
            LedgerEvent::SubmissionRejected { .. } => "SubmissionRejected",
            LedgerEvent::SubmissionAccepted { .. } => "SubmissionAccepted",
            LedgerEvent::Paused { .. } => "Paused",
            LedgerEvent::Unpaused { .. } => "Unpaused",
            LedgerEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }

    /// Id assigned by a creation event.
    pub fn created_id(&self) -> Option<u64> {
        match self {
            LedgerEvent::BountyCreated { id, .. } => Some(*id),
            LedgerEvent::SubmissionCreated { submission_id, .. } => Some(*submission_id),
            _ => None,
        }
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::BountyCreated { issuer, id } => {
                write!(f, "BountyCreated id={} issuer={}", id, issuer)
            }
            LedgerEvent::BountyActivated { id, balance } => {
                write!(f, "BountyActivated id={} balance={}", id, balance)
            }
            LedgerEvent::BountyClosed {
                id,
                balance,
                refund_amount,
            } => write!(
                f,
                "BountyClosed id={} balance={} refund={}",
                id, balance, refund_amount
            ),
            LedgerEvent::SubmissionCreated {
                submission_id,
                bounty_id,
                submitter,
            } => write!(
                f,
                "SubmissionCreated id={} bounty={} submitter={}",
                submission_id, bounty_id, submitter
            ),
            LedgerEvent::SubmissionRejected {
                submission_id,
                bounty_id,
            } => write!(
                f,
                "SubmissionRejected id={} bounty={}",
                submission_id, bounty_id
            ),
            LedgerEvent::SubmissionAccepted {
                submission_id,
                bounty_id,
                reward_amount,
                ..
            } => write!(
                f,
                "SubmissionAccepted id={} bounty={} reward={}",
                submission_id, bounty_id, reward_amount
            ),
            LedgerEvent::Paused { account } => write!(f, "Paused by {}", account),
            LedgerEvent::Unpaused { account } => write!(f, "Unpaused by {}", account),
            LedgerEvent::OwnershipTransferred {
                previous_owner,
                new_owner,
            } => write!(
                f,
                "OwnershipTransferred {} -> {}",
                previous_owner, new_owner
            ),
        }
    }
}

/// An event as stored in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: LedgerEvent,
    /// Hex SHA-256 over the previous digest, `seq` and the JSON event.
    pub digest: String,
}

/// Chain `event` onto `prev_digest`.
pub fn chain_digest(prev_digest: &str, seq: u64, event: &LedgerEvent) -> String {
    let payload = serde_json::to_vec(event).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(prev_digest.as_bytes());
    hasher.update(seq.to_be_bytes());
    hasher.update(&payload);
    hex::encode(hasher.finalize())
}

/// Append-only, hash-chained event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Digest of the latest record, or the genesis digest.
    pub fn head(&self) -> &str {
        self.records
            .last()
            .map(|r| r.digest.as_str())
            .unwrap_or(GENESIS_DIGEST)
    }

    /// Build the record that appending `event` would produce, without appending.
    pub fn next_record(&self, event: LedgerEvent, recorded_at: DateTime<Utc>) -> EventRecord {
        let seq = self.records.len() as u64;
        let digest = chain_digest(self.head(), seq, &event);
        EventRecord {
            seq,
            recorded_at,
            event,
            digest,
        }
    }

    pub(crate) fn append(&mut self, record: EventRecord) {
        debug_assert_eq!(record.seq, self.records.len() as u64);
        self.records.push(record);
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `seq >= since`.
    pub fn since(&self, since: u64) -> &[EventRecord] {
        let start = usize::try_from(since)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    /// Recompute the chain. Returns the first record that does not verify.
    pub fn verify_chain(&self) -> Result<(), u64> {
        let mut prev = GENESIS_DIGEST.to_string();
        for (i, record) in self.records.iter().enumerate() {
            let seq = i as u64;
            if record.seq != seq || chain_digest(&prev, seq, &record.event) != record.digest {
                return Err(seq);
            }
            prev = record.digest.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(id: BountyId) -> LedgerEvent {
        LedgerEvent::BountyCreated {
            issuer: Principal::new("issuer"),
            id,
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = LedgerEvent::SubmissionAccepted {
            submission_id: 1,
            bounty_id: 0,
            old_balance: 1_000_000_000_000_000_000,
            new_balance: 0,
            reward_amount: 1_000_000_000_000_000_000,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("SubmissionAccepted"));
        let deser: LedgerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_log_chains_digests() {
        let mut log = EventLog::new();
        assert_eq!(log.head(), GENESIS_DIGEST);

        let first = log.next_record(created(0), Utc::now());
        assert_eq!(first.seq, 0);
        log.append(first.clone());
        assert_eq!(log.head(), first.digest);

        let second = log.next_record(created(1), Utc::now());
        assert_ne!(second.digest, first.digest);
        log.append(second);

        assert_eq!(log.len(), 2);
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn test_next_record_does_not_append() {
        let log = EventLog::new();
        let _ = log.next_record(created(0), Utc::now());
        assert!(log.is_empty());
    }

    #[test]
    fn test_tampered_record_fails_verification() {
        let mut log = EventLog::new();
        for id in 0..3 {
            let record = log.next_record(created(id), Utc::now());
            log.append(record);
        }
        log.records[1].event = created(42);
        assert_eq!(log.verify_chain(), Err(1));
    }

    #[test]
    fn test_since_is_clamped() {
        let mut log = EventLog::new();
        for id in 0..3 {
            let record = log.next_record(created(id), Utc::now());
            log.append(record);
        }
        assert_eq!(log.since(1).len(), 2);
        assert_eq!(log.since(1)[0].seq, 1);
        assert!(log.since(10).is_empty());
    }
}
