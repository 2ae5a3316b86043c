//! Escrow ledger
//!
//! Owns every bounty and submission record, the custodied funds and the event
//! log. Each mutating call is split in two phases:
//!
//! 1. `prepare` runs every check and every balance computation against the
//!    current state without touching it, producing a [`Transition`].
//! 2. `commit` applies a prepared transition. It cannot fail.
//!
//! A caller holding exclusive access can therefore persist a transition
//! between the two phases and abort with the ledger untouched.

mod audit;
mod bounty;
mod submission;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::access::{is_valid_principal, AccessControl};
use crate::command::Command;
use crate::error::LedgerError;
use crate::events::{EventLog, EventRecord, LedgerEvent};
use crate::types::{
    Amount, Bounty, BountyId, LedgerSummary, Page, Principal, Submission, SubmissionId,
};

pub use audit::AuditReport;

/// Policy knobs not fixed by the ledger's state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOptions {
    /// Allow `activate_bounty` on an already activated bounty to top up its
    /// balance. Closed bounties can never be re-activated.
    #[serde(default)]
    pub allow_reactivation: bool,
}

/// State change computed by `prepare`, applied by `commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    InsertBounty(Bounty),
    FundBounty {
        id: BountyId,
        balance: Amount,
        custody_total: Amount,
    },
    CloseBounty {
        id: BountyId,
        refund_to: Principal,
        released: Amount,
        custody_total: Amount,
    },
    InsertSubmission(Submission),
    RejectSubmission {
        id: SubmissionId,
    },
    Payout {
        bounty_id: BountyId,
        submission_id: SubmissionId,
        payee: Principal,
        released: Amount,
        custody_total: Amount,
    },
    SetPaused(bool),
    SetOwner(Principal),
}

/// A validated call, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub(crate) effect: Effect,
    record: EventRecord,
}

impl Transition {
    /// The record that committing this transition appends.
    pub fn record(&self) -> &EventRecord {
        &self.record
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) access: AccessControl,
    pub(crate) options: LedgerOptions,
    pub(crate) bounties: Vec<Bounty>,
    pub(crate) submissions: Vec<Submission>,
    pub(crate) bounties_by_issuer: HashMap<Principal, Vec<BountyId>>,
    pub(crate) submissions_by_submitter: HashMap<Principal, Vec<SubmissionId>>,
    /// Indexed by bounty id.
    pub(crate) submissions_by_bounty: Vec<Vec<SubmissionId>>,
    pub(crate) custody_total: Amount,
    pub(crate) released: HashMap<Principal, Amount>,
    pub(crate) events: EventLog,
}

impl Ledger {
    pub fn new(owner: Principal, options: LedgerOptions) -> Self {
        Self {
            access: AccessControl::new(owner),
            options,
            bounties: Vec::new(),
            submissions: Vec::new(),
            bounties_by_issuer: HashMap::new(),
            submissions_by_submitter: HashMap::new(),
            submissions_by_bounty: Vec::new(),
            custody_total: 0,
            released: HashMap::new(),
            events: EventLog::new(),
        }
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Validate `command` for `caller` against the current state.
    pub fn prepare(
        &self,
        caller: &Principal,
        command: &Command,
        now: DateTime<Utc>,
    ) -> Result<Transition, LedgerError> {
        let (effect, event) = match command {
            Command::CreateBounty {
                data,
                target_reward,
            } => self.prepare_create_bounty(caller, data, *target_reward, now)?,
            Command::ActivateBounty { id, amount, funds } => {
                self.prepare_activate_bounty(caller, *id, *amount, *funds)?
            }
            Command::CloseBounty { id } => self.prepare_close_bounty(caller, *id)?,
            Command::CreateSubmission { bounty_id, data } => {
                self.prepare_create_submission(caller, *bounty_id, data, now)?
            }
            Command::RejectSubmission {
                bounty_id,
                submission_id,
            } => self.prepare_reject_submission(caller, *bounty_id, *submission_id)?,
            Command::AcceptSubmission {
                bounty_id,
                submission_id,
            } => self.prepare_accept_submission(caller, *bounty_id, *submission_id)?,
            Command::Pause => {
                self.access.require_owner(caller)?;
                (
                    Effect::SetPaused(true),
                    LedgerEvent::Paused {
                        account: caller.clone(),
                    },
                )
            }
            Command::Unpause => {
                self.access.require_owner(caller)?;
                (
                    Effect::SetPaused(false),
                    LedgerEvent::Unpaused {
                        account: caller.clone(),
                    },
                )
            }
            Command::TransferOwnership { new_owner } => {
                self.access.require_owner(caller)?;
                if !is_valid_principal(new_owner.as_str()) {
                    return Err(LedgerError::invalid_state(format!(
                        "'{}' is not a usable owner principal",
                        new_owner
                    )));
                }
                (
                    Effect::SetOwner(new_owner.clone()),
                    LedgerEvent::OwnershipTransferred {
                        previous_owner: self.access.owner().clone(),
                        new_owner: new_owner.clone(),
                    },
                )
            }
        };

        let record = self.events.next_record(event, now);
        Ok(Transition { effect, record })
    }

    /// Apply a transition produced by `prepare` on this exact state.
    pub fn commit(&mut self, transition: Transition) -> EventRecord {
        let Transition { effect, record } = transition;
        match effect {
            Effect::InsertBounty(bounty) => self.commit_insert_bounty(bounty),
            Effect::FundBounty {
                id,
                balance,
                custody_total,
            } => self.commit_fund_bounty(id, balance, custody_total),
            Effect::CloseBounty {
                id,
                refund_to,
                released,
                custody_total,
            } => self.commit_close_bounty(id, refund_to, released, custody_total),
            Effect::InsertSubmission(submission) => self.commit_insert_submission(submission),
            Effect::RejectSubmission { id } => self.commit_reject_submission(id),
            Effect::Payout {
                bounty_id,
                submission_id,
                payee,
                released,
                custody_total,
            } => self.commit_payout(bounty_id, submission_id, payee, released, custody_total),
            Effect::SetPaused(paused) => self.access.set_paused(paused),
            Effect::SetOwner(owner) => self.access.set_owner(owner),
        }

        debug!("Committed #{} {}", record.seq, record.event);
        self.events.append(record.clone());
        record
    }

    /// Prepare and commit in one step.
    pub fn apply(
        &mut self,
        caller: &Principal,
        command: &Command,
        now: DateTime<Utc>,
    ) -> Result<EventRecord, LedgerError> {
        let transition = self.prepare(caller, command, now)?;
        Ok(self.commit(transition))
    }

    // ========================================================================
    // TYPED ENTRY POINTS
    // ========================================================================

    pub fn create_bounty(
        &mut self,
        caller: &Principal,
        data: impl Into<String>,
        target_reward: Amount,
    ) -> Result<BountyId, LedgerError> {
        let id = self.bounty_count();
        let command = Command::CreateBounty {
            data: data.into(),
            target_reward,
        };
        self.apply(caller, &command, Utc::now())?;
        Ok(id)
    }

    pub fn activate_bounty(
        &mut self,
        caller: &Principal,
        id: BountyId,
        amount: Amount,
        funds: Amount,
    ) -> Result<EventRecord, LedgerError> {
        self.apply(caller, &Command::ActivateBounty { id, amount, funds }, Utc::now())
    }

    pub fn close_bounty(
        &mut self,
        caller: &Principal,
        id: BountyId,
    ) -> Result<EventRecord, LedgerError> {
        self.apply(caller, &Command::CloseBounty { id }, Utc::now())
    }

    pub fn create_submission(
        &mut self,
        caller: &Principal,
        bounty_id: BountyId,
        data: impl Into<String>,
    ) -> Result<SubmissionId, LedgerError> {
        let id = self.submission_count();
        let command = Command::CreateSubmission {
            bounty_id,
            data: data.into(),
        };
        self.apply(caller, &command, Utc::now())?;
        Ok(id)
    }

    pub fn reject_submission(
        &mut self,
        caller: &Principal,
        bounty_id: BountyId,
        submission_id: SubmissionId,
    ) -> Result<EventRecord, LedgerError> {
        let command = Command::RejectSubmission {
            bounty_id,
            submission_id,
        };
        self.apply(caller, &command, Utc::now())
    }

    pub fn accept_submission(
        &mut self,
        caller: &Principal,
        bounty_id: BountyId,
        submission_id: SubmissionId,
    ) -> Result<EventRecord, LedgerError> {
        let command = Command::AcceptSubmission {
            bounty_id,
            submission_id,
        };
        self.apply(caller, &command, Utc::now())
    }

    pub fn pause(&mut self, caller: &Principal) -> Result<EventRecord, LedgerError> {
        self.apply(caller, &Command::Pause, Utc::now())
    }

    pub fn unpause(&mut self, caller: &Principal) -> Result<EventRecord, LedgerError> {
        self.apply(caller, &Command::Unpause, Utc::now())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Principal,
        new_owner: Principal,
    ) -> Result<EventRecord, LedgerError> {
        self.apply(caller, &Command::TransferOwnership { new_owner }, Utc::now())
    }

    // ========================================================================
    // LEDGER-WIDE READS
    // ========================================================================

    pub fn owner(&self) -> &Principal {
        self.access.owner()
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    pub fn options(&self) -> &LedgerOptions {
        &self.options
    }

    pub fn custody_total(&self) -> Amount {
        self.custody_total
    }

    /// Funds the ledger has released to `principal` (payouts and refunds).
    pub fn balance_of(&self, principal: &Principal) -> Amount {
        self.released.get(principal).copied().unwrap_or(0)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            owner: self.owner().clone(),
            paused: self.is_paused(),
            bounty_count: self.bounty_count(),
            submission_count: self.submission_count(),
            custody_total: self.custody_total,
            event_count: self.events.len() as u64,
        }
    }
}

/// Positional read into an append-only id list.
pub(crate) fn nth_id(ids: Option<&Vec<u64>>, index: u64) -> Option<u64> {
    let index = usize::try_from(index).ok()?;
    ids.and_then(|ids| ids.get(index)).copied()
}

/// Slice `items[offset..offset + limit]` of an append-only collection.
pub(crate) fn page_of<T: Clone>(items: &[T], offset: u64, limit: u64) -> Page<T> {
    let count = items.len() as u64;
    let start = offset.min(count) as usize;
    let end = offset.saturating_add(limit).min(count) as usize;
    Page {
        count,
        offset,
        items: items[start..end].to_vec(),
    }
}
