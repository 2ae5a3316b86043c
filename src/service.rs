//! Escrow service
//!
//! Thread-safe front of the ledger. Writers are serialized behind one write
//! lock; each call is prepared, persisted to the journal (when configured)
//! and only then committed, so a storage failure leaves the ledger as it
//! was. Readers share the read lock and always see committed state.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::access::{resolve_principal, CallContext};
use crate::command::Command;
use crate::config::Config;
use crate::error::LedgerError;
use crate::events::EventRecord;
use crate::ledger::{AuditReport, Ledger, LedgerOptions};
use crate::storage::LedgerJournal;
use crate::types::{
    Amount, Bounty, BountyId, LedgerSummary, Page, Principal, Submission, SubmissionId,
};

/// Committed records buffered for slow subscribers.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{command} rejected: {source}")]
    Rejected {
        command: Command,
        source: LedgerError,
    },
    #[error("{command} not persisted: {message}")]
    Journal { command: Command, message: String },
}

impl ServiceError {
    /// The call that failed, with its arguments.
    pub fn command(&self) -> &Command {
        match self {
            ServiceError::Rejected { command, .. } | ServiceError::Journal { command, .. } => {
                command
            }
        }
    }

    pub fn ledger_error(&self) -> Option<&LedgerError> {
        match self {
            ServiceError::Rejected { source, .. } => Some(source),
            ServiceError::Journal { .. } => None,
        }
    }
}

pub struct EscrowService {
    ledger: RwLock<Ledger>,
    journal: Option<LedgerJournal>,
    events_tx: broadcast::Sender<EventRecord>,
}

impl EscrowService {
    /// Volatile service with no journal.
    pub fn in_memory(owner: Principal, options: LedgerOptions) -> Self {
        Self::with_ledger(Ledger::new(owner, options), None)
    }

    /// Open a service backed by `journal`, replaying every stored call.
    ///
    /// `owner` must be the owner the journal was started with; later
    /// ownership transfers are part of the journal itself.
    pub fn open(owner: Principal, options: LedgerOptions, journal: LedgerJournal) -> Result<Self> {
        let mut ledger = Ledger::new(owner, options);
        let entries = journal.load().context("Failed to load journal")?;
        let replayed = entries.len();

        for entry in entries {
            let seq = entry.record.seq;
            let record = ledger
                .apply(&entry.principal, &entry.command, entry.record.recorded_at)
                .with_context(|| format!("Journal entry #{} ({}) no longer applies", seq, entry.command))?;
            if record != entry.record {
                bail!(
                    "Journal entry #{} diverges on replay: stored {} ({}), replayed {} ({})",
                    seq,
                    entry.record.event,
                    entry.record.digest,
                    record.event,
                    record.digest
                );
            }
        }

        info!("Replayed {} journal entries", replayed);
        Ok(Self::with_ledger(ledger, Some(journal)))
    }

    /// Build the service described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let owner = config.ledger.owner_principal()?;
        let options = config.ledger.options();
        match &config.storage.journal_path {
            Some(path) => Self::open(owner, options, LedgerJournal::new(path)?),
            None => {
                warn!("No journal configured, ledger state will not survive a restart");
                Ok(Self::in_memory(owner, options))
            }
        }
    }

    fn with_ledger(ledger: Ledger, journal: Option<LedgerJournal>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            ledger: RwLock::new(ledger),
            journal,
            events_tx,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.journal.is_some()
    }

    /// Run one mutating call on behalf of the principal in `ctx`.
    pub fn execute(&self, ctx: &CallContext, command: Command) -> Result<EventRecord, ServiceError> {
        let mut ledger = self.ledger.write();

        // A paused ledger refuses non-admin calls before looking at the caller.
        if !command.is_admin() && ledger.is_paused() {
            let source = LedgerError::Paused;
            warn!("{} rejected: {}", command, source);
            return Err(ServiceError::Rejected { command, source });
        }

        let principal = match resolve_principal(ctx) {
            Ok(principal) => principal,
            Err(source) => {
                warn!("{} rejected: {}", command, source);
                return Err(ServiceError::Rejected { command, source });
            }
        };

        let transition = match ledger.prepare(&principal, &command, Utc::now()) {
            Ok(transition) => transition,
            Err(source) => {
                warn!("{} by {} rejected: {}", command, principal, source);
                return Err(ServiceError::Rejected { command, source });
            }
        };

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.append(&principal, &command, transition.record()) {
                warn!("{} by {} not persisted: {:#}", command, principal, e);
                return Err(ServiceError::Journal {
                    command,
                    message: format!("{:#}", e),
                });
            }
        }

        let record = ledger.commit(transition);
        drop(ledger);

        info!(
            "{} by {} committed as #{} ({})",
            command,
            principal,
            record.seq,
            record.event.name()
        );
        // No receivers is not an error.
        let _ = self.events_tx.send(record.clone());
        Ok(record)
    }

    /// Receive every record committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events_tx.subscribe()
    }

    /// Run `f` against one committed snapshot of the ledger.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.ledger.read())
    }

    // ========================================================================
    // READS
    // ========================================================================

    pub fn summary(&self) -> LedgerSummary {
        self.read(|l| l.summary())
    }

    pub fn options(&self) -> LedgerOptions {
        self.read(|l| l.options().clone())
    }

    pub fn get_count_bounties(&self) -> u64 {
        self.read(|l| l.bounty_count())
    }

    pub fn get_bounty(&self, index: u64) -> Result<Bounty, LedgerError> {
        self.read(|l| l.bounty(index).cloned())
    }

    pub fn bounties_page(&self, offset: u64, limit: u64) -> Page<Bounty> {
        self.read(|l| l.bounties_page(offset, limit))
    }

    pub fn get_count_my_bounties(&self, issuer: &Principal) -> u64 {
        self.read(|l| l.count_bounties_of(issuer))
    }

    pub fn get_my_bounty(&self, issuer: &Principal, index: u64) -> Result<Bounty, LedgerError> {
        self.read(|l| l.bounty_of(issuer, index).cloned())
    }

    pub fn my_bounties_page(&self, issuer: &Principal, offset: u64, limit: u64) -> Page<Bounty> {
        self.read(|l| {
            let count = l.count_bounties_of(issuer);
            let items = window(offset, limit, count)
                .filter_map(|i| l.bounty_of(issuer, i).ok().cloned())
                .collect();
            Page {
                count,
                offset,
                items,
            }
        })
    }

    pub fn get_count_my_submissions(&self, submitter: &Principal) -> u64 {
        self.read(|l| l.count_submissions_of(submitter))
    }

    pub fn get_my_submission(
        &self,
        submitter: &Principal,
        index: u64,
    ) -> Result<Submission, LedgerError> {
        self.read(|l| l.submission_of(submitter, index).cloned())
    }

    pub fn my_submissions_page(
        &self,
        submitter: &Principal,
        offset: u64,
        limit: u64,
    ) -> Page<Submission> {
        self.read(|l| {
            let count = l.count_submissions_of(submitter);
            let items = window(offset, limit, count)
                .filter_map(|i| l.submission_of(submitter, i).ok().cloned())
                .collect();
            Page {
                count,
                offset,
                items,
            }
        })
    }

    pub fn get_count_bounty_submissions(&self, bounty_id: BountyId) -> Result<u64, LedgerError> {
        self.read(|l| l.count_bounty_submissions(bounty_id))
    }

    pub fn get_bounty_submission(
        &self,
        bounty_id: BountyId,
        index: u64,
    ) -> Result<Submission, LedgerError> {
        self.read(|l| l.bounty_submission(bounty_id, index).cloned())
    }

    pub fn bounty_submissions_page(
        &self,
        bounty_id: BountyId,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Submission>, LedgerError> {
        self.read(|l| {
            let count = l.count_bounty_submissions(bounty_id)?;
            let items = window(offset, limit, count)
                .filter_map(|i| l.bounty_submission(bounty_id, i).ok().cloned())
                .collect();
            Ok(Page {
                count,
                offset,
                items,
            })
        })
    }

    pub fn get_submission(&self, id: SubmissionId) -> Result<Submission, LedgerError> {
        self.read(|l| l.submission(id).cloned())
    }

    pub fn balance_of(&self, principal: &Principal) -> Amount {
        self.read(|l| l.balance_of(principal))
    }

    pub fn events_since(&self, since: u64) -> Vec<EventRecord> {
        self.read(|l| l.events().since(since).to_vec())
    }

    pub fn audit(&self) -> AuditReport {
        self.read(|l| l.audit())
    }
}

/// Indexes `offset..offset + limit` clamped to `count`.
fn window(offset: u64, limit: u64, count: u64) -> std::ops::Range<u64> {
    let end = offset.saturating_add(limit).min(count);
    offset.min(end)..end
}
