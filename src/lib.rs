//! Bounty Escrow - custody ledger for funded bounties
//!
//! Issuers create bounties and fund them; anyone can submit work against a
//! bounty; the issuer accepts one submission, which releases the whole
//! balance to its submitter, or closes the bounty and takes the balance back.
//!
//! # How it works
//!
//! 1. Every mutating call is checked against the circuit breaker, the
//!    existence of its targets, the caller's role, the record states and
//!    finally the funds involved, in that order
//! 2. A call that passes commits atomically and appends one event to a
//!    hash-chained log; a call that fails leaves no trace
//! 3. Committed calls are journaled to SQLite so the ledger can be rebuilt
//!    by replay
//! 4. The ledger is served over HTTP and driven by the `bounty` CLI
//!
//! # Invariants
//!
//! - Bounty and submission ids are sequential and never reused
//! - The sum of bounty balances always equals the custody total
//! - Accepted and rejected submissions are final

pub mod access;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod server;
pub mod service;
pub mod storage;
pub mod types;

pub use access::{is_valid_principal, resolve_principal, AccessControl, CallContext, Role};
pub use command::Command;
pub use config::Config;
pub use error::{Entity, LedgerError};
pub use events::{EventLog, EventRecord, LedgerEvent};
pub use ledger::{AuditReport, Ledger, LedgerOptions, Transition};
pub use service::{EscrowService, ServiceError};
pub use storage::{JournalEntry, LedgerJournal};
pub use types::{
    Amount, Bounty, BountyId, BountyState, LedgerSummary, Page, Principal, Submission,
    SubmissionId, SubmissionState,
};
