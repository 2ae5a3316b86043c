//! Solvency audit
//!
//! Cross-checks three independent views of custodied funds:
//! the stored custody total, the sum of bounty balances, and the balances
//! reconstructed from the event log alone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Ledger;
use crate::events::LedgerEvent;
use crate::types::{Amount, BountyId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub event_count: u64,
    pub chain_valid: bool,
    /// First record whose digest does not verify.
    pub first_invalid_seq: Option<u64>,
    pub custody_total: Amount,
    pub sum_of_balances: Amount,
    /// Custody reconstructed by folding the event log.
    pub event_custody: Amount,
    pub total_released: Amount,
    pub event_released: Amount,
    pub solvent: bool,
}

impl AuditReport {
    pub fn is_healthy(&self) -> bool {
        self.chain_valid && self.solvent
    }
}

impl Ledger {
    pub fn audit(&self) -> AuditReport {
        let (chain_valid, first_invalid_seq) = match self.events.verify_chain() {
            Ok(()) => (true, None),
            Err(seq) => (false, Some(seq)),
        };

        let sum_of_balances = self
            .bounties
            .iter()
            .fold(0u128, |acc, b| acc.saturating_add(b.balance));
        let total_released = self
            .released
            .values()
            .fold(0u128, |acc, v| acc.saturating_add(*v));

        let mut balances: HashMap<BountyId, Amount> = HashMap::new();
        let mut event_released: Amount = 0;
        for record in self.events.records() {
            match &record.event {
                LedgerEvent::BountyCreated { id, .. } => {
                    balances.insert(*id, 0);
                }
                LedgerEvent::BountyActivated { id, balance } => {
                    balances.insert(*id, *balance);
                }
                LedgerEvent::BountyClosed {
                    id,
                    balance,
                    refund_amount,
                } => {
                    balances.insert(*id, *balance);
                    event_released = event_released.saturating_add(*refund_amount);
                }
                LedgerEvent::SubmissionAccepted {
                    bounty_id,
                    new_balance,
                    reward_amount,
                    ..
                } => {
                    balances.insert(*bounty_id, *new_balance);
                    event_released = event_released.saturating_add(*reward_amount);
                }
                _ => {}
            }
        }
        let event_custody = balances
            .values()
            .fold(0u128, |acc, v| acc.saturating_add(*v));

        let solvent = sum_of_balances == self.custody_total
            && event_custody == self.custody_total
            && event_released == total_released;

        if !solvent || !chain_valid {
            warn!(
                "Audit failed: custody={} balances={} from_events={} chain_valid={}",
                self.custody_total, sum_of_balances, event_custody, chain_valid
            );
        }

        AuditReport {
            event_count: self.events.len() as u64,
            chain_valid,
            first_invalid_seq,
            custody_total: self.custody_total,
            sum_of_balances,
            event_custody,
            total_released,
            event_released,
            solvent,
        }
    }
}
