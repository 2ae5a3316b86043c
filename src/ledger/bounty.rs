//! Bounty store: creation, funding and closing of bounties.

use chrono::{DateTime, Utc};

use super::{nth_id, page_of, Effect, Ledger};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::types::{Amount, Bounty, BountyId, BountyState, Page, Principal};

impl Ledger {
    pub(crate) fn bounty_ref(&self, id: BountyId) -> Result<&Bounty, LedgerError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.bounties.get(i))
            .ok_or_else(|| LedgerError::bounty_not_found(id))
    }

    // ========================================================================
    // PREPARE
    // ========================================================================

    pub(super) fn prepare_create_bounty(
        &self,
        caller: &Principal,
        data: &str,
        target_reward: Amount,
        now: DateTime<Utc>,
    ) -> Result<(Effect, LedgerEvent), LedgerError> {
        self.access.require_not_paused()?;

        let id = self.bounty_count();
        let bounty = Bounty {
            id,
            issuer: caller.clone(),
            data: data.to_string(),
            target_reward,
            balance: 0,
            state: BountyState::Created,
            created_at: now,
        };
        let event = LedgerEvent::BountyCreated {
            issuer: caller.clone(),
            id,
        };
        Ok((Effect::InsertBounty(bounty), event))
    }

    pub(super) fn prepare_activate_bounty(
        &self,
        caller: &Principal,
        id: BountyId,
        amount: Amount,
        funds: Amount,
    ) -> Result<(Effect, LedgerEvent), LedgerError> {
        self.access.require_not_paused()?;
        let bounty = self.bounty_ref(id)?;
        self.access.require_issuer(caller, bounty)?;

        match bounty.state {
            BountyState::Created => {}
            BountyState::Activated if self.options.allow_reactivation => {}
            BountyState::Activated => {
                return Err(LedgerError::invalid_state(format!(
                    "bounty {} is already activated",
                    id
                )))
            }
            BountyState::Closed => {
                return Err(LedgerError::invalid_state(format!(
                    "bounty {} is closed",
                    id
                )))
            }
        }

        if funds != amount {
            return Err(LedgerError::FundsMismatch {
                declared: amount,
                provided: funds,
            });
        }

        let balance = bounty
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        let custody_total = self
            .custody_total
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        Ok((
            Effect::FundBounty {
                id,
                balance,
                custody_total,
            },
            LedgerEvent::BountyActivated { id, balance },
        ))
    }

    pub(super) fn prepare_close_bounty(
        &self,
        caller: &Principal,
        id: BountyId,
    ) -> Result<(Effect, LedgerEvent), LedgerError> {
        self.access.require_not_paused()?;
        let bounty = self.bounty_ref(id)?;
        self.access.require_issuer(caller, bounty)?;

        if bounty.state == BountyState::Closed {
            return Err(LedgerError::invalid_state(format!(
                "bounty {} is already closed",
                id
            )));
        }

        let refund = bounty.balance;
        let custody_total =
            self.custody_total
                .checked_sub(refund)
                .ok_or(LedgerError::InsufficientBalance {
                    required: refund,
                    available: self.custody_total,
                })?;
        let released = self
            .balance_of(&bounty.issuer)
            .checked_add(refund)
            .ok_or(LedgerError::AmountOverflow)?;

        Ok((
            Effect::CloseBounty {
                id,
                refund_to: bounty.issuer.clone(),
                released,
                custody_total,
            },
            LedgerEvent::BountyClosed {
                id,
                balance: 0,
                refund_amount: refund,
            },
        ))
    }

    // ========================================================================
    // COMMIT
    // ========================================================================

    pub(super) fn commit_insert_bounty(&mut self, bounty: Bounty) {
        self.bounties_by_issuer
            .entry(bounty.issuer.clone())
            .or_default()
            .push(bounty.id);
        self.submissions_by_bounty.push(Vec::new());
        self.bounties.push(bounty);
    }

    pub(super) fn commit_fund_bounty(
        &mut self,
        id: BountyId,
        balance: Amount,
        custody_total: Amount,
    ) {
        if let Some(bounty) = self.bounties.get_mut(id as usize) {
            bounty.balance = balance;
            bounty.state = BountyState::Activated;
        }
        self.custody_total = custody_total;
    }

    pub(super) fn commit_close_bounty(
        &mut self,
        id: BountyId,
        refund_to: Principal,
        released: Amount,
        custody_total: Amount,
    ) {
        if let Some(bounty) = self.bounties.get_mut(id as usize) {
            bounty.balance = 0;
            bounty.state = BountyState::Closed;
        }
        self.released.insert(refund_to, released);
        self.custody_total = custody_total;
    }

    // ========================================================================
    // READS
    // ========================================================================

    pub fn bounty_count(&self) -> u64 {
        self.bounties.len() as u64
    }

    /// Bounty at position `index`; positions coincide with ids.
    pub fn bounty(&self, index: u64) -> Result<&Bounty, LedgerError> {
        self.bounty_ref(index)
    }

    pub fn bounties_page(&self, offset: u64, limit: u64) -> Page<Bounty> {
        page_of(&self.bounties, offset, limit)
    }

    /// Number of bounties issued by `issuer`.
    pub fn count_bounties_of(&self, issuer: &Principal) -> u64 {
        self.bounties_by_issuer
            .get(issuer)
            .map(|ids| ids.len() as u64)
            .unwrap_or(0)
    }

    /// The `index`-th bounty issued by `issuer`, in creation order.
    pub fn bounty_of(&self, issuer: &Principal, index: u64) -> Result<&Bounty, LedgerError> {
        let id = nth_id(self.bounties_by_issuer.get(issuer), index)
            .ok_or_else(|| LedgerError::bounty_not_found(index))?;
        self.bounty_ref(id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{alice, bob, new_ledger, owner, ONE_ETHER};
    use super::super::{Ledger, LedgerOptions};
    use crate::access::Role;
    use crate::error::LedgerError;
    use crate::events::LedgerEvent;
    use crate::types::{BountyState, Principal};
    use rand::seq::SliceRandom;

    #[test]
    fn test_creates_bounty() {
        let mut ledger = new_ledger();
        let id = ledger.create_bounty(&owner(), "Test bounty", ONE_ETHER).unwrap();
        assert_eq!(id, 0);

        let record = &ledger.events().records()[0];
        assert_eq!(
            record.event,
            LedgerEvent::BountyCreated {
                issuer: owner(),
                id: 0
            }
        );

        let bounty = ledger.bounty(0).unwrap();
        assert_eq!(bounty.state, BountyState::Created);
        assert_eq!(bounty.balance, 0);
        assert_eq!(bounty.target_reward, ONE_ETHER);
        assert_eq!(ledger.custody_total(), 0);
    }

    #[test]
    fn test_ids_are_sequential_regardless_of_issuer() {
        let mut ledger = new_ledger();
        let issuers = [owner(), alice(), bob()];
        let mut rng = rand::thread_rng();
        for expected in 0..50u64 {
            let issuer = issuers.choose(&mut rng).unwrap();
            assert_eq!(ledger.create_bounty(issuer, "b", 1).unwrap(), expected);
        }
        assert_eq!(ledger.bounty_count(), 50);
        let total: u64 = issuers.iter().map(|p| ledger.count_bounties_of(p)).sum();
        assert_eq!(total, 50);
    }

    #[test]
    fn test_activates_bounty() {
        let mut ledger = new_ledger();
        let id = ledger.create_bounty(&owner(), "Test bounty", ONE_ETHER).unwrap();
        let record = ledger
            .activate_bounty(&owner(), id, ONE_ETHER, ONE_ETHER)
            .unwrap();
        assert_eq!(
            record.event,
            LedgerEvent::BountyActivated {
                id: 0,
                balance: ONE_ETHER
            }
        );
        assert_eq!(ledger.bounty(id).unwrap().state, BountyState::Activated);
        assert_eq!(ledger.custody_total(), ONE_ETHER);
    }

    #[test]
    fn test_activation_requires_exact_funds() {
        let mut ledger = new_ledger();
        let id = ledger.create_bounty(&alice(), "b", 10).unwrap();

        assert_eq!(
            ledger.activate_bounty(&alice(), id, 10, 9),
            Err(LedgerError::FundsMismatch {
                declared: 10,
                provided: 9
            })
        );
        assert!(ledger.activate_bounty(&alice(), id, 10, 11).is_err());

        let bounty = ledger.bounty(id).unwrap();
        assert_eq!(bounty.state, BountyState::Created);
        assert_eq!(bounty.balance, 0);
        assert_eq!(ledger.custody_total(), 0);
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn test_activation_is_issuer_only() {
        let mut ledger = new_ledger();
        let id = ledger.create_bounty(&alice(), "b", 10).unwrap();
        assert_eq!(
            ledger.activate_bounty(&bob(), id, 10, 10),
            Err(LedgerError::Unauthorized {
                principal: bob(),
                role: Role::Issuer
            })
        );
        // The ledger owner has no issuer rights either.
        assert!(ledger.activate_bounty(&owner(), id, 10, 10).is_err());
    }

    #[test]
    fn test_zero_amount_activation() {
        let mut ledger = new_ledger();
        let id = ledger.create_bounty(&alice(), "b", 10).unwrap();
        ledger.activate_bounty(&alice(), id, 0, 0).unwrap();
        let bounty = ledger.bounty(id).unwrap();
        assert_eq!(bounty.state, BountyState::Activated);
        assert_eq!(bounty.balance, 0);
    }

    #[test]
    fn test_reactivation_policy() {
        let mut strict = new_ledger();
        let id = strict.create_bounty(&alice(), "b", 10).unwrap();
        strict.activate_bounty(&alice(), id, 10, 10).unwrap();
        assert!(matches!(
            strict.activate_bounty(&alice(), id, 5, 5),
            Err(LedgerError::InvalidState { .. })
        ));

        let mut lenient = Ledger::new(
            owner(),
            LedgerOptions {
                allow_reactivation: true,
            },
        );
        let id = lenient.create_bounty(&alice(), "b", 10).unwrap();
        lenient.activate_bounty(&alice(), id, 10, 10).unwrap();
        let record = lenient.activate_bounty(&alice(), id, 5, 5).unwrap();
        assert_eq!(record.event, LedgerEvent::BountyActivated { id, balance: 15 });
        assert_eq!(lenient.custody_total(), 15);

        lenient.close_bounty(&alice(), id).unwrap();
        assert!(matches!(
            lenient.activate_bounty(&alice(), id, 5, 5),
            Err(LedgerError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_activation_overflow_is_rejected() {
        let mut ledger = Ledger::new(
            owner(),
            LedgerOptions {
                allow_reactivation: true,
            },
        );
        let id = ledger.create_bounty(&alice(), "b", 1).unwrap();
        ledger.activate_bounty(&alice(), id, u128::MAX, u128::MAX).unwrap();
        assert_eq!(
            ledger.activate_bounty(&alice(), id, 1, 1),
            Err(LedgerError::AmountOverflow)
        );
        assert_eq!(ledger.bounty(id).unwrap().balance, u128::MAX);
    }

    #[test]
    fn test_closes_bounty_with_refund() {
        let mut ledger = new_ledger();
        let id = ledger.create_bounty(&alice(), "b", ONE_ETHER).unwrap();
        ledger.activate_bounty(&alice(), id, ONE_ETHER, ONE_ETHER).unwrap();

        let record = ledger.close_bounty(&alice(), id).unwrap();
        assert_eq!(
            record.event,
            LedgerEvent::BountyClosed {
                id,
                balance: 0,
                refund_amount: ONE_ETHER
            }
        );
        assert_eq!(ledger.balance_of(&alice()), ONE_ETHER);
        assert_eq!(ledger.custody_total(), 0);

        let bounty = ledger.bounty(id).unwrap();
        assert_eq!(bounty.state, BountyState::Closed);
        assert_eq!(bounty.balance, 0);

        assert!(matches!(
            ledger.close_bounty(&alice(), id),
            Err(LedgerError::InvalidState { .. })
        ));
        assert_eq!(ledger.balance_of(&alice()), ONE_ETHER);
    }

    #[test]
    fn test_close_unfunded_bounty() {
        let mut ledger = new_ledger();
        let id = ledger.create_bounty(&alice(), "b", 5).unwrap();
        let record = ledger.close_bounty(&alice(), id).unwrap();
        assert_eq!(
            record.event,
            LedgerEvent::BountyClosed {
                id,
                balance: 0,
                refund_amount: 0
            }
        );
    }

    #[test]
    fn test_my_bounty_reads() {
        let mut ledger = new_ledger();
        ledger.create_bounty(&alice(), "a0", 1).unwrap();
        ledger.create_bounty(&bob(), "b0", 1).unwrap();
        ledger.create_bounty(&alice(), "a1", 1).unwrap();

        assert_eq!(ledger.count_bounties_of(&alice()), 2);
        assert_eq!(ledger.bounty_of(&alice(), 1).unwrap().id, 2);
        assert_eq!(ledger.bounty_of(&bob(), 0).unwrap().data, "b0");
        assert!(ledger.bounty_of(&bob(), 1).is_err());
        assert_eq!(ledger.count_bounties_of(&Principal::new("nobody")), 0);
        assert!(ledger.bounty(3).is_err());
    }

    #[test]
    fn test_bounty_page_is_stable() {
        let mut ledger = new_ledger();
        for _ in 0..5 {
            ledger.create_bounty(&alice(), "b", 1).unwrap();
        }
        let page = ledger.bounties_page(1, 2);
        assert_eq!(page.count, 5);
        assert_eq!(
            page.items.iter().map(|b| b.id).collect::<Vec<_>>(),
            vec![1, 2]
        );

        ledger.create_bounty(&bob(), "late", 1).unwrap();
        let again = ledger.bounties_page(1, 2);
        assert_eq!(again.items, page.items);
    }
}
