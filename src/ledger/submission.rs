//! Submission store: competing solutions and the release of custodied funds.

use chrono::{DateTime, Utc};

use super::{nth_id, Effect, Ledger};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::types::{
    Amount, Bounty, BountyId, BountyState, Principal, Submission, SubmissionId, SubmissionState,
};

impl Ledger {
    pub(crate) fn submission_ref(&self, id: SubmissionId) -> Result<&Submission, LedgerError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.submissions.get(i))
            .ok_or_else(|| LedgerError::submission_not_found(id))
    }

    /// Shared checks for deciding on a submission: issuer of the bounty, the
    /// submission belongs to it and is still open.
    fn decidable_submission(
        &self,
        caller: &Principal,
        bounty_id: BountyId,
        submission_id: SubmissionId,
    ) -> Result<(&Bounty, &Submission), LedgerError> {
        self.access.require_not_paused()?;
        let bounty = self.bounty_ref(bounty_id)?;
        self.access.require_issuer(caller, bounty)?;
        let submission = self.submission_ref(submission_id)?;

        if submission.bounty_id != bounty_id {
            return Err(LedgerError::invalid_state(format!(
                "submission {} belongs to bounty {}, not {}",
                submission_id, submission.bounty_id, bounty_id
            )));
        }
        if submission.state.is_terminal() {
            return Err(LedgerError::invalid_state(format!(
                "submission {} is already {}",
                submission_id, submission.state
            )));
        }
        Ok((bounty, submission))
    }

    // ========================================================================
    // PREPARE
    // ========================================================================

    pub(super) fn prepare_create_submission(
        &self,
        caller: &Principal,
        bounty_id: BountyId,
        data: &str,
        now: DateTime<Utc>,
    ) -> Result<(Effect, LedgerEvent), LedgerError> {
        self.access.require_not_paused()?;
        self.bounty_ref(bounty_id)?;

        let id = self.submission_count();
        let submission = Submission {
            id,
            bounty_id,
            submitter: caller.clone(),
            data: data.to_string(),
            state: SubmissionState::Created,
            created_at: now,
        };
        let event = LedgerEvent::SubmissionCreated {
            submission_id: id,
            bounty_id,
            submitter: caller.clone(),
        };
        Ok((Effect::InsertSubmission(submission), event))
    }

    pub(super) fn prepare_reject_submission(
        &self,
        caller: &Principal,
        bounty_id: BountyId,
        submission_id: SubmissionId,
    ) -> Result<(Effect, LedgerEvent), LedgerError> {
        self.decidable_submission(caller, bounty_id, submission_id)?;
        Ok((
            Effect::RejectSubmission { id: submission_id },
            LedgerEvent::SubmissionRejected {
                submission_id,
                bounty_id,
            },
        ))
    }

    /// The whole remaining balance goes to the submitter; there is no partial payout.
    pub(super) fn prepare_accept_submission(
        &self,
        caller: &Principal,
        bounty_id: BountyId,
        submission_id: SubmissionId,
    ) -> Result<(Effect, LedgerEvent), LedgerError> {
        let (bounty, submission) = self.decidable_submission(caller, bounty_id, submission_id)?;

        if bounty.state != BountyState::Activated {
            return Err(LedgerError::invalid_state(format!(
                "bounty {} is {}, not activated",
                bounty_id, bounty.state
            )));
        }
        if bounty.balance == 0 {
            return Err(LedgerError::invalid_state(format!(
                "bounty {} has no balance to pay out",
                bounty_id
            )));
        }

        let old_balance = bounty.balance;
        let reward: Amount = old_balance;
        let custody_total =
            self.custody_total
                .checked_sub(reward)
                .ok_or(LedgerError::InsufficientBalance {
                    required: reward,
                    available: self.custody_total,
                })?;
        let released = self
            .balance_of(&submission.submitter)
            .checked_add(reward)
            .ok_or(LedgerError::AmountOverflow)?;

        Ok((
            Effect::Payout {
                bounty_id,
                submission_id,
                payee: submission.submitter.clone(),
                released,
                custody_total,
            },
            LedgerEvent::SubmissionAccepted {
                submission_id,
                bounty_id,
                old_balance,
                new_balance: 0,
                reward_amount: reward,
            },
        ))
    }

    // ========================================================================
    // COMMIT
    // ========================================================================

    pub(super) fn commit_insert_submission(&mut self, submission: Submission) {
        self.submissions_by_submitter
            .entry(submission.submitter.clone())
            .or_default()
            .push(submission.id);
        if let Some(ids) = self
            .submissions_by_bounty
            .get_mut(submission.bounty_id as usize)
        {
            ids.push(submission.id);
        }
        self.submissions.push(submission);
    }

    pub(super) fn commit_reject_submission(&mut self, id: SubmissionId) {
        if let Some(submission) = self.submissions.get_mut(id as usize) {
            submission.state = SubmissionState::Rejected;
        }
    }

    pub(super) fn commit_payout(
        &mut self,
        bounty_id: BountyId,
        submission_id: SubmissionId,
        payee: Principal,
        released: Amount,
        custody_total: Amount,
    ) {
        if let Some(bounty) = self.bounties.get_mut(bounty_id as usize) {
            bounty.balance = 0;
        }
        if let Some(submission) = self.submissions.get_mut(submission_id as usize) {
            submission.state = SubmissionState::Accepted;
        }
        self.released.insert(payee, released);
        self.custody_total = custody_total;
    }

    // ========================================================================
    // READS
    // ========================================================================

    pub fn submission_count(&self) -> u64 {
        self.submissions.len() as u64
    }

    pub fn submission(&self, id: SubmissionId) -> Result<&Submission, LedgerError> {
        self.submission_ref(id)
    }

    /// Number of submissions made by `submitter` across all bounties.
    pub fn count_submissions_of(&self, submitter: &Principal) -> u64 {
        self.submissions_by_submitter
            .get(submitter)
            .map(|ids| ids.len() as u64)
            .unwrap_or(0)
    }

    /// The `index`-th submission made by `submitter`, in creation order.
    pub fn submission_of(
        &self,
        submitter: &Principal,
        index: u64,
    ) -> Result<&Submission, LedgerError> {
        let id = nth_id(self.submissions_by_submitter.get(submitter), index)
            .ok_or_else(|| LedgerError::submission_not_found(index))?;
        self.submission_ref(id)
    }

    /// Number of submissions made against `bounty_id`.
    pub fn count_bounty_submissions(&self, bounty_id: BountyId) -> Result<u64, LedgerError> {
        self.bounty_ref(bounty_id)?;
        Ok(self
            .submissions_by_bounty
            .get(bounty_id as usize)
            .map(|ids| ids.len() as u64)
            .unwrap_or(0))
    }

    /// The `index`-th submission made against `bounty_id`.
    pub fn bounty_submission(
        &self,
        bounty_id: BountyId,
        index: u64,
    ) -> Result<&Submission, LedgerError> {
        self.bounty_ref(bounty_id)?;
        let id = nth_id(self.submissions_by_bounty.get(bounty_id as usize), index)
            .ok_or_else(|| LedgerError::submission_not_found(index))?;
        self.submission_ref(id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{alice, bob, new_ledger, owner, ONE_ETHER};
    use crate::error::{Entity, LedgerError};
    use crate::events::LedgerEvent;
    use crate::types::{Principal, SubmissionState};

    fn funded_bounty(ledger: &mut super::Ledger, amount: u128) -> u64 {
        let id = ledger.create_bounty(&owner(), "Test bounty", amount).unwrap();
        ledger.activate_bounty(&owner(), id, amount, amount).unwrap();
        id
    }

    #[test]
    fn test_creates_submission() {
        let mut ledger = new_ledger();
        let b = funded_bounty(&mut ledger, ONE_ETHER);
        let s = ledger.create_submission(&alice(), b, "Test submission").unwrap();
        assert_eq!(s, 0);

        let last = ledger.events().records().last().unwrap();
        assert_eq!(
            last.event,
            LedgerEvent::SubmissionCreated {
                submission_id: 0,
                bounty_id: 0,
                submitter: alice()
            }
        );
        assert_eq!(ledger.submission(s).unwrap().state, SubmissionState::Created);
    }

    #[test]
    fn test_submission_ids_are_global() {
        let mut ledger = new_ledger();
        let b0 = ledger.create_bounty(&owner(), "b0", 1).unwrap();
        let b1 = ledger.create_bounty(&alice(), "b1", 1).unwrap();

        assert_eq!(ledger.create_submission(&bob(), b0, "x").unwrap(), 0);
        assert_eq!(ledger.create_submission(&bob(), b1, "x").unwrap(), 1);
        assert_eq!(ledger.create_submission(&alice(), b0, "x").unwrap(), 2);

        assert_eq!(ledger.count_bounty_submissions(b0).unwrap(), 2);
        assert_eq!(ledger.bounty_submission(b0, 1).unwrap().id, 2);
        assert_eq!(ledger.count_submissions_of(&bob()), 2);
        assert_eq!(ledger.submission_of(&bob(), 1).unwrap().bounty_id, b1);
    }

    #[test]
    fn test_submission_does_not_need_activation() {
        let mut ledger = new_ledger();
        let b = ledger.create_bounty(&owner(), "b", 1).unwrap();
        assert!(ledger.create_submission(&alice(), b, "early").is_ok());
    }

    #[test]
    fn test_submission_to_missing_bounty() {
        let mut ledger = new_ledger();
        assert_eq!(
            ledger.create_submission(&alice(), 4, "x"),
            Err(LedgerError::NotFound {
                entity: Entity::Bounty,
                id: 4
            })
        );
        assert_eq!(ledger.submission_count(), 0);
    }

    #[test]
    fn test_reject_submission() {
        let mut ledger = new_ledger();
        let b = funded_bounty(&mut ledger, ONE_ETHER);
        let s = ledger.create_submission(&alice(), b, "x").unwrap();

        assert!(matches!(
            ledger.reject_submission(&bob(), b, s),
            Err(LedgerError::Unauthorized { .. })
        ));
        ledger.reject_submission(&owner(), b, s).unwrap();
        assert_eq!(ledger.submission(s).unwrap().state, SubmissionState::Rejected);

        // Terminal: neither decision applies again.
        assert!(matches!(
            ledger.reject_submission(&owner(), b, s),
            Err(LedgerError::InvalidState { .. })
        ));
        assert!(matches!(
            ledger.accept_submission(&owner(), b, s),
            Err(LedgerError::InvalidState { .. })
        ));
        assert_eq!(ledger.bounty(b).unwrap().balance, ONE_ETHER);
    }

    #[test]
    fn test_accept_pays_full_balance() {
        let mut ledger = new_ledger();
        let b = funded_bounty(&mut ledger, 7);
        let s = ledger.create_submission(&bob(), b, "x").unwrap();

        let before = ledger.balance_of(&bob());
        ledger.accept_submission(&owner(), b, s).unwrap();

        assert_eq!(ledger.balance_of(&bob()), before + 7);
        assert_eq!(ledger.bounty(b).unwrap().balance, 0);
        assert_eq!(ledger.custody_total(), 0);
        assert_eq!(ledger.submission(s).unwrap().state, SubmissionState::Accepted);
    }

    #[test]
    fn test_accept_twice_fails() {
        let mut ledger = new_ledger();
        let b = funded_bounty(&mut ledger, 7);
        let s = ledger.create_submission(&bob(), b, "x").unwrap();

        ledger.accept_submission(&owner(), b, s).unwrap();
        assert!(matches!(
            ledger.accept_submission(&owner(), b, s),
            Err(LedgerError::InvalidState { .. })
        ));
        assert_eq!(ledger.balance_of(&bob()), 7);
    }

    #[test]
    fn test_second_winner_finds_empty_bounty() {
        let mut ledger = new_ledger();
        let b = funded_bounty(&mut ledger, 7);
        let first = ledger.create_submission(&alice(), b, "x").unwrap();
        let second = ledger.create_submission(&bob(), b, "y").unwrap();

        ledger.accept_submission(&owner(), b, first).unwrap();
        assert!(matches!(
            ledger.accept_submission(&owner(), b, second),
            Err(LedgerError::InvalidState { .. })
        ));
        assert_eq!(ledger.balance_of(&bob()), 0);
        assert_eq!(ledger.submission(second).unwrap().state, SubmissionState::Created);
    }

    #[test]
    fn test_accept_requires_activated_bounty() {
        let mut ledger = new_ledger();
        let b = ledger.create_bounty(&owner(), "b", 5).unwrap();
        let s = ledger.create_submission(&alice(), b, "x").unwrap();
        assert!(matches!(
            ledger.accept_submission(&owner(), b, s),
            Err(LedgerError::InvalidState { .. })
        ));

        ledger.activate_bounty(&owner(), b, 5, 5).unwrap();
        ledger.close_bounty(&owner(), b).unwrap();
        assert!(matches!(
            ledger.accept_submission(&owner(), b, s),
            Err(LedgerError::InvalidState { .. })
        ));
        assert_eq!(ledger.balance_of(&alice()), 0);
        assert_eq!(ledger.balance_of(&owner()), 5);
    }

    #[test]
    fn test_submission_must_match_bounty() {
        let mut ledger = new_ledger();
        let b0 = funded_bounty(&mut ledger, 3);
        let b1 = funded_bounty(&mut ledger, 4);
        let s = ledger.create_submission(&alice(), b1, "x").unwrap();

        assert!(matches!(
            ledger.accept_submission(&owner(), b0, s),
            Err(LedgerError::InvalidState { .. })
        ));
        assert!(matches!(
            ledger.reject_submission(&owner(), b0, s),
            Err(LedgerError::InvalidState { .. })
        ));
        assert_eq!(ledger.custody_total(), 7);
    }

    #[test]
    fn test_missing_submission() {
        let mut ledger = new_ledger();
        let b = funded_bounty(&mut ledger, 3);
        assert_eq!(
            ledger.accept_submission(&owner(), b, 9),
            Err(LedgerError::NotFound {
                entity: Entity::Submission,
                id: 9
            })
        );
        assert!(ledger.submission(0).is_err());
        assert!(ledger.submission_of(&Principal::new("nobody"), 0).is_err());
        assert!(ledger.count_bounty_submissions(42).is_err());
        assert!(ledger.bounty_submission(b, 0).is_err());
    }
}
