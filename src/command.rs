//! Mutating calls accepted by the ledger.
//!
//! A `Command` plus the calling principal fully determines a transition, which
//! is what lets the journal rebuild the ledger by replaying them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Amount, BountyId, Principal, SubmissionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    CreateBounty {
        data: String,
        target_reward: Amount,
    },
    ActivateBounty {
        id: BountyId,
        amount: Amount,
        /// Value attached to the call; must equal `amount`.
        funds: Amount,
    },
    CloseBounty {
        id: BountyId,
    },
    CreateSubmission {
        bounty_id: BountyId,
        data: String,
    },
    RejectSubmission {
        bounty_id: BountyId,
        submission_id: SubmissionId,
    },
    AcceptSubmission {
        bounty_id: BountyId,
        submission_id: SubmissionId,
    },
    Pause,
    Unpause,
    TransferOwnership {
        new_owner: Principal,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateBounty { .. } => "create_bounty",
            Command::ActivateBounty { .. } => "activate_bounty",
            Command::CloseBounty { .. } => "close_bounty",
            Command::CreateSubmission { .. } => "create_submission",
            Command::RejectSubmission { .. } => "reject_submission",
            Command::AcceptSubmission { .. } => "accept_submission",
            Command::Pause => "pause",
            Command::Unpause => "unpause",
            Command::TransferOwnership { .. } => "transfer_ownership",
        }
    }

    /// Administrative calls stay available while the circuit breaker is engaged.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Command::Pause | Command::Unpause | Command::TransferOwnership { .. }
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::CreateBounty {
                data,
                target_reward,
            } => write!(
                f,
                "create_bounty(data={:?}, target_reward={})",
                data, target_reward
            ),
            Command::ActivateBounty { id, amount, funds } => write!(
                f,
                "activate_bounty(id={}, amount={}, funds={})",
                id, amount, funds
            ),
            Command::CloseBounty { id } => write!(f, "close_bounty(id={})", id),
            Command::CreateSubmission { bounty_id, data } => write!(
                f,
                "create_submission(bounty_id={}, data={:?})",
                bounty_id, data
            ),
            Command::RejectSubmission {
                bounty_id,
                submission_id,
            } => write!(
                f,
                "reject_submission(bounty_id={}, submission_id={})",
                bounty_id, submission_id
            ),
            Command::AcceptSubmission {
                bounty_id,
                submission_id,
            } => write!(
                f,
                "accept_submission(bounty_id={}, submission_id={})",
                bounty_id, submission_id
            ),
            Command::Pause => f.write_str("pause()"),
            Command::Unpause => f.write_str("unpause()"),
            Command::TransferOwnership { new_owner } => {
                write!(f, "transfer_ownership(new_owner={})", new_owner)
            }
        }
    }
}
