//! Ledger error taxonomy
//!
//! Every rejected call maps to exactly one of these kinds. None of them leave
//! partial effects behind: a call either commits fully or not at all.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::Role;
use crate::types::{Amount, Principal};

/// Record families addressable by id or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Bounty,
    Submission,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Bounty => f.write_str("Bounty"),
            Entity::Submission => f.write_str("Submission"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger is paused")]
    Paused,

    #[error("Unauthorized: {principal} is not the {role}")]
    Unauthorized { principal: Principal, role: Role },

    #[error("Unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: u64 },

    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("Funds mismatch: declared {declared}, provided {provided}")]
    FundsMismatch { declared: Amount, provided: Amount },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Arithmetic overflow in balance calculation")]
    AmountOverflow,
}

impl LedgerError {
    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        LedgerError::InvalidState {
            reason: reason.into(),
        }
    }

    pub(crate) fn bounty_not_found(id: u64) -> Self {
        LedgerError::NotFound {
            entity: Entity::Bounty,
            id,
        }
    }

    pub(crate) fn submission_not_found(id: u64) -> Self {
        LedgerError::NotFound {
            entity: Entity::Submission,
            id,
        }
    }

    /// Stable machine-readable kind, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Paused => "PAUSED",
            LedgerError::Unauthorized { .. } | LedgerError::Unauthenticated { .. } => {
                "UNAUTHORIZED"
            }
            LedgerError::NotFound { .. } => "NOT_FOUND",
            LedgerError::InvalidState { .. } => "INVALID_STATE",
            LedgerError::FundsMismatch { .. } => "FUNDS_MISMATCH",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::AmountOverflow => "AMOUNT_OVERFLOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = LedgerError::submission_not_found(7);
        assert_eq!(err.to_string(), "Submission not found: 7");
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[test]
    fn test_unauthorized_names_role() {
        let err = LedgerError::Unauthorized {
            principal: Principal::new("mallory"),
            role: Role::Issuer,
        };
        assert!(err.to_string().contains("mallory"));
        assert!(err.to_string().contains("issuer"));
    }

    #[test]
    fn test_funds_mismatch_display() {
        let err = LedgerError::FundsMismatch {
            declared: 10,
            provided: 9,
        };
        assert!(err.to_string().contains("declared 10"));
        assert_eq!(err.kind(), "FUNDS_MISMATCH");
    }
}
