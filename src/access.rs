//! Identity and access control
//!
//! - Principal resolution from the transport's call context
//! - Owner-only and issuer-only checks
//! - Pause/unpause circuit breaker
//!
//! Checks are evaluated on every call; nothing is cached between calls.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LedgerError;
use crate::types::{Bounty, Principal};

/// Longest principal identifier accepted from a caller.
pub const MAX_PRINCIPAL_LEN: usize = 128;

/// Authority a call may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Ledger owner: controls the circuit breaker and ownership.
    Owner,
    /// Creator of the bounty being acted on.
    Issuer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => f.write_str("owner"),
            Role::Issuer => f.write_str("issuer"),
        }
    }
}

/// Caller identity as attached by the transport, not yet validated.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    raw_principal: Option<String>,
}

impl CallContext {
    pub fn new(raw_principal: Option<String>) -> Self {
        Self { raw_principal }
    }
}

/// Check if a string is usable as a principal identifier
pub fn is_valid_principal(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_PRINCIPAL_LEN
        && !id.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// Resolve the calling principal from the call context.
pub fn resolve_principal(ctx: &CallContext) -> Result<Principal, LedgerError> {
    let raw = match ctx.raw_principal.as_deref() {
        Some(raw) => raw,
        None => {
            return Err(LedgerError::Unauthenticated {
                reason: "no principal attached to call".to_string(),
            })
        }
    };

    if !is_valid_principal(raw) {
        debug!("Rejected malformed principal ({} bytes)", raw.len());
        return Err(LedgerError::Unauthenticated {
            reason: "malformed principal".to_string(),
        });
    }

    Ok(Principal::new(raw))
}

/// Owner identity and the circuit breaker.
#[derive(Debug, Clone)]
pub struct AccessControl {
    owner: Principal,
    paused: bool,
}

impl AccessControl {
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            paused: false,
        }
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn require_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        Ok(())
    }

    pub fn require_owner(&self, principal: &Principal) -> Result<(), LedgerError> {
        if principal != &self.owner {
            return Err(LedgerError::Unauthorized {
                principal: principal.clone(),
                role: Role::Owner,
            });
        }
        Ok(())
    }

    pub fn require_issuer(&self, principal: &Principal, bounty: &Bounty) -> Result<(), LedgerError> {
        if principal != &bounty.issuer {
            return Err(LedgerError::Unauthorized {
                principal: principal.clone(),
                role: Role::Issuer,
            });
        }
        Ok(())
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub(crate) fn set_owner(&mut self, owner: Principal) {
        self.owner = owner;
    }
}
