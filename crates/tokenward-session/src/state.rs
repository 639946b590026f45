//! Token states and lifecycle outcomes.
//!
//! From the lifecycle manager's point of view a token string is always in
//! exactly one of four states:
//!
//! ```text
//!                 login                 refresh (rotate)
//!   Absent ───────────────→ Live ──────────────────────→ Stale
//!                            │                            ↑
//!                            ├──────── logout ────────────┘
//!                            │
//!                            └── embedded expiry passes ──→ Expired
//! ```
//!
//! Only login and rotation move a token string into `Live`, and only the
//! session store entry keeps it there.

use std::collections::BTreeSet;

use tokenward_protocol::{Identity, SessionToken};

use crate::SessionError;

/// Where a token string stands right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Not a token we can even read. Never issued, or garbage.
    Absent,

    /// Session entry present and embedded expiry in the future.
    Live,

    /// Embedded expiry in the future but no session entry: revoked,
    /// rotated away, or evicted.
    Stale,

    /// Embedded expiry in the past, whatever the store says.
    Expired,
}

/// What a refresh did.
///
/// The transport turns this into a status code: nothing for `Valid`,
/// "refreshed" for `Rotated`, "invalid token" for `Invalidated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No rotation needed (or possible). Keep using the presented token.
    Valid,

    /// The presented token was replaced. It is now stale; use this one.
    Rotated(SessionToken),

    /// The presented token was already rotated away or revoked. No
    /// replacement was minted.
    Invalidated,
}

impl RefreshOutcome {
    pub fn is_rotated(&self) -> bool {
        matches!(self, Self::Rotated(_))
    }

    /// Collapses the outcome into "the token to use from now on".
    ///
    /// # Errors
    /// [`SessionError::InvalidatedToken`] for `Invalidated`.
    pub fn into_token(
        self,
        presented: &SessionToken,
    ) -> Result<SessionToken, SessionError> {
        match self {
            Self::Valid => Ok(presented.clone()),
            Self::Rotated(token) => Ok(token),
            Self::Invalidated => Err(SessionError::InvalidatedToken),
        }
    }
}

/// The authenticated session of the current request.
///
/// Built by login or by authenticating a presented token, then passed
/// explicitly to every operation that needs "the current user". There is
/// no ambient current-subject lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub token: SessionToken,
    /// Identity snapshot taken at login. Never carries a raw salt.
    pub identity: Identity,
}

impl SessionContext {
    pub fn username(&self) -> &str {
        &self.identity.username
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.identity.roles
    }
}
