//! Core session records.
//!
//! These are the values that flow between the identity provider, the
//! signer, the session store and the lifecycle manager. All of them are
//! plain data: a transition never mutates a record in place, it builds a
//! new one.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// The raw per-user salt handed out by the identity provider.
///
/// It only lives long enough to derive an [`EffectiveSalt`] and is then
/// dropped. `Debug` is redacted so it can't leak through a stray
/// `tracing::debug!(?identity)`.
#[derive(Clone, PartialEq, Eq)]
pub struct PerUserSalt(String);

impl PerUserSalt {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PerUserSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PerUserSalt(***)")
    }
}

/// The derived secret that keys a user's tokens for one login.
///
/// Combines the process-wide secret with the per-user salt. It is stored
/// server-side with the session so that refresh can sign a replacement
/// without going back to the identity provider.
///
/// `#[serde(transparent)]` stores it as a bare string inside a
/// [`CachedSession`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectiveSalt(String);

impl EffectiveSalt {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for EffectiveSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EffectiveSalt(***)")
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A verified user, as resolved by the identity provider.
///
/// `roles` is a `BTreeSet` so that the serialized order is stable even
/// though the set itself is unordered.
///
/// The `salt` field is `#[serde(skip)]`: it is never written to any
/// response or store, and it is always `None` after deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject_id: u64,
    pub username: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(skip)]
    pub salt: Option<PerUserSalt>,
}

impl Identity {
    pub fn new(subject_id: u64, username: impl Into<String>) -> Self {
        Self {
            subject_id,
            username: username.into(),
            roles: BTreeSet::new(),
            salt: None,
        }
    }

    /// Adds a role. Builder-style, used mostly by identity providers.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_salt(mut self, salt: PerUserSalt) -> Self {
        self.salt = Some(salt);
        self
    }

    /// Removes and returns the raw salt, leaving the identity safe to
    /// expose.
    pub fn take_salt(&mut self) -> Option<PerUserSalt> {
        self.salt.take()
    }
}

// ---------------------------------------------------------------------------
// SessionToken
// ---------------------------------------------------------------------------

/// A minted token together with what the server needs to refresh it.
///
/// `token` is the opaque string handed to the client. The other fields
/// are the server's view of it. Rotation produces a new `SessionToken`
/// via [`SessionToken::rotated`], keeping `username` and
/// `effective_salt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub username: String,
    pub effective_salt: EffectiveSalt,
    #[serde(with = "time::serde::timestamp")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl SessionToken {
    /// Builds the successor of this token after a rotation.
    pub fn rotated(
        &self,
        token: String,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            token,
            username: self.username.clone(),
            effective_salt: self.effective_salt.clone(),
            issued_at,
            expires_at,
        }
    }
}

// ---------------------------------------------------------------------------
// CachedSession
// ---------------------------------------------------------------------------

/// The session store's value for one token string.
///
/// A snapshot of the [`Identity`] (never the raw salt) plus the metadata
/// needed to rebuild a [`SessionToken`] on refresh. The entry existing
/// is what makes a token live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSession {
    pub subject_id: u64,
    pub username: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    pub effective_salt: EffectiveSalt,
    #[serde(with = "time::serde::timestamp")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl CachedSession {
    /// Snapshots an identity for a freshly minted token.
    ///
    /// The identity's raw salt, if still present, is ignored.
    pub fn from_identity(identity: &Identity, token: &SessionToken) -> Self {
        Self {
            subject_id: identity.subject_id,
            username: identity.username.clone(),
            roles: identity.roles.clone(),
            effective_salt: token.effective_salt.clone(),
            issued_at: token.issued_at,
            expires_at: token.expires_at,
        }
    }

    /// Same identity snapshot, new token window. Used by rotation.
    pub fn renewed(&self, token: &SessionToken) -> Self {
        Self {
            issued_at: token.issued_at,
            expires_at: token.expires_at,
            ..self.clone()
        }
    }

    /// Rebuilds the token record for the given token string.
    pub fn to_token(&self, token: impl Into<String>) -> SessionToken {
        SessionToken {
            token: token.into(),
            username: self.username.clone(),
            effective_salt: self.effective_salt.clone(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }

    /// Checks the data-model rules a decoded record must satisfy: a
    /// username, a signing salt, and an expiry after the issue time.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidRecord`] naming the first broken rule.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.username.is_empty() {
            return Err(ProtocolError::InvalidRecord("session without username".into()));
        }
        if self.effective_salt.is_empty() {
            return Err(ProtocolError::InvalidRecord("session without salt".into()));
        }
        if self.expires_at <= self.issued_at {
            return Err(ProtocolError::InvalidRecord(
                "session expires before it was issued".into(),
            ));
        }
        Ok(())
    }

    /// The identity snapshot, without any salt.
    pub fn identity(&self) -> Identity {
        Identity {
            subject_id: self.subject_id,
            username: self.username.clone(),
            roles: self.roles.clone(),
            salt: None,
        }
    }
}

/// Short, log-safe stand-in for a token string.
///
/// Returns the last 8 characters (the tail of the signature for a JWT),
/// which is enough to correlate log lines without making the token
/// replayable from logs.
pub fn fingerprint(token: &str) -> &str {
    let start = token
        .char_indices()
        .rev()
        .nth(7)
        .map_or(0, |(idx, _)| idx);
    &token[start..]
}

// =========================================================================
// Tests
// =========================================================================
