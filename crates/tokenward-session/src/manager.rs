//! The lifecycle manager: login, refresh, logout.
//!
//! This is the central piece of the session layer. It owns no mutable
//! state of its own. Every decision is made from:
//! - the presented token (signature and embedded expiry)
//! - the session store (is there a live entry for exactly this string?)
//! - read-only configuration (lifetime, refresh window, process secret)
//!
//! # Concurrency note
//!
//! `SessionManager` takes `&self` everywhere and is meant to be shared
//! behind an `Arc` by every request. The session store is the only
//! mutable shared resource. Two concurrent refreshes of one token race on
//! [`SessionStore::rotate`]; with an atomic backend exactly one of them
//! wins and the other sees [`RefreshOutcome::Invalidated`].

use std::collections::BTreeSet;

use time::OffsetDateTime;
use tokenward_cache::SessionStore;
use tokenward_protocol::{CachedSession, SessionToken, fingerprint};
use tokenward_token::{Signer, TokenError, derive_salt};

use crate::{
    IdentityProvider, RefreshOutcome, SessionConfig, SessionContext, SessionError,
    TokenState,
};

/// Drives the token state machine over a store and an identity provider.
///
/// ## Lifecycle
///
/// ```text
/// login() ──→ [Live] ──→ refresh() in window ──→ [Live] (new string)
///               │                 │
///               │                 └──→ old string is [Stale]
///               ▼
///           logout() ──→ [Stale] until its embedded expiry
/// ```
pub struct SessionManager<S, P> {
    store: S,
    provider: P,
    signer: Signer,
    config: SessionConfig,
}

impl<S: SessionStore, P: IdentityProvider> SessionManager<S, P> {
    /// Creates a manager. The config is passed through
    /// [`SessionConfig::validated`] first.
    pub fn new(config: SessionConfig, store: S, provider: P) -> Self {
        let config = config.validated();
        Self {
            signer: Signer::new(config.signer.clone()),
            store,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    // -----------------------------------------------------------------------
    // Login
    // -----------------------------------------------------------------------

    /// Issues a fresh token for a user whose credential the caller has
    /// already verified.
    ///
    /// The user's raw salt is stripped from the identity right after the
    /// effective salt is derived. The store entry is written last, so a
    /// failure anywhere leaves the store untouched.
    ///
    /// # Errors
    /// - [`SessionError::LoginFailed`]: the identity provider refused
    /// - [`SessionError::Token`]: salt derivation or signing failed
    /// - [`SessionError::Cache`]: the store write failed
    pub async fn login(&self, username: &str) -> Result<SessionContext, SessionError> {
        let mut identity = match self.provider.resolve(username).await {
            Ok(identity) => identity,
            Err(err) => {
                tracing::info!(username, error = %err, "login rejected");
                return Err(SessionError::LoginFailed(err.to_string()));
            }
        };

        let effective_salt = derive_salt(&self.config.secret, identity.take_salt().as_ref())?;
        let minted = self
            .signer
            .mint(&identity.username, &effective_salt, self.config.ttl())?;

        let token = SessionToken {
            token: minted.token,
            username: identity.username.clone(),
            effective_salt,
            issued_at: minted.issued_at,
            expires_at: minted.expires_at,
        };
        self.store
            .put(
                &token.token,
                CachedSession::from_identity(&identity, &token),
                self.config.ttl(),
            )
            .await?;

        tracing::info!(
            username = %token.username,
            token = fingerprint(&token.token),
            "login succeeded"
        );
        Ok(SessionContext { token, identity })
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Rotates the presented token if it is close to expiry.
    ///
    /// Checks, in order:
    /// 1. blank token → `Valid` (nothing to refresh)
    /// 2. refresh disabled → `Valid`
    /// 3. signature and embedded expiry → error if either fails
    /// 4. not yet inside the refresh window → `Valid`
    /// 5. no live store entry → `Invalidated` (already rotated or revoked)
    /// 6. otherwise mint a successor and swap the store entry → `Rotated`
    ///
    /// The presented token is never modified; on rotation it is `Stale`
    /// from then on and the caller must switch to the returned one.
    ///
    /// # Errors
    /// - [`SessionError::InvalidSignature`]: forged, malformed, or signed
    ///   with another salt
    /// - [`SessionError::ExpiredToken`]: embedded expiry has passed
    /// - [`SessionError::Token`] / [`SessionError::Cache`]: server-side
    pub async fn refresh(
        &self,
        presented: &SessionToken,
    ) -> Result<RefreshOutcome, SessionError> {
        if presented.token.trim().is_empty() {
            tracing::debug!("refresh skipped, no token presented");
            return Ok(RefreshOutcome::Valid);
        }
        if !self.config.refresh_enabled {
            tracing::debug!("refresh skipped, disabled by config");
            return Ok(RefreshOutcome::Valid);
        }

        let claims = self
            .signer
            .verify(&presented.token, &presented.effective_salt)?;
        if claims.username != presented.username {
            return Err(SessionError::InvalidSignature);
        }

        let now = OffsetDateTime::now_utc();
        let window_edge = time::Duration::try_from(self.config.refresh_window())
            .ok()
            .and_then(|window| now.checked_add(window));
        if window_edge.is_some_and(|edge| edge < claims.expires_at) {
            tracing::debug!(
                token = fingerprint(&presented.token),
                "refresh skipped, outside the refresh window"
            );
            return Ok(RefreshOutcome::Valid);
        }

        let Some(session) = self.store.get(&presented.token).await? else {
            tracing::warn!(
                username = %presented.username,
                token = fingerprint(&presented.token),
                "refresh of a stale token refused"
            );
            return Ok(RefreshOutcome::Invalidated);
        };

        let ttl = self.config.ttl();
        let minted = self
            .signer
            .mint(&presented.username, &presented.effective_salt, ttl)?;
        let next = presented.rotated(minted.token, minted.issued_at, minted.expires_at);

        let swapped = self
            .store
            .rotate(&presented.token, &next.token, session.renewed(&next), ttl)
            .await?;
        if !swapped {
            tracing::warn!(
                username = %presented.username,
                token = fingerprint(&presented.token),
                "lost a concurrent refresh, token already rotated"
            );
            return Ok(RefreshOutcome::Invalidated);
        }

        tracing::info!(
            username = %next.username,
            old = fingerprint(&presented.token),
            new = fingerprint(&next.token),
            "token rotated"
        );
        Ok(RefreshOutcome::Rotated(next))
    }

    // -----------------------------------------------------------------------
    // Per-request lookups
    // -----------------------------------------------------------------------

    /// Resolves a presented token string into the session it belongs to.
    ///
    /// The store is consulted first: only a live entry yields a session,
    /// and its effective salt is what the signature is checked against.
    ///
    /// # Errors
    /// On a miss the token is classified without granting anything:
    /// unreadable → [`SessionError::InvalidSignature`], past its embedded
    /// expiry → [`SessionError::ExpiredToken`], otherwise
    /// [`SessionError::InvalidatedToken`].
    pub async fn authenticate(&self, token: &str) -> Result<SessionContext, SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::InvalidSignature);
        }

        match self.store.get(token).await? {
            Some(session) => {
                self.signer.verify(token, &session.effective_salt)?;
                Ok(SessionContext {
                    token: session.to_token(token),
                    identity: session.identity(),
                })
            }
            None => Err(self.classify_miss(token)),
        }
    }

    /// Reports where a token string stands without changing anything.
    pub async fn inspect(&self, token: &str) -> Result<TokenState, SessionError> {
        let Ok(claims) = self.signer.peek(token) else {
            return Ok(TokenState::Absent);
        };
        if claims.expires_at < OffsetDateTime::now_utc() {
            return Ok(TokenState::Expired);
        }

        let state = match self.store.get(token).await? {
            None => TokenState::Stale,
            Some(session) => match self.signer.verify(token, &session.effective_salt) {
                Ok(_) => TokenState::Live,
                Err(TokenError::Expired) => TokenState::Expired,
                Err(_) => TokenState::Absent,
            },
        };
        Ok(state)
    }

    fn classify_miss(&self, token: &str) -> SessionError {
        match self.signer.peek(token) {
            Err(_) => SessionError::InvalidSignature,
            Ok(claims) if claims.expires_at < OffsetDateTime::now_utc() => {
                SessionError::ExpiredToken
            }
            Ok(_) => SessionError::InvalidatedToken,
        }
    }

    // -----------------------------------------------------------------------
    // Logout / revocation
    // -----------------------------------------------------------------------

    /// Revokes the session's token. Logging out twice is fine.
    pub async fn logout(&self, ctx: &SessionContext) -> Result<(), SessionError> {
        self.store.delete(&ctx.token.token).await?;
        tracing::info!(
            username = %ctx.username(),
            token = fingerprint(&ctx.token.token),
            "logged out"
        );
        Ok(())
    }

    /// Revokes every live session of `username`. Returns how many there
    /// were.
    pub async fn revoke_all(&self, username: &str) -> Result<usize, SessionError> {
        let revoked = self.store.delete_user(username).await?;
        tracing::info!(username, revoked, "revoked all sessions");
        Ok(revoked)
    }

    // -----------------------------------------------------------------------
    // Roles
    // -----------------------------------------------------------------------

    /// Roles captured when the session was created.
    pub fn roles<'a>(&self, ctx: &'a SessionContext) -> &'a BTreeSet<String> {
        ctx.roles()
    }

    /// Current roles of a subject, straight from the identity provider.
    pub async fn roles_for(&self, subject_id: u64) -> Result<BTreeSet<String>, SessionError> {
        self.provider.roles(subject_id).await
    }
}

// =========================================================================
// Tests
// =========================================================================
