//! Identity lookup hook.
//!
//! Tokenward doesn't store users or check passwords. That is the
//! embedding app's job (a database, LDAP, an upstream auth service). The
//! app verifies the credential, then the lifecycle manager asks an
//! [`IdentityProvider`] who the user is and what roles they hold.
//!
//! A trait keeps the lifecycle manager oblivious to where users live:
//! production wires in a real directory, tests and demos use
//! [`StaticIdentityProvider`].

use std::collections::{BTreeSet, HashMap};
use std::future::Future;

use tokenward_protocol::Identity;

use crate::SessionError;

/// Resolves usernames to verified identities.
///
/// # Trait bounds
///
/// - `Send + Sync` → shared by every concurrent request.
/// - `'static` → lives as long as the service.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeSet;
/// use tokenward_protocol::{Identity, PerUserSalt};
/// use tokenward_session::{IdentityProvider, SessionError};
///
/// /// Everyone is an admin named after themselves. Demo only!
/// struct Everyone;
///
/// impl IdentityProvider for Everyone {
///     async fn resolve(&self, username: &str) -> Result<Identity, SessionError> {
///         Ok(Identity::new(1, username)
///             .with_role("admin")
///             .with_salt(PerUserSalt::new("666")))
///     }
///
///     async fn roles(&self, _subject_id: u64) -> Result<BTreeSet<String>, SessionError> {
///         Ok(["admin".to_string()].into_iter().collect())
///     }
/// }
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// Resolves a username whose credential the caller already verified.
    ///
    /// The returned identity may carry the user's raw salt; the lifecycle
    /// manager strips it right after deriving the effective salt.
    ///
    /// # Returns
    /// - `Ok(Identity)`: the user exists
    /// - `Err(SessionError::UnknownUser)` (or any error): login fails
    fn resolve(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Identity, SessionError>> + Send;

    /// Current role set of a subject, independent of any session.
    fn roles(
        &self,
        subject_id: u64,
    ) -> impl Future<Output = Result<BTreeSet<String>, SessionError>> + Send;
}

/// A fixed, in-memory user directory.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a user. Builder-style.
    pub fn with_user(mut self, identity: Identity) -> Self {
        self.users.insert(identity.username.clone(), identity);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, username: &str) -> Result<Identity, SessionError> {
        self.users
            .get(username)
            .cloned()
            .ok_or_else(|| SessionError::UnknownUser(username.to_string()))
    }

    async fn roles(&self, subject_id: u64) -> Result<BTreeSet<String>, SessionError> {
        self.users
            .values()
            .find(|identity| identity.subject_id == subject_id)
            .map(|identity| identity.roles.clone())
            .ok_or_else(|| SessionError::UnknownUser(format!("subject {subject_id}")))
    }
}
