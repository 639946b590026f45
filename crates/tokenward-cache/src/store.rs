//! The session store capability set.
//!
//! Tokenward doesn't care what technology keeps its sessions, only that
//! something implements [`SessionStore`]. Backends must guarantee that
//! each single-key operation is atomic; multi-key atomicity is only
//! required of [`SessionStore::rotate`], and only when the backend can
//! offer it.

use std::future::Future;
use std::time::Duration;

use tokenward_protocol::CachedSession;

use crate::CacheError;

/// Registry of live sessions, keyed by the full token string.
///
/// # Trait bounds
///
/// - `Send + Sync` → one store is shared by every concurrent request.
/// - `'static` → it lives as long as the service that owns it.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tokenward_cache::{MemoryStore, SessionStore};
///
/// # async fn demo() -> Result<(), tokenward_cache::CacheError> {
/// let store = MemoryStore::default();
/// assert!(!store.exists("some.token.string").await?);
/// store.delete("some.token.string").await?; // deleting nothing is fine
/// # Ok(())
/// # }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// `true` if a live entry exists for exactly this token string.
    fn exists(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<bool, CacheError>> + Send;

    /// Returns the entry for this token string, if it is live.
    fn get(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<CachedSession>, CacheError>> + Send;

    /// Inserts or replaces the entry for this token string.
    ///
    /// A prior entry under the same key is overwritten, never duplicated.
    /// The backend may evict the entry before `ttl` elapses (capacity
    /// pressure); callers treat that exactly like a revocation.
    fn put(
        &self,
        token: &str,
        session: CachedSession,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Removes the entry. Deleting an absent key is not an error.
    fn delete(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Replaces `old` with `new`, but only if `old` is still live.
    ///
    /// Returns `false` (and writes nothing) when `old` is already gone,
    /// which is how a second concurrent refresh of the same token loses.
    ///
    /// The default is check, delete, then put. Between those steps a
    /// concurrent rotation can slip in, and there is a short window where
    /// neither key exists. Backends with a multi-key primitive override
    /// this to make the swap atomic.
    fn rotate(
        &self,
        old: &str,
        new: &str,
        session: CachedSession,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, CacheError>> + Send {
        async move {
            if !self.exists(old).await? {
                return Ok(false);
            }
            self.delete(old).await?;
            self.put(new, session, ttl).await?;
            Ok(true)
        }
    }

    /// Removes every live entry belonging to `username`.
    ///
    /// Returns how many entries were removed.
    fn delete_user(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<usize, CacheError>> + Send;
}
