//! In-process session store.
//!
//! A `HashMap` behind a `tokio::sync::Mutex`, with a deadline per entry.
//! Expired entries are invisible to every read and are physically removed
//! lazily on access, by [`MemoryStore::purge_expired`], or by the
//! background sweeper.
//!
//! Good for single-instance deployments, tests and demos. Every instance
//! has its own map, so a multi-instance deployment needs a shared backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokenward_protocol::{fingerprint, CachedSession};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{CacheError, SessionStore};

/// Longest deadline an entry can get. Longer TTLs are cut to this.
const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Limits for the in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreConfig {
    /// Maximum number of live entries. `None` means unbounded.
    ///
    /// When full, inserting a new key first drops expired entries and then,
    /// if still full, evicts the entry closest to its deadline. An evicted
    /// token simply behaves as revoked.
    pub capacity: Option<usize>,
}

/// One stored session plus the instant it stops being live.
#[derive(Debug, Clone)]
struct Entry {
    session: CachedSession,
    deadline: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.deadline
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
}

impl Inner {
    /// Reads through expired entries, removing them on the way.
    fn live(&mut self, token: &str, now: Instant) -> Option<&Entry> {
        let expired = self
            .entries
            .get(token)
            .is_some_and(|entry| !entry.is_live(now));
        if expired {
            self.entries.remove(token);
            return None;
        }
        self.entries.get(token)
    }

    fn purge(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    /// Makes room for one more key if `capacity` says we're full.
    fn make_room(&mut self, token: &str, capacity: Option<usize>, now: Instant) {
        let Some(capacity) = capacity else { return };
        if self.entries.contains_key(token) || self.entries.len() < capacity {
            return;
        }

        self.purge(now);
        if self.entries.len() < capacity {
            return;
        }

        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.deadline)
            .map(|(key, _)| key.clone());
        if let Some(victim) = victim {
            self.entries.remove(&victim);
            tracing::debug!(
                token = fingerprint(&victim),
                capacity,
                "session evicted under capacity pressure"
            );
        }
    }

    fn insert(
        &mut self,
        token: &str,
        session: CachedSession,
        ttl: Duration,
        capacity: Option<usize>,
        now: Instant,
    ) {
        self.make_room(token, capacity, now);
        self.entries.insert(
            token.to_string(),
            Entry {
                session,
                deadline: now + ttl.min(MAX_TTL),
            },
        );
    }
}

/// In-memory [`SessionStore`].
///
/// Cloning is cheap and every clone shares the same map (the map lives
/// behind an `Arc`), which is what lets the sweeper task and the request
/// handlers see the same sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    config: MemoryStoreConfig,
}

impl MemoryStore {
    pub fn new(config: MemoryStoreConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            config,
        }
    }

    /// Shorthand for a store bounded to `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(MemoryStoreConfig {
            capacity: Some(capacity),
        })
    }

    /// Drops every expired entry. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        self.inner.lock().await.purge(Instant::now())
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    /// Starts a background task that purges expired entries every
    /// `period`.
    ///
    /// The task runs until the returned handle is aborted or the runtime
    /// shuts down. Reads never depend on it; it only bounds memory.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = store.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(purged, "expired sessions swept");
                }
            }
        })
    }
}

impl SessionStore for MemoryStore {
    async fn exists(&self, token: &str) -> Result<bool, CacheError> {
        let mut inner = self.inner.lock().await;
        Ok(inner.live(token, Instant::now()).is_some())
    }

    async fn get(&self, token: &str) -> Result<Option<CachedSession>, CacheError> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .live(token, Instant::now())
            .map(|entry| entry.session.clone()))
    }

    async fn put(
        &self,
        token: &str,
        session: CachedSession,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().await;
        inner.insert(token, session, ttl, self.config.capacity, Instant::now());
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), CacheError> {
        self.inner.lock().await.entries.remove(token);
        Ok(())
    }

    /// Check and swap happen under one lock, so no reader ever sees
    /// neither or both, and only one of two racing rotations wins.
    async fn rotate(
        &self,
        old: &str,
        new: &str,
        session: CachedSession,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        if inner.live(old, now).is_none() {
            return Ok(false);
        }
        inner.entries.remove(old);
        inner.insert(new, session, ttl, self.config.capacity, now);
        Ok(true)
    }

    async fn delete_user(&self, username: &str) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut removed = 0;
        let mut inner = self.inner.lock().await;
        inner.entries.retain(|_, entry| {
            if entry.session.username != username {
                return true;
            }
            if entry.is_live(now) {
                removed += 1;
            }
            false
        });
        Ok(removed)
    }
}
