//! Contract tests every `SessionStore` must pass.
//!
//! The checks are written once against `impl SessionStore` and run
//! against the in-memory backend and against a wrapper that keeps the
//! trait's default (non-atomic) `rotate`.

use std::time::Duration;

use time::OffsetDateTime;
use tokenward_cache::{CacheError, MemoryStore, SessionStore};
use tokenward_protocol::{CachedSession, EffectiveSalt};

// =========================================================================
// Helpers
// =========================================================================

const HOUR: Duration = Duration::from_secs(3600);

fn session(username: &str) -> CachedSession {
    let now = OffsetDateTime::now_utc();
    CachedSession {
        subject_id: 1,
        username: username.to_string(),
        roles: ["admin".to_string()].into_iter().collect(),
        effective_salt: EffectiveSalt::new("salt"),
        issued_at: now,
        expires_at: now + time::Duration::hours(1),
    }
}

/// Delegates everything except `rotate`, so the trait default is used.
struct PlainStore(MemoryStore);

impl SessionStore for PlainStore {
    async fn exists(&self, token: &str) -> Result<bool, CacheError> {
        self.0.exists(token).await
    }

    async fn get(&self, token: &str) -> Result<Option<CachedSession>, CacheError> {
        self.0.get(token).await
    }

    async fn put(
        &self,
        token: &str,
        session: CachedSession,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.0.put(token, session, ttl).await
    }

    async fn delete(&self, token: &str) -> Result<(), CacheError> {
        self.0.delete(token).await
    }

    async fn delete_user(&self, username: &str) -> Result<usize, CacheError> {
        self.0.delete_user(username).await
    }
}

// =========================================================================
// Contract
// =========================================================================

async fn check_contract(store: impl SessionStore) {
    // put → live
    store.put("t1", session("alice"), HOUR).await.unwrap();
    assert!(store.exists("t1").await.unwrap());
    let stored = store.get("t1").await.unwrap().unwrap();
    assert_eq!(stored.username, "alice");
    assert!(stored.roles.contains("admin"));

    // put again → overwrite, not duplicate
    store.put("t1", session("alice"), HOUR).await.unwrap();
    assert_eq!(store.delete_user("nobody").await.unwrap(), 0);

    // rotate live → swapped
    assert!(store.rotate("t1", "t2", session("alice"), HOUR).await.unwrap());
    assert!(!store.exists("t1").await.unwrap());
    assert!(store.exists("t2").await.unwrap());

    // rotate the old key again → refused, nothing written
    assert!(!store.rotate("t1", "t3", session("alice"), HOUR).await.unwrap());
    assert!(!store.exists("t3").await.unwrap());

    // delete is idempotent
    store.delete("t2").await.unwrap();
    store.delete("t2").await.unwrap();
    assert!(store.get("t2").await.unwrap().is_none());

    // delete_user clears every session of that user only
    store.put("a1", session("alice"), HOUR).await.unwrap();
    store.put("a2", session("alice"), HOUR).await.unwrap();
    store.put("b1", session("bob"), HOUR).await.unwrap();
    assert_eq!(store.delete_user("alice").await.unwrap(), 2);
    assert!(!store.exists("a2").await.unwrap());
    assert!(store.exists("b1").await.unwrap());
}

#[tokio::test]
async fn test_memory_store_meets_contract() {
    check_contract(MemoryStore::default()).await;
}

#[tokio::test]
async fn test_default_rotate_meets_contract() {
    check_contract(PlainStore(MemoryStore::default())).await;
}

#[tokio::test]
async fn test_clones_share_one_map() {
    let store = MemoryStore::default();
    let clone = store.clone();

    store.put("t1", session("alice"), HOUR).await.unwrap();

    assert!(clone.exists("t1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_runs_and_can_be_stopped() {
    let store = MemoryStore::default();
    store.put("dead", session("alice"), Duration::ZERO).await.unwrap();
    store.put("live", session("bob"), HOUR).await.unwrap();

    let sweeper = store.spawn_sweeper(Duration::from_secs(1));
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(store.len().await, 1);
    assert!(store.exists("live").await.unwrap());

    sweeper.abort();
    assert!(sweeper.await.unwrap_err().is_cancelled());
}

/// Needs a running Redis: `REDIS_URL=redis://... cargo test --features redis -- --ignored`.
#[cfg(feature = "redis")]
#[tokio::test]
#[ignore = "needs a Redis server"]
async fn test_redis_store_meets_contract() {
    use tokenward_cache::{RedisStore, RedisStoreConfig};

    let config = RedisStoreConfig {
        url: std::env::var("REDIS_URL")
            .unwrap_or_else(|_| RedisStoreConfig::default().url),
        namespace: format!("tokenward-contract-{}", std::process::id()),
        ..RedisStoreConfig::default()
    };
    let store = RedisStore::connect(&config).await.unwrap();

    check_contract(store.clone()).await;
    // Leave nothing behind.
    store.delete_user("bob").await.unwrap();
}
