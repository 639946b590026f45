//! Redis-backed session store.
//!
//! ## Key layout
//!
//! | Key | Type | Content |
//! |-----|------|---------|
//! | `{ns}:token:{token}` | string | JSON [`CachedSession`], `EX` = token TTL |
//! | `{ns}:user:token:{username}` | set | token strings issued to that user |
//!
//! The per-user set is an index for [`SessionStore::delete_user`]. It may
//! briefly name tokens whose entries already expired; those deletes are
//! no-ops.
//!
//! Multi-key writes run in `MULTI/EXEC` pipelines. [`SessionStore::rotate`]
//! runs as a Lua script, so the existence check and the swap are one
//! atomic step: no reader observes both keys or neither, and of two
//! racing rotations of the same token only one succeeds.

use std::time::Duration;

use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Pool, Runtime};
use serde::Deserialize;
use tokenward_protocol::{fingerprint, CachedSession, Codec, JsonCodec};

use crate::{CacheError, SessionStore};

/// Compare-and-swap rotation, run server-side so it is atomic.
///
/// KEYS: old token key, user index key, new token key.
/// ARGV: old token, new token, encoded session, ttl seconds.
const ROTATE_SCRIPT: &str = r"
if redis.call('DEL', KEYS[1]) == 0 then
  return 0
end
redis.call('SREM', KEYS[2], ARGV[1])
redis.call('SET', KEYS[3], ARGV[3], 'EX', ARGV[4])
redis.call('SADD', KEYS[2], ARGV[2])
redis.call('EXPIRE', KEYS[2], ARGV[4])
return 1
";

/// Connection settings for [`RedisStore`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisStoreConfig {
    pub url: String,
    /// Prefix for every key this store writes.
    pub namespace: String,
    pub pool_size: usize,
    pub timeout_ms: u64,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            namespace: "login".to_string(),
            pool_size: 16,
            timeout_ms: 1_000,
        }
    }
}

/// [`SessionStore`] on top of a pooled Redis connection.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
    codec: JsonCodec,
    namespace: String,
}

impl RedisStore {
    /// Builds the pool and checks that Redis answers.
    ///
    /// # Errors
    /// [`CacheError::Backend`] if the pool can't be created or the first
    /// connection fails.
    pub async fn connect(config: &RedisStoreConfig) -> Result<Self, CacheError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let mut redis_config = Config::from_url(&config.url);
        let mut pool_config = redis_config.get_pool_config();
        pool_config.max_size = config.pool_size;
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);
        pool_config.timeouts.recycle = Some(timeout);
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        pool.get().await?;

        tracing::info!(
            namespace = %config.namespace,
            pool_size = config.pool_size,
            "connected to Redis session store"
        );
        Ok(Self::from_pool(pool, &config.namespace))
    }

    /// Wraps an existing pool (shared with the rest of the app, say).
    pub fn from_pool(pool: Pool, namespace: &str) -> Self {
        Self {
            pool,
            codec: JsonCodec,
            namespace: namespace.to_string(),
        }
    }

    fn token_key(&self, token: &str) -> String {
        format!("{}:token:{token}", self.namespace)
    }

    fn user_key(&self, username: &str) -> String {
        format!("{}:user:token:{username}", self.namespace)
    }

    /// Queues the commands that make `token` live for `session.username`.
    fn queue_put(
        &self,
        pipe: &mut redis::Pipeline,
        token: &str,
        session: &CachedSession,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let bytes = self.codec.encode(session)?;
        // Redis rejects `EX 0`; round sub-second TTLs up.
        let ttl_secs = ttl.as_secs().max(1);
        let user_key = self.user_key(&session.username);
        pipe.set_ex(self.token_key(token), bytes, ttl_secs)
            .ignore()
            .sadd(&user_key, token)
            .ignore()
            .expire(&user_key, i64::try_from(ttl_secs).unwrap_or(i64::MAX))
            .ignore();
        Ok(())
    }
}

impl SessionStore for RedisStore {
    async fn exists(&self, token: &str) -> Result<bool, CacheError> {
        let mut conn = self.pool.get().await?;
        let exists: bool = conn.exists(self.token_key(token)).await?;
        Ok(exists)
    }

    async fn get(&self, token: &str) -> Result<Option<CachedSession>, CacheError> {
        let mut conn = self.pool.get().await?;
        let raw: Option<Vec<u8>> = conn.get(self.token_key(token)).await?;
        match raw {
            Some(bytes) => {
                let session: CachedSession = self.codec.decode(&bytes)?;
                session.validate()?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        token: &str,
        session: CachedSession,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        self.queue_put(&mut pipe, token, &session, ttl)?;

        let mut conn = self.pool.get().await?;
        let () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), CacheError> {
        let existing = self.get(token).await?;

        let mut pipe = redis::pipe();
        pipe.atomic().del(self.token_key(token)).ignore();
        if let Some(session) = existing {
            pipe.srem(self.user_key(&session.username), token).ignore();
        }

        let mut conn = self.pool.get().await?;
        let () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn rotate(
        &self,
        old: &str,
        new: &str,
        session: CachedSession,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let bytes = self.codec.encode(&session)?;
        let ttl_secs = ttl.as_secs().max(1);
        let script = redis::Script::new(ROTATE_SCRIPT);

        let mut conn = self.pool.get().await?;
        let swapped: i64 = script
            .key(self.token_key(old))
            .key(self.user_key(&session.username))
            .key(self.token_key(new))
            .arg(old)
            .arg(new)
            .arg(bytes)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await?;

        tracing::debug!(
            old = fingerprint(old),
            new = fingerprint(new),
            swapped = swapped == 1,
            "session rotation in Redis"
        );
        Ok(swapped == 1)
    }

    async fn delete_user(&self, username: &str) -> Result<usize, CacheError> {
        let user_key = self.user_key(username);
        let mut conn = self.pool.get().await?;
        let tokens: Vec<String> = conn.smembers(&user_key).await?;
        if tokens.is_empty() {
            return Ok(0);
        }

        let keys: Vec<String> =
            tokens.iter().map(|token| self.token_key(token)).collect();
        let (removed, _index): (usize, usize) = redis::pipe()
            .atomic()
            .del(keys)
            .del(&user_key)
            .query_async(&mut conn)
            .await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RedisStore {
        let pool = Config::from_url("redis://127.0.0.1:6379")
            .create_pool(Some(Runtime::Tokio1))
            .unwrap();
        RedisStore::from_pool(pool, "login")
    }

    #[test]
    fn test_key_layout() {
        let store = store();

        assert_eq!(store.token_key("abc"), "login:token:abc");
        assert_eq!(store.user_key("alice"), "login:user:token:alice");
    }
}
