//! Session store for Tokenward.
//!
//! The store is the single authority on whether a token is still honored:
//! an entry keyed by the full token string exists if and only if that
//! token is live. Deleting the entry is how a token is revoked, even
//! though its signature stays valid until it expires.
//!
//! - [`SessionStore`]: the capability set every backend provides
//! - [`MemoryStore`]: in-process backend with per-entry TTL
//! - [`RedisStore`]: shared backend for multi-instance deployments
//!   (feature `redis`)
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (above)  ← decides transitions, calls the store
//!     ↕
//! Cache Layer (this crate)  ← remembers which token strings are live
//!     ↕
//! Protocol Layer (below)  ← provides CachedSession and its codec
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod memory;
#[cfg(feature = "redis")]
mod redis;
mod store;

pub use error::CacheError;
pub use memory::{MemoryStore, MemoryStoreConfig};
#[cfg(feature = "redis")]
pub use redis::{RedisStore, RedisStoreConfig};
pub use store::SessionStore;
