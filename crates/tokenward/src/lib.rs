//! # Tokenward
//!
//! Token-based session authentication.
//!
//! Tokenward issues signed session tokens on login, refreshes them
//! transparently as they near expiry, and revokes them on logout. A
//! session store is the source of truth for "is this token still live";
//! the signature alone never is.
//!
//! The embedding app supplies two things: a [`SessionStore`] (in-memory,
//! Redis, or your own) and an [`IdentityProvider`] that turns a username
//! whose password it already checked into an identity and role set.
//!
//! ## Quick Start
//!
//! ```rust
//! use tokenward::prelude::*;
//!
//! # async fn demo() -> Result<(), TokenwardError> {
//! let users = StaticIdentityProvider::new()
//!     .with_user(Identity::new(1, "alice").with_role("admin"));
//! let service = Tokenward::builder()
//!     .secret("change-me")
//!     .store(MemoryStore::default())
//!     .identity_provider(users)
//!     .build();
//!
//! let mut response = RecordedResponse::new();
//! let login = service.login(&LoginParam::new("alice"), &mut response).await;
//! assert!(login.is_success());
//!
//! let token = response.header(JWT_TOKEN_NAME).unwrap_or_default();
//! let ctx = service.authenticate(token).await?;
//! service.logout(&ctx).await;
//! # Ok(())
//! # }
//! ```
//!
//! [`SessionStore`]: tokenward_cache::SessionStore
//! [`IdentityProvider`]: tokenward_session::IdentityProvider

mod error;
pub mod handler;
mod server;
pub mod telemetry;

pub use error::TokenwardError;
pub use handler::{RecordedResponse, ResponseSink};
pub use server::{Tokenward, TokenwardBuilder};

/// Everything an embedding app usually needs, in one import.
pub mod prelude {
    pub use crate::{
        RecordedResponse, ResponseSink, Tokenward, TokenwardBuilder,
        TokenwardError,
    };
    pub use tokenward_cache::{MemoryStore, MemoryStoreConfig, SessionStore};
    #[cfg(feature = "redis")]
    pub use tokenward_cache::{RedisStore, RedisStoreConfig};
    pub use tokenward_protocol::{
        ApiCode, ApiResult, CachedSession, Identity, JWT_INVALID_TOKEN_CODE,
        JWT_REFRESH_TOKEN_CODE, JWT_TOKEN_NAME, LoginParam, LoginVo,
        PerUserSalt, SessionToken,
    };
    pub use tokenward_session::{
        IdentityProvider, RefreshOutcome, SessionConfig, SessionContext,
        SessionError, SessionManager, StaticIdentityProvider, TokenState,
    };
    pub use tokenward_token::{SignerConfig, TokenError};
}
