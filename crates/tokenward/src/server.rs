//! `Tokenward` builder and service handle.
//!
//! This is the entry point for embedding Tokenward. It ties together all
//! the layers: identity provider → lifecycle manager → signer and store.

use std::sync::Arc;

use tokenward_cache::SessionStore;
use tokenward_session::{IdentityProvider, SessionConfig, SessionManager};

/// Builder for configuring a [`Tokenward`] service.
///
/// The store and identity provider are set by type-changing setters, so
/// `build()` only exists once both are present.
///
/// # Example
///
/// ```rust
/// use tokenward::prelude::*;
///
/// let service = Tokenward::builder()
///     .config(SessionConfig::with_secret("change-me"))
///     .store(MemoryStore::default())
///     .identity_provider(StaticIdentityProvider::new())
///     .build();
/// assert_eq!(service.config().expire_secs, 36_000);
/// ```
pub struct TokenwardBuilder<S = (), P = ()> {
    config: SessionConfig,
    store: S,
    provider: P,
}

impl TokenwardBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            store: (),
            provider: (),
        }
    }
}

impl Default for TokenwardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, P> TokenwardBuilder<S, P> {
    /// Sets the whole session configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the process secret, keeping the rest of the configuration.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.config.secret = secret.into();
        self
    }

    /// Sets the session store.
    pub fn store<S2: SessionStore>(self, store: S2) -> TokenwardBuilder<S2, P> {
        TokenwardBuilder {
            config: self.config,
            store,
            provider: self.provider,
        }
    }

    /// Sets the identity provider.
    pub fn identity_provider<P2: IdentityProvider>(
        self,
        provider: P2,
    ) -> TokenwardBuilder<S, P2> {
        TokenwardBuilder {
            config: self.config,
            store: self.store,
            provider,
        }
    }
}

impl<S: SessionStore, P: IdentityProvider> TokenwardBuilder<S, P> {
    /// Builds the service. The configuration is validated on the way.
    pub fn build(self) -> Tokenward<S, P> {
        tracing::info!(
            expire_secs = self.config.expire_secs,
            refresh_enabled = self.config.refresh_enabled,
            refresh_countdown_secs = self.config.refresh_countdown_secs,
            "tokenward service built"
        );
        Tokenward {
            manager: Arc::new(SessionManager::new(self.config, self.store, self.provider)),
        }
    }
}

/// A ready-to-use Tokenward service.
///
/// Cheap to clone: every clone shares one lifecycle manager, so it can be
/// handed to each request task. The endpoints live in
/// [`handler`](crate::handler).
pub struct Tokenward<S, P> {
    pub(crate) manager: Arc<SessionManager<S, P>>,
}

impl<S, P> Clone for Tokenward<S, P> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}

impl Tokenward<(), ()> {
    /// Creates a new builder.
    pub fn builder() -> TokenwardBuilder {
        TokenwardBuilder::new()
    }
}

impl<S: SessionStore, P: IdentityProvider> Tokenward<S, P> {
    /// The lifecycle manager behind the endpoints.
    pub fn manager(&self) -> &SessionManager<S, P> {
        &self.manager
    }

    pub fn config(&self) -> &SessionConfig {
        self.manager.config()
    }
}
