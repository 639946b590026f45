//! Session lifecycle configuration.
//!
//! Read once at startup and shared read-only by every request. Sensible
//! defaults are provided; embedding apps can deserialize it from whatever
//! configuration format they already use.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokenward_token::SignerConfig;

/// Token lifetime, refresh policy and the process secret.
///
/// `#[serde(default)]` lets a config file name only the fields it
/// overrides.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Process-wide secret mixed into every effective salt.
    ///
    /// Changing it invalidates every outstanding token signature.
    pub secret: String,

    /// Token lifetime in seconds. Also the session store TTL.
    ///
    /// Default: 36000 (10 hours).
    pub expire_secs: u64,

    /// Whether refresh may rotate tokens at all.
    pub refresh_enabled: bool,

    /// How close to expiry (in seconds) a token must be before refresh
    /// rotates it. A token is rotated once `now + countdown >= expires_at`.
    ///
    /// Default: 3600. Set to 0 to rotate only at the very last second; set
    /// it to `expire_secs` or more to rotate on every refresh.
    pub refresh_countdown_secs: u64,

    /// Issuer and audience for minted tokens.
    pub signer: SignerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expire_secs: 36_000,
            refresh_enabled: true,
            refresh_countdown_secs: 3_600,
            signer: SignerConfig::default(),
        }
    }
}

/// `Debug` by hand so the secret never reaches a log line.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"***")
            .field("expire_secs", &self.expire_secs)
            .field("refresh_enabled", &self.refresh_enabled)
            .field("refresh_countdown_secs", &self.refresh_countdown_secs)
            .field("signer", &self.signer)
            .finish()
    }
}

impl SessionConfig {
    /// Upper bound for `expire_secs` and `refresh_countdown_secs`: ten
    /// years. Keeps every expiry computation inside the date range.
    pub const MAX_SECS: u64 = 10 * 365 * 24 * 60 * 60;

    /// Shorthand for a config with the given secret and defaults
    /// elsewhere.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`SessionManager::new`](crate::SessionManager::new).
    /// Rules:
    /// - `expire_secs` of 0 falls back to the default lifetime.
    /// - `expire_secs` and `refresh_countdown_secs` are capped to
    ///   [`Self::MAX_SECS`].
    /// - An empty `secret` is allowed (users with their own salt still get
    ///   keyed tokens) but logged, since users without a salt can't log in.
    pub fn validated(mut self) -> Self {
        if self.expire_secs == 0 {
            let fallback = Self::default().expire_secs;
            tracing::warn!(fallback, "expire_secs is 0, using default lifetime");
            self.expire_secs = fallback;
        }
        if self.expire_secs > Self::MAX_SECS {
            tracing::warn!(
                expire_secs = self.expire_secs,
                max = Self::MAX_SECS,
                "expire_secs exceeds maximum, clamping"
            );
            self.expire_secs = Self::MAX_SECS;
        }
        if self.refresh_countdown_secs > Self::MAX_SECS {
            tracing::warn!(
                refresh_countdown_secs = self.refresh_countdown_secs,
                max = Self::MAX_SECS,
                "refresh_countdown_secs exceeds maximum, clamping"
            );
            self.refresh_countdown_secs = Self::MAX_SECS;
        }
        if self.secret.is_empty() {
            tracing::warn!(
                "session secret is empty, tokens are keyed by user salts only"
            );
        }
        self
    }

    /// Token lifetime (and session store TTL).
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.expire_secs)
    }

    /// The refresh countdown window.
    pub fn refresh_window(&self) -> Duration {
        Duration::from_secs(self.refresh_countdown_secs)
    }
}
