//! Error types for the session layer.

use tokenward_cache::CacheError;
use tokenward_token::TokenError;

/// Errors that can occur during the token lifecycle.
///
/// The first five are per-request outcomes the client caused or must react
/// to. `Token` and `Cache` are server-side failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity provider couldn't resolve the user. No session was
    /// created.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The identity provider has no such user or subject.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// The token is malformed, forged, or signed with another salt.
    /// Treated as "no session".
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token's embedded expiry has passed. Treated as logged out.
    #[error("token has expired")]
    ExpiredToken,

    /// The token is well-formed and unexpired but was rotated away or
    /// revoked. The client must discard it and must not retry with it.
    #[error("token is no longer valid, use the refreshed token")]
    InvalidatedToken,

    /// Minting failed (bad configuration, signing backend error).
    #[error(transparent)]
    Token(TokenError),

    /// The session store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl SessionError {
    /// `true` for outcomes caused by what the client sent, as opposed to
    /// server-side failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Token(_) | Self::Cache(_))
    }
}

/// Verification failures map onto the client-facing variants; anything
/// else stays wrapped.
impl From<TokenError> for SessionError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature | TokenError::Malformed => {
                Self::InvalidSignature
            }
            TokenError::Expired => Self::ExpiredToken,
            other => Self::Token(other),
        }
    }
}
