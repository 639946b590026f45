//! Unified error type for Tokenward.

use tokenward_cache::CacheError;
use tokenward_protocol::{ApiCode, ProtocolError};
use tokenward_session::SessionError;
use tokenward_token::TokenError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tokenward` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
///
/// Conversions flatten nested failures onto the layer that caused them:
/// a session error carrying a signer failure becomes `Token`, a store
/// entry that won't decode becomes `Protocol`. `Session` keeps only the
/// lifecycle outcomes.
#[derive(Debug, thiserror::Error)]
pub enum TokenwardError {
    /// A record could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Minting, verifying or salt derivation failed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The session store failed.
    #[error(transparent)]
    Cache(CacheError),

    /// A lifecycle outcome (login failed, invalidated token, ...).
    #[error(transparent)]
    Session(SessionError),
}

impl From<CacheError> for TokenwardError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Codec(err) => Self::Protocol(err),
            other => Self::Cache(other),
        }
    }
}

impl From<SessionError> for TokenwardError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Token(err) => Self::Token(err),
            SessionError::Cache(err) => Self::from(err),
            other => Self::Session(other),
        }
    }
}

impl TokenwardError {
    /// `true` when the presented token must be discarded: the client
    /// should log in again rather than retry.
    pub fn is_invalidated(&self) -> bool {
        matches!(self, Self::Session(SessionError::InvalidatedToken))
    }

    /// The envelope code a caller should see for this error.
    pub fn api_code(&self) -> ApiCode {
        match self {
            Self::Session(SessionError::LoginFailed(_) | SessionError::UnknownUser(_)) => {
                ApiCode::LoginException
            }
            Self::Session(SessionError::InvalidatedToken) => ApiCode::AuthenticationException,
            Self::Session(SessionError::InvalidSignature | SessionError::ExpiredToken) => {
                ApiCode::Unauthorized
            }
            _ => ApiCode::Fail,
        }
    }
}
