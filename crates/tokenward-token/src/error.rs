//! Error types for the token layer.

/// Errors produced while minting, verifying or decoding a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The signature doesn't match, or the token names another issuer or
    /// audience. Either way it wasn't minted by us with this salt.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The embedded expiry is in the past.
    #[error("token has expired")]
    Expired,

    /// The token can't be parsed as a signed token at all.
    #[error("malformed token")]
    Malformed,

    /// The caller asked for something we refuse to sign: an empty subject,
    /// an empty key, a zero lifetime.
    #[error("invalid signing input: {0}")]
    InvalidInput(String),

    /// The signing backend itself failed.
    #[error("signing failed: {0}")]
    Signing(String),
}
