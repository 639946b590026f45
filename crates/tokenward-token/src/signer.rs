//! HS256 token minting and verification.
//!
//! # Invariants
//! - Minting and verification are stateless and never consult the
//!   session store.
//! - A token only verifies under the effective salt it was minted with.
//! - `issued_at` reflects the wall clock at minting time, truncated to
//!   whole seconds (the resolution of the `iat`/`exp` claims).

use std::time::Duration;

use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokenward_protocol::EffectiveSalt;

use crate::TokenError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Issuer and audience stamped into every token and required on verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    pub issuer: String,
    pub audience: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            issuer: "tokenward".to_string(),
            audience: "web".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// Wire claims. `jti` makes two tokens minted for the same user in the
/// same second distinct, which rotation relies on.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
    jti: String,
}

/// What a token says about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: String,
    pub username: String,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl TokenClaims {
    fn from_wire(claims: Claims) -> Result<Self, TokenError> {
        let issued_at = OffsetDateTime::from_unix_timestamp(claims.iat)
            .map_err(|_| TokenError::Malformed)?;
        let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
            .map_err(|_| TokenError::Malformed)?;
        Ok(Self {
            subject: claims.sub,
            username: claims.username,
            issued_at,
            expires_at,
        })
    }
}

/// A freshly minted token and its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedToken {
    pub token: String,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

/// Mints and verifies tokens.
///
/// Holds only configuration, so it's cheap to clone and safe to share.
#[derive(Debug, Clone, Default)]
pub struct Signer {
    config: SignerConfig,
}

impl Signer {
    pub fn new(config: SignerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Mints a token for `subject`, valid for `ttl` from now.
    ///
    /// Timestamps are whole seconds, so a sub-second `ttl` is rounded up
    /// to one second.
    ///
    /// # Errors
    /// [`TokenError::InvalidInput`] for an empty subject, an empty salt, a
    /// zero `ttl`, or a `ttl` whose expiry falls outside the representable
    /// date range.
    pub fn mint(
        &self,
        subject: &str,
        salt: &EffectiveSalt,
        ttl: Duration,
    ) -> Result<MintedToken, TokenError> {
        if subject.is_empty() {
            return Err(TokenError::InvalidInput("subject is empty".into()));
        }
        if salt.is_empty() {
            return Err(TokenError::InvalidInput("signing salt is empty".into()));
        }
        if ttl.is_zero() {
            return Err(TokenError::InvalidInput("ttl is zero".into()));
        }
        let out_of_range = || TokenError::InvalidInput(format!("ttl out of range: {ttl:?}"));
        let ttl_secs = i64::try_from(ttl.as_secs().max(1)).map_err(|_| out_of_range())?;

        let now = OffsetDateTime::now_utc();
        let issued_at = now - time::Duration::nanoseconds(i64::from(now.nanosecond()));
        let expires_at = issued_at
            .checked_add(time::Duration::seconds(ttl_secs))
            .ok_or_else(out_of_range)?;

        let claims = Claims {
            sub: subject.to_string(),
            username: subject.to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            jti: token_id(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(salt.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(MintedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verifies signature, issuer, audience and expiry.
    ///
    /// Expiry is checked with zero leeway: a token whose `exp` is in the
    /// past is [`TokenError::Expired`].
    pub fn verify(
        &self,
        token: &str,
        salt: &EffectiveSalt,
    ) -> Result<TokenClaims, TokenError> {
        if salt.is_empty() {
            return Err(TokenError::InvalidInput("signing salt is empty".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_audience(&[self.config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss", "aud"]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(salt.as_bytes()),
            &validation,
        )
        .map_err(map_jwt_error)?;

        if data.claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }
        TokenClaims::from_wire(data.claims)
    }

    /// Reads a token's claims without checking the signature or expiry.
    ///
    /// Only for classifying tokens (is it expired? is it even a token?).
    /// Never use the result to grant access.
    pub fn peek(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(b"unverified"),
            &validation,
        )
        .map_err(map_jwt_error)?;

        TokenClaims::from_wire(data.claims)
    }
}

/// Random 128-bit token id, hex encoded.
fn token_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Maps jsonwebtoken errors onto our three client-facing outcomes.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    }
}
