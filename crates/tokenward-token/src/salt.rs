//! Effective salt derivation.
//!
//! Every login's tokens are keyed by an HMAC-SHA256 of the user's salt
//! under the process secret. Rotating the process secret therefore
//! invalidates every outstanding signature at once, and changing one
//! user's salt invalidates only theirs.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokenward_protocol::{EffectiveSalt, PerUserSalt};

use crate::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// Derives the effective salt for one login.
///
/// Deterministic for a given `(process_secret, per_user_salt)` pair, so a
/// refresh can reuse the stored value instead of re-fetching the user.
/// When the user has no salt, the process secret alone keys the HMAC.
///
/// # Errors
/// [`TokenError::InvalidInput`] when the process secret and the user salt
/// are both empty: there would be nothing secret left in the key.
pub fn derive_salt(
    process_secret: &str,
    per_user_salt: Option<&PerUserSalt>,
) -> Result<EffectiveSalt, TokenError> {
    let user_part = per_user_salt.map_or("", PerUserSalt::expose);
    if process_secret.is_empty() && user_part.is_empty() {
        return Err(TokenError::InvalidInput(
            "process secret and user salt are both empty".into(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(process_secret.as_bytes())
        .map_err(|e| TokenError::InvalidInput(e.to_string()))?;
    mac.update(user_part.as_bytes());
    let digest = mac.finalize().into_bytes();

    Ok(EffectiveSalt::new(hex::encode(digest)))
}
