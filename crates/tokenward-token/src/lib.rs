//! Token signing for Tokenward.
//!
//! Two stateless pieces live here:
//!
//! 1. **Salt derivation** ([`derive_salt`]): combines the process-wide
//!    secret with a user's salt into the [`EffectiveSalt`] that keys that
//!    user's tokens.
//! 2. **Signing** ([`Signer`]): mints and verifies self-contained HS256
//!    tokens keyed by an effective salt.
//!
//! Neither touches the session store. A token that verifies here is
//! well-formed and unexpired, nothing more: whether it is still honored is
//! the session layer's decision.
//!
//! [`EffectiveSalt`]: tokenward_protocol::EffectiveSalt

mod error;
mod salt;
mod signer;

pub use error::TokenError;
pub use salt::derive_salt;
pub use signer::{MintedToken, Signer, SignerConfig, TokenClaims};
