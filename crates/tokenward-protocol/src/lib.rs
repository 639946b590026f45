//! Session data model for Tokenward.
//!
//! This crate defines the records that every other layer passes around:
//!
//! - **Types** ([`Identity`], [`SessionToken`], [`CachedSession`]):
//!   who a user is, what token they hold, and what the server remembers
//!   about that token.
//! - **API envelopes** ([`ApiResult`], [`ApiCode`], [`LoginParam`],
//!   [`LoginVo`]): the shapes returned to the transport layer, plus the
//!   header name and status codes that signal token rotation.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how session records are
//!   turned into bytes when a store needs to persist them.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about signing or caching. It only
//! describes data.
//!
//! ```text
//! Token (signing) → Cache (session store) → Session (lifecycle)
//!                 ↖        ↑        ↗
//!                   Protocol (records)
//! ```

mod api;
mod codec;
mod error;
mod types;

pub use api::{
    ApiCode, ApiResult, LoginParam, LoginVo, JWT_INVALID_TOKEN_CODE,
    JWT_REFRESH_TOKEN_CODE, JWT_TOKEN_NAME,
};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    fingerprint, CachedSession, EffectiveSalt, Identity, PerUserSalt,
    SessionToken,
};
