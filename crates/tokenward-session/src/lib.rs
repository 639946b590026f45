//! Token lifecycle management for Tokenward.
//!
//! This crate decides, given an identity and a presented token, what the
//! next token state is:
//!
//! 1. **Login**: resolve the user ([`IdentityProvider`]), derive the
//!    effective salt, mint a token, register it in the session store
//! 2. **Refresh**: near expiry, rotate a live token into a new one and
//!    refuse to rotate one that was already rotated or revoked
//! 3. **Logout**: revoke by deleting the store entry
//!
//! # How it fits in the stack
//!
//! ```text
//! Entry points (above)  ← translate outcomes into headers and status codes
//!     ↕
//! Session Layer (this crate)  ← the token state machine
//!     ↕
//! Token + Cache Layers (below)  ← signing and the live-session registry
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod identity;
mod manager;
mod state;

pub use config::SessionConfig;
pub use error::SessionError;
pub use identity::{IdentityProvider, StaticIdentityProvider};
pub use manager::SessionManager;
pub use state::{RefreshOutcome, SessionContext, TokenState};
