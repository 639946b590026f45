//! Response envelopes and transport-facing constants.
//!
//! The transport layer (HTTP, RPC, whatever the embedding app uses) is
//! not part of Tokenward. These types are the contract it consumes: a
//! machine-readable [`ApiCode`], an [`ApiResult`] wrapper, the header that
//! carries the token, and the two status codes that tell a client its
//! token was rotated or must be discarded.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Identity;

/// Response header (or field) that carries the token string.
pub const JWT_TOKEN_NAME: &str = "token";

/// Status set when a refresh rotated the token. The new token is in the
/// [`JWT_TOKEN_NAME`] header.
pub const JWT_REFRESH_TOKEN_CODE: u16 = 460;

/// Status set when a presented token was already rotated away or revoked.
/// The client must drop it and must not retry with it.
pub const JWT_INVALID_TOKEN_CODE: u16 = 461;

// ---------------------------------------------------------------------------
// ApiCode
// ---------------------------------------------------------------------------

/// Machine-readable outcome codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCode {
    Success,
    Unauthorized,
    Fail,
    /// Identity resolution failed during login.
    LoginException,
    /// A presented token was rejected (forged, expired or revoked).
    AuthenticationException,
}

impl ApiCode {
    pub fn code(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::Unauthorized => 401,
            Self::Fail => 500,
            Self::LoginException => 4000,
            Self::AuthenticationException => 4001,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Unauthorized => "unauthorized",
            Self::Fail => "operation failed",
            Self::LoginException => "login failed",
            Self::AuthenticationException => "authentication failed",
        }
    }
}

impl fmt::Display for ApiCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

// ---------------------------------------------------------------------------
// ApiResult
// ---------------------------------------------------------------------------

/// Uniform result envelope returned by the entry points.
///
/// `data` is skipped when `None` so failure payloads stay small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult<T> {
    pub code: u16,
    pub msg: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(with = "time::serde::timestamp")]
    pub time: OffsetDateTime,
}

impl<T> ApiResult<T> {
    pub fn ok(data: T) -> Self {
        Self::ok_with_msg(data, ApiCode::Success.message())
    }

    pub fn ok_with_msg(data: T, msg: impl Into<String>) -> Self {
        Self {
            code: ApiCode::Success.code(),
            msg: msg.into(),
            success: true,
            data: Some(data),
            time: OffsetDateTime::now_utc(),
        }
    }

    pub fn fail(code: ApiCode) -> Self {
        Self::fail_with_msg(code, code.message())
    }

    pub fn fail_with_msg(code: ApiCode, msg: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            msg: msg.into(),
            success: false,
            data: None,
            time: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl ApiResult<()> {
    /// Success with no payload.
    pub fn done() -> Self {
        Self::ok(())
    }
}

// ---------------------------------------------------------------------------
// Login request / response
// ---------------------------------------------------------------------------

/// Login request as received from the transport.
///
/// The password is carried only so the embedding app can hand it to its
/// own credential check. Tokenward never reads it, and `Debug` hides it.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginParam {
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl LoginParam {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for LoginParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginParam")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Payload of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginVo {
    pub token: String,
    pub user: Identity,
}

// =========================================================================
// Tests
// =========================================================================
