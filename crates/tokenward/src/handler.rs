//! Request-level endpoints: login, refresh, logout, current user.
//!
//! Each endpoint turns a lifecycle outcome into what a transport needs:
//! a response status, the token header, and an [`ApiResult`] body. The
//! transport itself stays outside. It only has to implement
//! [`ResponseSink`] over its own response type.
//!
//! | Outcome            | Status | Header        |
//! |--------------------|--------|---------------|
//! | login succeeded    | -      | `token: <new>`|
//! | refresh rotated    | 460    | `token: <new>`|
//! | refresh invalidated| 461    | -             |

use std::collections::{BTreeMap, BTreeSet};

use tokenward_cache::SessionStore;
use tokenward_protocol::{
    ApiCode, ApiResult, Identity, JWT_INVALID_TOKEN_CODE,
    JWT_REFRESH_TOKEN_CODE, JWT_TOKEN_NAME, LoginParam, LoginVo, SessionToken,
};
use tokenward_session::{
    IdentityProvider, RefreshOutcome, SessionContext, SessionError,
};

use crate::{Tokenward, TokenwardError};

/// Where an endpoint writes its status code and headers.
pub trait ResponseSink {
    fn set_status(&mut self, status: u16);
    fn set_header(&mut self, name: &str, value: &str);
}

/// A [`ResponseSink`] that just remembers what was written.
///
/// Useful in tests, and as a buffer when the real response is built
/// after the endpoint returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedResponse {
    pub status: Option<u16>,
    pub headers: BTreeMap<String, String>,
}

impl RecordedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

impl ResponseSink for RecordedResponse {
    fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }
}

impl<S: SessionStore, P: IdentityProvider> Tokenward<S, P> {
    /// Logs a user in. The caller has already checked the password.
    ///
    /// On success the new token goes into the `token` header and the body.
    /// An unknown user yields [`ApiCode::LoginException`]; a server-side
    /// failure yields [`ApiCode::Fail`].
    pub async fn login(
        &self,
        param: &LoginParam,
        sink: &mut impl ResponseSink,
    ) -> ApiResult<LoginVo> {
        match self.manager.login(&param.username).await {
            Ok(ctx) => {
                sink.set_header(JWT_TOKEN_NAME, &ctx.token.token);
                ApiResult::ok(LoginVo {
                    token: ctx.token.token,
                    user: ctx.identity,
                })
            }
            Err(err) => {
                if !err.is_client_error() {
                    tracing::error!(username = %param.username, error = %err, "login failed");
                }
                failure(&err.into())
            }
        }
    }

    /// Refreshes the current session's token if it is near expiry.
    ///
    /// Returns the token the client should use from now on. On rotation
    /// the response gets status 460 and the new token header. A token
    /// that was already rotated away or revoked gets status 461 and an
    /// error; the client must log in again.
    pub async fn refresh(
        &self,
        token: &SessionToken,
        sink: &mut impl ResponseSink,
    ) -> Result<SessionToken, TokenwardError> {
        match self.manager.refresh(token).await? {
            RefreshOutcome::Valid => Ok(token.clone()),
            RefreshOutcome::Rotated(next) => {
                sink.set_status(JWT_REFRESH_TOKEN_CODE);
                sink.set_header(JWT_TOKEN_NAME, &next.token);
                Ok(next)
            }
            RefreshOutcome::Invalidated => {
                sink.set_status(JWT_INVALID_TOKEN_CODE);
                Err(SessionError::InvalidatedToken.into())
            }
        }
    }

    /// Revokes the current session's token.
    pub async fn logout(&self, ctx: &SessionContext) -> ApiResult<()> {
        match self.manager.logout(ctx).await {
            Ok(()) => ApiResult::done(),
            Err(err) => {
                tracing::error!(username = %ctx.username(), error = %err, "logout failed");
                ApiResult::fail(ApiCode::Fail)
            }
        }
    }

    /// Resolves a presented token string into the current session.
    pub async fn authenticate(&self, token: &str) -> Result<SessionContext, TokenwardError> {
        Ok(self.manager.authenticate(token).await?)
    }

    /// The identity behind a presented token, as an envelope.
    ///
    /// A forged or expired token yields [`ApiCode::Unauthorized`]; a token
    /// that was rotated away or revoked yields
    /// [`ApiCode::AuthenticationException`].
    pub async fn current_user(&self, token: &str) -> ApiResult<Identity> {
        match self.authenticate(token).await {
            Ok(ctx) => ApiResult::ok(ctx.identity),
            Err(err) => {
                if err.api_code() == ApiCode::Fail {
                    tracing::error!(error = %err, "current user lookup failed");
                }
                failure(&err)
            }
        }
    }

    /// Roles captured when the session was created.
    pub fn roles(&self, ctx: &SessionContext) -> BTreeSet<String> {
        self.manager.roles(ctx).clone()
    }

    /// Current roles of a subject, as the identity provider sees them now.
    pub async fn roles_for(&self, subject_id: u64) -> Result<BTreeSet<String>, TokenwardError> {
        Ok(self.manager.roles_for(subject_id).await?)
    }
}

/// Client-facing failures carry the error text; server-side ones only
/// the generic message.
fn failure<T>(err: &TokenwardError) -> ApiResult<T> {
    match err.api_code() {
        ApiCode::Fail => ApiResult::fail(ApiCode::Fail),
        code => ApiResult::fail_with_msg(code, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_hides_server_side_detail() {
        let server: TokenwardError =
            tokenward_cache::CacheError::Backend("10.0.0.7 refused".into()).into();
        let client: TokenwardError = SessionError::UnknownUser("mallory".into()).into();

        let hidden: ApiResult<()> = failure(&server);
        let shown: ApiResult<()> = failure(&client);

        assert_eq!(hidden.code, ApiCode::Fail.code());
        assert!(!hidden.msg.contains("10.0.0.7"));
        assert_eq!(shown.code, ApiCode::LoginException.code());
        assert!(shown.msg.contains("mallory"));
    }

    #[test]
    fn test_recorded_response_keeps_last_values() {
        let mut response = RecordedResponse::new();

        response.set_status(460);
        response.set_status(461);
        response.set_header("token", "a");
        response.set_header("token", "b");

        assert_eq!(response.status, Some(461));
        assert_eq!(response.header("token"), Some("b"));
        assert_eq!(response.header("missing"), None);
    }
}
