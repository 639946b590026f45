//! Integration tests for the Tokenward endpoints and their response
//! signalling.

use std::time::Duration;

use tokenward::prelude::*;
use tokenward_cache::CacheError;

// =========================================================================
// Mock identity provider and store
// =========================================================================

fn directory() -> StaticIdentityProvider {
    StaticIdentityProvider::new()
        .with_user(
            Identity::new(1, "alice")
                .with_role("admin")
                .with_salt(PerUserSalt::new("666")),
        )
        .with_user(Identity::new(2, "bob").with_role("viewer"))
}

/// A store whose backend is always down.
struct BrokenStore;

fn down() -> CacheError {
    CacheError::Backend("connection refused".into())
}

impl SessionStore for BrokenStore {
    async fn exists(&self, _token: &str) -> Result<bool, CacheError> {
        Err(down())
    }

    async fn get(&self, _token: &str) -> Result<Option<CachedSession>, CacheError> {
        Err(down())
    }

    async fn put(
        &self,
        _token: &str,
        _session: CachedSession,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Err(down())
    }

    async fn delete(&self, _token: &str) -> Result<(), CacheError> {
        Err(down())
    }

    async fn delete_user(&self, _username: &str) -> Result<usize, CacheError> {
        Err(down())
    }
}

// =========================================================================
// Helpers
// =========================================================================

/// Every refresh lands inside the refresh window.
fn service() -> Tokenward<MemoryStore, StaticIdentityProvider> {
    Tokenward::builder()
        .config(SessionConfig {
            expire_secs: 600,
            refresh_countdown_secs: 600,
            ..SessionConfig::with_secret("endpoint-secret")
        })
        .store(MemoryStore::default())
        .identity_provider(directory())
        .build()
}

async fn logged_in(
    service: &Tokenward<MemoryStore, StaticIdentityProvider>,
    username: &str,
) -> SessionContext {
    let mut response = RecordedResponse::new();
    let result = service.login(&LoginParam::new(username), &mut response).await;
    assert!(result.is_success());
    let token = response.header(JWT_TOKEN_NAME).expect("token header");
    service.authenticate(token).await.expect("fresh token authenticates")
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn test_login_sets_header_and_body() {
    let service = service();
    let mut response = RecordedResponse::new();

    let result = service.login(&LoginParam::new("alice"), &mut response).await;

    assert_eq!(result.code, ApiCode::Success.code());
    let body = result.data.expect("login payload");
    assert_eq!(response.header(JWT_TOKEN_NAME), Some(body.token.as_str()));
    assert_eq!(response.status, None);
    assert_eq!(body.user.username, "alice");
    assert!(body.user.salt.is_none());
}

#[tokio::test]
async fn test_login_body_never_serializes_salt() {
    let service = service();
    let mut response = RecordedResponse::new();

    let result = service.login(&LoginParam::new("alice"), &mut response).await;
    let json = serde_json::to_string(&result).unwrap();

    assert!(json.contains("\"username\":\"alice\""));
    assert!(!json.contains("\"salt\""));
    assert!(!json.contains("effective_salt"));
}

#[tokio::test]
async fn test_login_unknown_user_is_login_exception() {
    let service = service();
    let mut response = RecordedResponse::new();

    let result = service.login(&LoginParam::new("mallory"), &mut response).await;

    assert!(!result.is_success());
    assert_eq!(result.code, ApiCode::LoginException.code());
    assert!(response.headers.is_empty());
    assert!(service.manager().store().is_empty().await);
}

#[tokio::test]
async fn test_login_with_store_down_is_fail() {
    let service = Tokenward::builder()
        .secret("endpoint-secret")
        .store(BrokenStore)
        .identity_provider(directory())
        .build();
    let mut response = RecordedResponse::new();

    let result = service.login(&LoginParam::new("alice"), &mut response).await;

    assert_eq!(result.code, ApiCode::Fail.code());
    assert!(response.header(JWT_TOKEN_NAME).is_none());
}

// =========================================================================
// Refresh
// =========================================================================

#[tokio::test]
async fn test_refresh_rotation_sets_460_and_header() {
    let service = service();
    let ctx = logged_in(&service, "alice").await;
    let mut response = RecordedResponse::new();

    let next = service.refresh(&ctx.token, &mut response).await.unwrap();

    assert_ne!(next.token, ctx.token.token);
    assert_eq!(response.status, Some(JWT_REFRESH_TOKEN_CODE));
    assert_eq!(response.header(JWT_TOKEN_NAME), Some(next.token.as_str()));
}

#[tokio::test]
async fn test_refresh_replay_sets_461_and_errors() {
    let service = service();
    let ctx = logged_in(&service, "alice").await;
    service
        .refresh(&ctx.token, &mut RecordedResponse::new())
        .await
        .unwrap();
    let mut response = RecordedResponse::new();

    let result = service.refresh(&ctx.token, &mut response).await;

    assert!(result.unwrap_err().is_invalidated());
    assert_eq!(response.status, Some(JWT_INVALID_TOKEN_CODE));
    assert!(response.header(JWT_TOKEN_NAME).is_none());
}

#[tokio::test]
async fn test_refresh_outside_window_returns_same_token() {
    let service = Tokenward::builder()
        .config(SessionConfig {
            refresh_countdown_secs: 0,
            ..SessionConfig::with_secret("endpoint-secret")
        })
        .store(MemoryStore::default())
        .identity_provider(directory())
        .build();
    let ctx = logged_in(&service, "alice").await;
    let mut response = RecordedResponse::new();

    let kept = service.refresh(&ctx.token, &mut response).await.unwrap();

    assert_eq!(kept, ctx.token);
    assert_eq!(response, RecordedResponse::new());
}

#[tokio::test]
async fn test_refresh_with_wrong_salt_is_session_error() {
    let service = service();
    let ctx = logged_in(&service, "alice").await;
    let mut forged = ctx.token.clone();
    forged.effective_salt = logged_in(&service, "bob").await.token.effective_salt;
    let mut response = RecordedResponse::new();

    let result = service.refresh(&forged, &mut response).await;

    assert!(matches!(
        result,
        Err(TokenwardError::Session(SessionError::InvalidSignature))
    ));
    assert_eq!(response.status, None);
}

// =========================================================================
// Logout / roles
// =========================================================================

#[tokio::test]
async fn test_logout_twice_succeeds_then_token_is_rejected() {
    let service = service();
    let ctx = logged_in(&service, "alice").await;

    assert!(service.logout(&ctx).await.is_success());
    assert!(service.logout(&ctx).await.is_success());

    let err = service.authenticate(&ctx.token.token).await.unwrap_err();
    assert!(err.is_invalidated());
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let service = service();
    let alice = logged_in(&service, "alice").await;
    let bob = logged_in(&service, "bob").await;

    service.logout(&alice).await;

    assert!(service.authenticate(&bob.token.token).await.is_ok());
    assert!(service.roles(&bob).contains("viewer"));
    assert!(service.roles_for(1).await.unwrap().contains("admin"));
}

#[tokio::test]
async fn test_clones_share_sessions() {
    let service = service();
    let other = service.clone();
    let ctx = logged_in(&service, "alice").await;

    let found = other.authenticate(&ctx.token.token).await.unwrap();

    assert_eq!(found.username(), "alice");
}

// =========================================================================
// Current user
// =========================================================================

#[tokio::test]
async fn test_current_user_live_token_is_success() {
    let service = service();
    let ctx = logged_in(&service, "alice").await;

    let result = service.current_user(&ctx.token.token).await;

    assert!(result.is_success());
    let user = result.data.expect("identity payload");
    assert_eq!(user.username, "alice");
    assert!(user.roles.contains("admin"));
}

#[tokio::test]
async fn test_current_user_forged_token_is_unauthorized() {
    let service = service();

    let result = service.current_user("not.a.token").await;

    assert!(!result.is_success());
    assert_eq!(result.code, ApiCode::Unauthorized.code());
    assert!(result.data.is_none());
}

#[tokio::test]
async fn test_current_user_revoked_token_is_authentication_exception() {
    let service = service();
    let ctx = logged_in(&service, "alice").await;
    service.logout(&ctx).await;

    let result = service.current_user(&ctx.token.token).await;

    assert_eq!(result.code, ApiCode::AuthenticationException.code());
}

#[tokio::test]
async fn test_current_user_with_store_down_is_fail() {
    let healthy = service();
    let ctx = logged_in(&healthy, "alice").await;
    let service = Tokenward::builder()
        .config(healthy.config().clone())
        .store(BrokenStore)
        .identity_provider(directory())
        .build();

    let result = service.current_user(&ctx.token.token).await;

    assert_eq!(result.code, ApiCode::Fail.code());
    assert_eq!(result.msg, ApiCode::Fail.message());
}
