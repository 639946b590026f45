//! End-to-end token lifecycle tests against the in-memory store.
//!
//! Clock-dependent behavior is driven through configuration: a refresh
//! countdown as long as the token lifetime puts every token inside the
//! refresh window, a countdown of zero keeps every fresh token outside it.
//! Only the expiry test waits on the wall clock, for a one-second lifetime.

use std::sync::Arc;
use std::time::Duration;

use tokenward_cache::{MemoryStore, SessionStore};
use tokenward_protocol::{Identity, PerUserSalt};
use tokenward_session::{
    RefreshOutcome, SessionConfig, SessionError, SessionManager,
    StaticIdentityProvider, TokenState,
};

// =========================================================================
// Helpers
// =========================================================================

type Manager = SessionManager<MemoryStore, StaticIdentityProvider>;

fn directory() -> StaticIdentityProvider {
    StaticIdentityProvider::new().with_user(
        Identity::new(1, "alice")
            .with_role("admin")
            .with_salt(PerUserSalt::new("666")),
    )
}

fn in_window() -> Manager {
    SessionManager::new(
        SessionConfig {
            expire_secs: 600,
            refresh_countdown_secs: 600,
            ..SessionConfig::with_secret("integration-secret")
        },
        MemoryStore::default(),
        directory(),
    )
}

fn out_of_window() -> Manager {
    SessionManager::new(
        SessionConfig {
            refresh_countdown_secs: 0,
            ..SessionConfig::with_secret("integration-secret")
        },
        MemoryStore::default(),
        directory(),
    )
}

// =========================================================================
// Scenario
// =========================================================================

#[tokio::test]
async fn test_login_refresh_replay_logout_scenario() {
    let manager = in_window();

    // login → T1 live
    let ctx = manager.login("alice").await.unwrap();
    let t1 = ctx.token.clone();
    assert!(manager.store().exists(&t1.token).await.unwrap());

    // refresh(T1) → T2, T1 stale
    let t2 = match manager.refresh(&t1).await.unwrap() {
        RefreshOutcome::Rotated(next) => next,
        other => panic!("expected rotation, got {other:?}"),
    };
    assert_ne!(t2.token, t1.token);
    assert!(!manager.store().exists(&t1.token).await.unwrap());
    assert!(manager.store().exists(&t2.token).await.unwrap());

    // refresh(T1) again → invalidated
    let replay = manager.refresh(&t1).await.unwrap().into_token(&t1);
    assert!(matches!(replay, Err(SessionError::InvalidatedToken)));

    // logout of the current session → T2 gone
    let current = manager.authenticate(&t2.token).await.unwrap();
    manager.logout(&current).await.unwrap();
    assert!(!manager.store().exists(&t2.token).await.unwrap());
}

// =========================================================================
// Properties
// =========================================================================

#[tokio::test]
async fn test_refresh_outside_window_leaves_store_unchanged() {
    let manager = out_of_window();
    let ctx = manager.login("alice").await.unwrap();

    let kept = manager
        .refresh(&ctx.token)
        .await
        .unwrap()
        .into_token(&ctx.token)
        .unwrap();

    assert_eq!(kept, ctx.token);
    assert_eq!(manager.store().len().await, 1);
    assert!(manager.store().exists(&ctx.token.token).await.unwrap());
}

#[tokio::test]
async fn test_replay_performs_no_store_mutation() {
    let manager = in_window();
    let ctx = manager.login("alice").await.unwrap();
    let next = manager
        .refresh(&ctx.token)
        .await
        .unwrap()
        .into_token(&ctx.token)
        .unwrap();

    assert_eq!(manager.refresh(&ctx.token).await.unwrap(), RefreshOutcome::Invalidated);

    assert_eq!(manager.store().len().await, 1);
    assert!(manager.store().exists(&next.token).await.unwrap());
}

#[tokio::test]
async fn test_logout_twice_then_token_is_invalidated_everywhere() {
    let manager = in_window();
    let ctx = manager.login("alice").await.unwrap();

    manager.logout(&ctx).await.unwrap();
    manager.logout(&ctx).await.unwrap();

    assert_eq!(manager.refresh(&ctx.token).await.unwrap(), RefreshOutcome::Invalidated);
    assert!(matches!(
        manager.authenticate(&ctx.token.token).await,
        Err(SessionError::InvalidatedToken)
    ));
    assert_eq!(manager.inspect(&ctx.token.token).await.unwrap(), TokenState::Stale);
}

#[tokio::test]
async fn test_rotated_token_authenticates_with_same_identity() {
    let manager = in_window();
    let ctx = manager.login("alice").await.unwrap();
    let next = manager
        .refresh(&ctx.token)
        .await
        .unwrap()
        .into_token(&ctx.token)
        .unwrap();

    let current = manager.authenticate(&next.token).await.unwrap();

    assert_eq!(current.identity, ctx.identity);
    assert_eq!(current.token, next);
}

#[tokio::test]
async fn test_revoke_all_then_every_token_is_stale() {
    let manager = in_window();
    let first = manager.login("alice").await.unwrap();
    let second = manager.login("alice").await.unwrap();

    assert_eq!(manager.revoke_all("alice").await.unwrap(), 2);

    for ctx in [first, second] {
        assert_eq!(manager.inspect(&ctx.token.token).await.unwrap(), TokenState::Stale);
    }
}

#[tokio::test]
async fn test_evicted_session_behaves_as_revoked() {
    let manager = SessionManager::new(
        SessionConfig {
            expire_secs: 600,
            refresh_countdown_secs: 600,
            ..SessionConfig::with_secret("integration-secret")
        },
        MemoryStore::with_capacity(1),
        directory(),
    );
    let first = manager.login("alice").await.unwrap();
    manager.login("alice").await.unwrap();

    assert_eq!(manager.refresh(&first.token).await.unwrap(), RefreshOutcome::Invalidated);
}

#[tokio::test]
async fn test_token_past_its_expiry_is_expired_everywhere() {
    let manager = SessionManager::new(
        SessionConfig {
            expire_secs: 1,
            refresh_countdown_secs: 1,
            ..SessionConfig::with_secret("integration-secret")
        },
        MemoryStore::default(),
        directory(),
    );
    let ctx = manager.login("alice").await.unwrap();

    // Embedded expiry is whole seconds; two full seconds are always past it.
    tokio::time::sleep(Duration::from_millis(2_100)).await;

    assert!(matches!(
        manager.refresh(&ctx.token).await,
        Err(SessionError::ExpiredToken)
    ));
    assert!(matches!(
        manager.authenticate(&ctx.token.token).await,
        Err(SessionError::ExpiredToken)
    ));
    assert_eq!(manager.inspect(&ctx.token.token).await.unwrap(), TokenState::Expired);
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_refresh_has_exactly_one_winner() {
    let manager = Arc::new(in_window());
    let ctx = manager.login("alice").await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let token = ctx.token.clone();
            tokio::spawn(async move { manager.refresh(&token).await })
        })
        .collect();

    let mut rotated = Vec::new();
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            RefreshOutcome::Rotated(next) => rotated.push(next),
            RefreshOutcome::Invalidated => {}
            RefreshOutcome::Valid => panic!("token was inside the refresh window"),
        }
    }

    assert_eq!(rotated.len(), 1);
    assert_eq!(manager.store().len().await, 1);
    assert!(manager.store().exists(&rotated[0].token).await.unwrap());
}
