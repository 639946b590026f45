use tokenward::prelude::*;

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Reads `TOKENWARD_CONFIG` (JSON) if set, otherwise a demo config where
/// every refresh falls inside the refresh window.
fn load_config() -> Result<SessionConfig, serde_json::Error> {
    match std::env::var("TOKENWARD_CONFIG") {
        Ok(raw) => serde_json::from_str(&raw),
        Err(_) => Ok(SessionConfig {
            expire_secs: 600,
            refresh_countdown_secs: 600,
            ..SessionConfig::with_secret("walkthrough-secret")
        }),
    }
}

fn users() -> StaticIdentityProvider {
    StaticIdentityProvider::new().with_user(
        Identity::new(1, "alice")
            .with_role("admin")
            .with_salt(PerUserSalt::new("666")),
    )
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tokenward::telemetry::init();

    let store = MemoryStore::default();
    let sweeper = store.spawn_sweeper(std::time::Duration::from_secs(60));
    let service = Tokenward::builder()
        .config(load_config()?)
        .store(store)
        .identity_provider(users())
        .build();

    // 1. login
    let mut response = RecordedResponse::new();
    let login = service.login(&LoginParam::new("alice"), &mut response).await;
    tracing::info!(body = %serde_json::to_string(&login)?, "login response");
    let t1 = response
        .header(JWT_TOKEN_NAME)
        .ok_or("login did not set the token header")?
        .to_string();
    let ctx = service.authenticate(&t1).await?;
    tracing::info!(roles = ?service.roles(&ctx), "authenticated with T1");

    // 2. refresh T1 → T2
    let mut response = RecordedResponse::new();
    let t2 = service.refresh(&ctx.token, &mut response).await?;
    tracing::info!(status = ?response.status, rotated = t2.token != t1, "refreshed T1");

    // 3. replay T1
    let mut response = RecordedResponse::new();
    match service.refresh(&ctx.token, &mut response).await {
        Err(err) if err.is_invalidated() => {
            tracing::info!(status = ?response.status, "replay of T1 refused");
        }
        other => tracing::warn!(?other, "replay of T1 was not refused"),
    }

    // 4. logout with T2
    let current = service.authenticate(&t2.token).await?;
    let logout = service.logout(&current).await;
    let state = service.manager().inspect(&t2.token).await?;
    tracing::info!(success = logout.is_success(), ?state, "logged out");

    let after = service.current_user(&t2.token).await;
    tracing::info!(code = after.code, msg = %after.msg, "current user with T2 after logout");

    sweeper.abort();
    Ok(())
}
