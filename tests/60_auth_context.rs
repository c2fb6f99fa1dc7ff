mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use cape_hq::client::{ApiClient, AuthContext, AuthState, IdentityProvider, LocalIdentity, Session, SessionUser};
use cape_hq::types::Role;
use tokio::time::timeout;

const SETTLE: Duration = Duration::from_secs(5);

async fn wait_until(context: &AuthContext, done: impl Fn(&AuthState) -> bool) -> Result<AuthState> {
    let mut rx = context.watch();
    let state = timeout(SETTLE, rx.wait_for(|s| done(s))).await??.clone();
    Ok(state)
}

#[tokio::test]
async fn resolves_role_from_profile_and_caches_it() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("admin", "Oracle", 9).await;

    let session = Session::new(SessionUser::new("admin"), server.token("admin"));
    let identity = Arc::new(LocalIdentity::with_session(session));
    let api = Arc::new(ApiClient::new(&server.base_url)?);
    let context = AuthContext::mount(identity.clone(), api, Arc::new(|| {}));

    let state = wait_until(&context, |s| !s.is_loading()).await?;
    assert_eq!(state.role(), Some(Role::Admin));
    assert_eq!(state.user().map(|u| u.id.as_str()), Some("admin"));

    let cached = identity.get_session().await?.map(|s| s.user.metadata_role());
    assert_eq!(cached, Some(Some(Role::Admin)));
    // the published user matches the provider's stored session
    let stored = identity.get_session().await?.map(|s| s.user);
    assert_eq!(state.user(), stored.as_ref());
    assert_eq!(state.user().and_then(|u| u.metadata_role()), Some(Role::Admin));
    Ok(())
}

#[tokio::test]
async fn missing_profile_falls_back_to_hero() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let session = Session::new(SessionUser::new("newbie"), server.token("newbie"));
    let identity = Arc::new(LocalIdentity::with_session(session));
    let api = Arc::new(ApiClient::new(&server.base_url)?);
    let context = AuthContext::mount(identity, api, Arc::new(|| {}));

    let state = wait_until(&context, |s| !s.is_loading()).await?;
    assert_eq!(state.role(), Some(Role::Hero));
    Ok(())
}

#[tokio::test]
async fn follows_sign_in_and_sign_out() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Raven", 3).await;

    let identity = Arc::new(LocalIdentity::new());
    let api = Arc::new(ApiClient::new(&server.base_url)?);
    let refreshes = Arc::new(AtomicUsize::new(0));
    let counter = refreshes.clone();
    let context = AuthContext::mount(
        identity.clone(),
        api,
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let state = wait_until(&context, |s| !s.is_loading()).await?;
    assert_eq!(state, AuthState::Unauthenticated);

    let mut user = SessionUser::new("u1");
    user.metadata.insert("role".into(), serde_json::json!("SUPPORT"));
    identity.sign_in(Session::new(user, server.token("u1"))).await;
    let state = wait_until(&context, |s| s.user().is_some()).await?;
    // metadata wins over the profile
    assert_eq!(state.role(), Some(Role::Support));

    identity.sign_out().await;
    let state = wait_until(&context, |s| *s == AuthState::Unauthenticated).await?;
    assert_eq!(state.user(), None);

    timeout(SETTLE, async {
        while refreshes.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn dropping_the_handle_stops_listening() -> Result<()> {
    let identity = Arc::new(LocalIdentity::new());
    let api = Arc::new(ApiClient::new("http://127.0.0.1:9")?);
    let context = AuthContext::mount(identity.clone(), api, Arc::new(|| {}));

    wait_until(&context, |s| !s.is_loading()).await?;
    assert_eq!(identity.subscriber_count(), 1);

    drop(context);
    timeout(SETTLE, async {
        while identity.subscriber_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    Ok(())
}
