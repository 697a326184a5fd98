mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use common::stall::StallingStore;
use common::{EMAIL, Harness, PASSWORD};
use warden_auth::refresh::{generate_refresh_secret, hash_refresh_secret};
use warden_core::ErrorKind;
use warden_database::IdentityStore;
use warden_entity::{ClientMeta, NewRefreshToken, UserStatus};

fn client() -> ClientMeta {
    ClientMeta::new(Some("203.0.113.7"), Some("integration-tests"))
}

#[tokio::test]
async fn test_login_scope_is_union_of_role_permissions() {
    let h = Harness::new();
    let editor = h.role("editor", &["docs:read"]).await;
    let user = h.user(EMAIL, PASSWORD, &[editor]).await;

    let session = h.sessions.login("A@X.com", PASSWORD, client()).await.unwrap();
    assert_eq!(session.scope, vec!["docs:read"]);
    assert!(session.expires_in > 0 && session.expires_in <= 15 * 60);
    assert_eq!(session.user.user.id, user.id);
    assert_eq!(session.user.roles.len(), 1);

    let claims = h.decoder.parse_access_token(&session.access_token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.scope, vec!["docs:read"]);
    assert_eq!(claims.role_ids, vec![editor]);
}

#[tokio::test]
async fn test_login_records_client_and_last_login() {
    let h = Harness::new();
    let user = h.user(EMAIL, PASSWORD, &[]).await;

    let session = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();
    assert!(session.scope.is_empty());

    let mut tx = h.store.begin().await.unwrap();
    let stored = tx.find_user_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.last_login_at.is_some());

    let record = tx
        .find_refresh_token_by_hash_for_update(&hash_refresh_secret(&session.refresh_token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.created_by_ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(record.user_agent.as_deref(), Some("integration-tests"));
    assert_eq!(record.expires_at, session.refresh_expires_at);
}

#[tokio::test]
async fn test_login_failures() {
    let h = Harness::new();
    let user = h.user(EMAIL, PASSWORD, &[]).await;

    let err = h.sessions.login("nobody@x.com", PASSWORD, client()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);

    let err = h.sessions.login(EMAIL, "wrong", client()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);

    h.set_status(user.id, UserStatus::Disabled).await;
    let err = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserNotActive);

    // A disabled account still answers InvalidCredentials for a wrong password.
    let err = h.sessions.login(EMAIL, "wrong", client()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
}

#[tokio::test]
async fn test_deleted_user_cannot_login() {
    let h = Harness::new();
    let user = h.user(EMAIL, PASSWORD, &[]).await;
    h.set_status(user.id, UserStatus::Deleted).await;

    let err = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
}

#[tokio::test]
async fn test_refresh_rotates_within_family() {
    let h = Harness::new();
    h.user(EMAIL, PASSWORD, &[]).await;
    let first = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();

    let second = h
        .sessions
        .refresh(Some(&first.refresh_token), client())
        .await
        .unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_ne!(second.access_token, first.access_token);

    let mut tx = h.store.begin().await.unwrap();
    let old = tx
        .find_refresh_token_by_hash_for_update(&hash_refresh_secret(&first.refresh_token))
        .await
        .unwrap()
        .unwrap();
    let new = tx
        .find_refresh_token_by_hash_for_update(&hash_refresh_secret(&second.refresh_token))
        .await
        .unwrap()
        .unwrap();
    assert!(old.is_revoked());
    assert_eq!(old.replaced_by_token_id, Some(new.id));
    assert_eq!(old.family_id, new.family_id);
    assert!(!new.is_revoked());
}

#[tokio::test]
async fn test_refresh_picks_up_permission_changes() {
    let h = Harness::new();
    let editor = h.role("editor", &["docs:read"]).await;
    let publisher = h.role("publisher", &["docs:publish"]).await;
    let user = h.user(EMAIL, PASSWORD, &[editor]).await;
    let session = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();

    let mut tx = h.store.begin().await.unwrap();
    tx.replace_user_roles(user.id, &[editor, publisher]).await.unwrap();
    tx.commit().await.unwrap();

    let refreshed = h
        .sessions
        .refresh(Some(&session.refresh_token), client())
        .await
        .unwrap();
    assert_eq!(refreshed.scope, vec!["docs:publish", "docs:read"]);
}

#[tokio::test]
async fn test_reuse_revokes_whole_family() {
    let h = Harness::new();
    h.user(EMAIL, PASSWORD, &[]).await;
    let first = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();
    let second = h
        .sessions
        .refresh(Some(&first.refresh_token), client())
        .await
        .unwrap();

    let err = h
        .sessions
        .refresh(Some(&first.refresh_token), client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RefreshTokenReuse);
    assert!(err.kind.clears_refresh_credential());

    let mut tx = h.store.begin().await.unwrap();
    let latest = tx
        .find_refresh_token_by_hash_for_update(&hash_refresh_secret(&second.refresh_token))
        .await
        .unwrap()
        .unwrap();
    let family = tx.list_refresh_tokens_in_family(latest.family_id).await.unwrap();
    drop(tx);
    assert_eq!(family.len(), 2);
    assert!(family.iter().all(|r| r.is_revoked()));

    // The most recent secret is dead too.
    let err = h
        .sessions
        .refresh(Some(&second.refresh_token), client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RefreshTokenReuse);
}

#[tokio::test]
async fn test_reuse_leaves_other_families_alone() {
    let h = Harness::new();
    h.user(EMAIL, PASSWORD, &[]).await;
    let laptop = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();
    let phone = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();

    h.sessions
        .refresh(Some(&laptop.refresh_token), client())
        .await
        .unwrap();
    h.sessions
        .refresh(Some(&laptop.refresh_token), client())
        .await
        .unwrap_err();

    assert!(
        h.sessions
            .refresh(Some(&phone.refresh_token), client())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_refresh_input_errors() {
    let h = Harness::new();

    let err = h.sessions.refresh(None, client()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingRefreshToken);

    let err = h.sessions.refresh(Some("  "), client()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingRefreshToken);

    let err = h
        .sessions
        .refresh(Some(&generate_refresh_secret()), client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidRefreshToken);
}

#[tokio::test]
async fn test_expired_refresh_never_rotates() {
    let h = Harness::new();
    let user = h.user(EMAIL, PASSWORD, &[]).await;
    let secret = generate_refresh_secret();

    let mut tx = h.store.begin().await.unwrap();
    let record = tx
        .insert_refresh_token(&NewRefreshToken {
            user_id: user.id,
            family_id: Uuid::new_v4(),
            token_hash: hash_refresh_secret(&secret),
            expires_at: Utc::now() - Duration::minutes(1),
            client: ClientMeta::default(),
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();

    for _ in 0..2 {
        let err = h.sessions.refresh(Some(&secret), client()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RefreshTokenExpired);
    }

    let mut tx = h.store.begin().await.unwrap();
    let family = tx.list_refresh_tokens_in_family(record.family_id).await.unwrap();
    assert_eq!(family.len(), 1);
    assert!(!family[0].is_revoked());
}

#[tokio::test]
async fn test_logout_then_refresh_is_reuse() {
    let h = Harness::new();
    let editor = h.role("editor", &["docs:read"]).await;
    h.user(EMAIL, PASSWORD, &[editor]).await;
    let session = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();
    assert_eq!(session.scope, vec!["docs:read"]);

    h.sessions.logout(Some(&session.refresh_token)).await.unwrap();

    let err = h
        .sessions
        .refresh(Some(&session.refresh_token), client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RefreshTokenReuse);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = Harness::new();
    h.user(EMAIL, PASSWORD, &[]).await;
    let session = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();

    h.sessions.logout(None).await.unwrap();
    h.sessions.logout(Some("")).await.unwrap();
    h.sessions.logout(Some(&session.refresh_token)).await.unwrap();
    h.sessions.logout(Some(&session.refresh_token)).await.unwrap();
    h.sessions
        .logout(Some(&generate_refresh_secret()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_refresh_for_disabled_user_revokes_family() {
    let h = Harness::new();
    let user = h.user(EMAIL, PASSWORD, &[]).await;
    let session = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();
    h.set_status(user.id, UserStatus::Disabled).await;

    let err = h
        .sessions
        .refresh(Some(&session.refresh_token), client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserNotActive);

    h.set_status(user.id, UserStatus::Active).await;
    let err = h
        .sessions
        .refresh(Some(&session.refresh_token), client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RefreshTokenReuse);
}

#[tokio::test]
async fn test_me_reflects_current_state() {
    let h = Harness::new();
    let editor = h.role("editor", &["docs:read"]).await;
    let user = h.user(EMAIL, PASSWORD, &[editor]).await;

    let profile = h.sessions.me(user.id).await.unwrap();
    assert_eq!(profile.user.email, EMAIL);
    assert_eq!(profile.roles[0].name, "editor");
    assert!(!profile.is_owner());

    h.set_status(user.id, UserStatus::Deleted).await;
    let err = h.sessions.me(user.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserNotFound);
}

#[tokio::test]
async fn test_access_token_outlives_deleted_user() {
    let h = Harness::new();
    let user = h.user(EMAIL, PASSWORD, &[]).await;
    let session = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();
    h.set_status(user.id, UserStatus::Deleted).await;

    let claims = h.decoder.parse_access_token(&session.access_token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(
        h.sessions.me(claims.user_id()).await.unwrap_err().kind,
        ErrorKind::UserNotFound
    );
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_refresh_leaves_nothing_behind() {
    let h = Harness::new();
    h.user(EMAIL, PASSWORD, &[]).await;
    let session = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();

    let stalled = h.sessions_over(Arc::new(StallingStore::new(h.store.clone())));
    let err = stalled
        .refresh(Some(&session.refresh_token), client())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreUnavailable);
    assert!(!err.kind.clears_refresh_credential());

    let mut tx = h.store.begin().await.unwrap();
    let presented = tx
        .find_refresh_token_by_hash_for_update(&hash_refresh_secret(&session.refresh_token))
        .await
        .unwrap()
        .unwrap();
    assert!(!presented.is_revoked());
    let family = tx
        .list_refresh_tokens_in_family(presented.family_id)
        .await
        .unwrap();
    drop(tx);
    assert_eq!(family.len(), 1);

    // The client retries with the same, still active, secret.
    assert!(
        h.sessions
            .refresh(Some(&session.refresh_token), client())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_concurrent_refresh_with_same_secret() {
    let h = Harness::new();
    h.user(EMAIL, PASSWORD, &[]).await;
    let session = h.sessions.login(EMAIL, PASSWORD, client()).await.unwrap();
    let secret = session.refresh_token.as_str();

    let (a, b) = tokio::join!(
        h.sessions.refresh(Some(secret), client()),
        h.sessions.refresh(Some(secret), client()),
    );

    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let err = a.err().or(b.err()).unwrap();
    assert_eq!(err.kind, ErrorKind::RefreshTokenReuse);

    let mut tx = h.store.begin().await.unwrap();
    let presented = tx
        .find_refresh_token_by_hash_for_update(&hash_refresh_secret(secret))
        .await
        .unwrap()
        .unwrap();
    let family = tx
        .list_refresh_tokens_in_family(presented.family_id)
        .await
        .unwrap();
    assert_eq!(family.len(), 2);
    assert!(family.iter().all(|r| r.is_revoked()));
}
