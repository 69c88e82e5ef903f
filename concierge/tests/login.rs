//! Login flow: online, offline fallback, and the rejection rules.

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::{FRONTDESK_EMAIL, FRONTDESK_PASSWORD, jwt_token, setup};

use concierge::ConciergeConfig;
use concierge_core::{
    RoleSet, SessionToken, StaffSessionRecord, UserId, crypto,
    repositories::{
        CredentialRepository, CredentialRepositoryProvider, StaffSessionRepository,
        StaffSessionRepositoryProvider,
    },
};

#[tokio::test]
async fn test_online_login_creates_session_and_caches() {
    let (concierge, repositories, _backend) = setup(ConciergeConfig::default()).await;

    let session = concierge
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();

    assert_eq!(session.user_id, UserId::new("7"));
    assert_eq!(session.display_name, "Dana Desk");
    assert!(concierge.is_authenticated().await);
    assert!(concierge.error_message().await.is_none());

    // Credentials persisted.
    let token = repositories.credentials().token().await.unwrap();
    assert_eq!(token, Some(session.token.clone()));

    // Staff session record cached with a password verifier.
    let record = repositories
        .staff_sessions()
        .find_for_offline_auth(FRONTDESK_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert!(record.is_active);
    assert!(record.password_verifier.is_some());
    assert_ne!(
        record.password_verifier.as_deref(),
        Some(FRONTDESK_PASSWORD),
        "plaintext password must never be stored"
    );
}

#[tokio::test]
async fn test_offline_round_trip() {
    let (concierge, _repositories, backend) = setup(ConciergeConfig::default()).await;

    let original = concierge
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();
    concierge.logout().await;
    assert!(!concierge.is_authenticated().await);

    backend.set_online(false);

    let restored = concierge
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();

    assert_eq!(restored.user_id, original.user_id);
    assert_eq!(restored.roles, original.roles);
    assert!(concierge.is_authenticated().await);
}

#[tokio::test]
async fn test_wrong_password_rejected_offline_without_record_mutation() {
    let (concierge, repositories, backend) = setup(ConciergeConfig::default()).await;

    concierge
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();
    concierge.logout().await;

    let before = repositories
        .staff_sessions()
        .find_for_offline_auth(FRONTDESK_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert!(!before.is_active);

    backend.set_online(false);

    let result = concierge.login(FRONTDESK_EMAIL, "wrong").await;
    assert!(result.is_err());
    assert!(!concierge.is_authenticated().await);

    let after = repositories
        .staff_sessions()
        .find_for_offline_auth(FRONTDESK_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.is_active, before.is_active);
    assert_eq!(after.last_activity, before.last_activity);
}

#[tokio::test]
async fn test_expired_record_rejected_even_with_correct_password() {
    let (concierge, repositories, backend) = setup(ConciergeConfig::default()).await;

    concierge
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();
    concierge.logout().await;

    let mut record = repositories
        .staff_sessions()
        .find_for_offline_auth(FRONTDESK_EMAIL)
        .await
        .unwrap()
        .unwrap();
    record.expires_at = Utc::now() - ChronoDuration::hours(1);
    repositories.staff_sessions().upsert(&record).await.unwrap();

    backend.set_online(false);

    let result = concierge.login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD).await;
    assert!(result.is_err());
    assert!(!concierge.is_authenticated().await);
}

#[tokio::test]
async fn test_non_staff_roles_never_authenticate_offline() {
    let (concierge, repositories, backend) = setup(ConciergeConfig::default()).await;
    concierge.initialize().await.unwrap();

    let record = StaffSessionRecord::builder()
        .user_id(UserId::new("9"))
        .username("Casey Customer")
        .email("casey@guest.test")
        .roles(RoleSet::from(["CUSTOMER"]))
        .token(SessionToken::new(&jwt_token(None)))
        .password_verifier(Some(crypto::hash_password("p@ss")))
        .expires_at(Utc::now() + ChronoDuration::hours(24))
        .build()
        .unwrap();
    repositories.staff_sessions().upsert(&record).await.unwrap();

    backend.set_online(false);

    // Correct password, ineligible role set.
    let result = concierge.login("casey@guest.test", "p@ss").await;
    assert!(result.is_err());
    assert!(!concierge.is_authenticated().await);
}

#[tokio::test]
async fn test_failure_produces_one_consolidated_message() {
    let (concierge, _repositories, backend) = setup(ConciergeConfig::default()).await;
    backend.set_online(false);

    // No cached record at all: both online and offline attempts fail.
    let result = concierge.login("nobody@grandhotel.test", "whatever").await;
    assert!(result.is_err());

    let message = concierge.error_message().await.unwrap();
    assert!(!message.to_lowercase().contains("offline"));
    assert!(!message.contains("AND"));
    assert!(!concierge.is_authenticated().await);
}

#[tokio::test]
async fn test_verifierless_record_requires_explicit_opt_in() {
    let (concierge, repositories, backend) = setup(ConciergeConfig::default()).await;

    let record = StaffSessionRecord::builder()
        .user_id(UserId::new("7"))
        .username("Dana Desk")
        .email(FRONTDESK_EMAIL)
        .roles(RoleSet::from(["FRONTDESK"]))
        .token(SessionToken::new(&jwt_token(Some("grand-hotels"))))
        .password_verifier(None)
        .expires_at(Utc::now() + ChronoDuration::hours(24))
        .build()
        .unwrap();
    repositories.staff_sessions().upsert(&record).await.unwrap();

    backend.set_online(false);

    // Default configuration refuses email-only authentication.
    let result = concierge.login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD).await;
    assert!(result.is_err());

    // An explicitly opted-in coordinator over the same stores accepts it.
    let permissive = concierge::Concierge::with_config(
        repositories.clone(),
        backend.clone(),
        ConciergeConfig::default().with_unverified_offline_login(true),
    );
    let session = permissive
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();
    assert_eq!(session.user_id, UserId::new("7"));
}

#[tokio::test]
async fn test_login_input_validation() {
    let (concierge, _repositories, backend) = setup(ConciergeConfig::default()).await;

    assert!(concierge.login("not-an-email", "p@ss").await.is_err());
    assert!(concierge.login(FRONTDESK_EMAIL, "").await.is_err());

    // Validation failures never reach the backend.
    assert_eq!(backend.login_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_restore_session_after_restart() {
    let (concierge, repositories, backend) = setup(ConciergeConfig::default()).await;

    let session = concierge
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();

    // A new coordinator over the same stores stands in for a restarted
    // process.
    let restarted = concierge::Concierge::with_config(
        repositories.clone(),
        backend.clone(),
        ConciergeConfig::default(),
    );
    assert!(!restarted.is_authenticated().await);

    let restored = restarted.restore_session().await.unwrap().unwrap();
    assert_eq!(restored.user_id, session.user_id);
    assert!(restarted.is_authenticated().await);

    // Nothing persisted: nothing to restore.
    restarted.logout().await;
    assert!(restarted.restore_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_logout_clears_credentials_but_keeps_staff_record() {
    let (concierge, repositories, _backend) = setup(ConciergeConfig::default()).await;

    concierge
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();
    concierge.logout().await;

    assert!(repositories.credentials().token().await.unwrap().is_none());
    assert!(repositories.credentials().user().await.unwrap().is_none());

    let record = repositories
        .staff_sessions()
        .find_for_offline_auth(FRONTDESK_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert!(!record.is_active);
}
