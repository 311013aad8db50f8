//! Registration, login and session lifecycle

use chrono::{Duration, Utc};
use peerfolio_common::accounts::{linkedin_url_for, login, logout, promote_admin, register_user};
use peerfolio_common::api::auth::{purge_expired_sessions, resolve_session};
use peerfolio_common::api::types::Registration;
use peerfolio_common::db::{open_in_memory, Role};
use peerfolio_common::Error;

// Minimum bcrypt cost keeps the tests fast
const TEST_COST: u32 = 4;

fn registration(email: &str) -> Registration {
    Registration {
        name: "Jane Doe".to_string(),
        email: email.to_string(),
        linkedin_url: "https://linkedin.com/in/Jane-Doe".to_string(),
        password: "correct horse".to_string(),
        confirm_password: "correct horse".to_string(),
        accept_terms: true,
    }
}

#[tokio::test]
async fn test_register_stores_canonical_url_and_user_role() {
    let pool = open_in_memory().await.unwrap();
    let now = Utc::now();

    let user = register_user(&pool, &registration("Jane@Example.com"), TEST_COST, now)
        .await
        .unwrap();

    assert_eq!(user.email, "jane@example.com");
    assert_eq!(
        user.linkedin_url.as_deref(),
        Some("https://www.linkedin.com/in/jane-doe/")
    );
    assert_eq!(user.role, Role::User);
    assert_eq!(user.terms_accepted_at, Some(now));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let pool = open_in_memory().await.unwrap();
    register_user(&pool, &registration("jane@example.com"), TEST_COST, Utc::now())
        .await
        .unwrap();

    let result =
        register_user(&pool, &registration("JANE@example.com"), TEST_COST, Utc::now()).await;
    match result {
        Err(Error::ValidationFailed(message)) => assert!(message.starts_with("Email already in use")),
        other => panic!("expected ValidationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_register_requires_terms() {
    let pool = open_in_memory().await.unwrap();
    let mut input = registration("jane@example.com");
    input.accept_terms = false;

    assert!(matches!(
        register_user(&pool, &input, TEST_COST, Utc::now()).await,
        Err(Error::ValidationFailed(_))
    ));
}

#[tokio::test]
async fn test_login_session_logout() {
    let pool = open_in_memory().await.unwrap();
    let user = register_user(&pool, &registration("jane@example.com"), TEST_COST, Utc::now())
        .await
        .unwrap();

    let now = Utc::now();
    let response = login(&pool, " JANE@example.com ", "correct horse", 3600, now)
        .await
        .unwrap();
    assert_eq!(response.user_id, user.id);
    assert_eq!(response.expires_at, now + Duration::seconds(3600));

    let session = resolve_session(&pool, &response.token, now).await.unwrap().unwrap();
    assert_eq!(session.user_id, user.id);
    assert_eq!(session.role, Role::User);

    logout(&pool, &response.token).await.unwrap();
    assert!(resolve_session(&pool, &response.token, now).await.unwrap().is_none());

    // Logging out twice is harmless
    logout(&pool, &response.token).await.unwrap();
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let pool = open_in_memory().await.unwrap();
    register_user(&pool, &registration("jane@example.com"), TEST_COST, Utc::now())
        .await
        .unwrap();

    assert!(matches!(
        login(&pool, "jane@example.com", "wrong password", 3600, Utc::now()).await,
        Err(Error::Unauthorized(_))
    ));
    assert!(matches!(
        login(&pool, "nobody@example.com", "correct horse", 3600, Utc::now()).await,
        Err(Error::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_expired_session_does_not_resolve() {
    let pool = open_in_memory().await.unwrap();
    register_user(&pool, &registration("jane@example.com"), TEST_COST, Utc::now())
        .await
        .unwrap();

    let now = Utc::now();
    let response = login(&pool, "jane@example.com", "correct horse", 60, now)
        .await
        .unwrap();

    let later = now + Duration::seconds(61);
    assert!(resolve_session(&pool, &response.token, later).await.unwrap().is_none());
    assert_eq!(purge_expired_sessions(&pool, later).await.unwrap(), 1);
}

#[tokio::test]
async fn test_promote_admin_changes_session_role() {
    let pool = open_in_memory().await.unwrap();
    register_user(&pool, &registration("jane@example.com"), TEST_COST, Utc::now())
        .await
        .unwrap();

    promote_admin(&pool, "Jane@Example.com", Utc::now()).await.unwrap();

    let response = login(&pool, "jane@example.com", "correct horse", 3600, Utc::now())
        .await
        .unwrap();
    assert_eq!(response.role, Role::Admin);

    assert!(matches!(
        promote_admin(&pool, "nobody@example.com", Utc::now()).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_linkedin_url_only_readable_by_owner() {
    let pool = open_in_memory().await.unwrap();
    let jane = register_user(&pool, &registration("jane@example.com"), TEST_COST, Utc::now())
        .await
        .unwrap();
    let mut other = registration("john@example.com");
    other.linkedin_url = "https://linkedin.com/in/john-roe".to_string();
    let john = register_user(&pool, &other, TEST_COST, Utc::now()).await.unwrap();

    let token = login(&pool, "jane@example.com", "correct horse", 3600, Utc::now())
        .await
        .unwrap()
        .token;
    let session = resolve_session(&pool, &token, Utc::now()).await.unwrap();

    assert_eq!(
        linkedin_url_for(&pool, session.as_ref(), &jane.id).await.unwrap(),
        Some("https://www.linkedin.com/in/jane-doe/".to_string())
    );
    assert!(matches!(
        linkedin_url_for(&pool, session.as_ref(), &john.id).await,
        Err(Error::Unauthorized(_))
    ));
    assert!(matches!(
        linkedin_url_for(&pool, None, &jane.id).await,
        Err(Error::Unauthorized(_))
    ));
}
