//! Registration, login and account lookups

use crate::api::auth::{self, Session};
use crate::api::types::{LoginResponse, Registration};
use crate::db::models::{Role, User};
use crate::db::users::{self, NewUser};
use crate::validation::validate_registration;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

const BAD_CREDENTIALS: &str = "Invalid email or password.";

/// Create a USER account from a registration form
pub async fn register_user(
    db: &SqlitePool,
    input: &Registration,
    bcrypt_cost: u32,
    now: DateTime<Utc>,
) -> Result<User> {
    let valid = validate_registration(input)?;

    let mut conn = db.acquire().await?;
    if users::email_exists(&mut conn, &valid.email).await? {
        return Err(Error::ValidationFailed(
            "Email already in use. Please use a different email or login.".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&valid.password, bcrypt_cost).await?;
    let user = users::insert_user(
        &mut conn,
        &NewUser {
            name: &valid.name,
            email: &valid.email,
            password_hash: &password_hash,
            linkedin_url: Some(&valid.linkedin_url),
            role: Role::User,
            terms_accepted_at: Some(now),
        },
        now,
    )
    .await?;

    info!("Registered user {}", user.id);
    Ok(user)
}

/// Check credentials and open a session
pub async fn login(
    db: &SqlitePool,
    email: &str,
    password: &str,
    ttl_seconds: i64,
    now: DateTime<Utc>,
) -> Result<LoginResponse> {
    let email = email.trim().to_lowercase();
    let mut conn = db.acquire().await?;

    let Some((user, password_hash)) = users::find_credentials_by_email(&mut conn, &email).await?
    else {
        return Err(Error::Unauthorized(BAD_CREDENTIALS.to_string()));
    };
    drop(conn);

    if !auth::verify_password(password, &password_hash).await? {
        warn!("Failed login for user {}", user.id);
        return Err(Error::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let (token, expires_at) = auth::create_session(db, &user.id, ttl_seconds, now).await?;

    info!("User {} logged in", user.id);
    Ok(LoginResponse {
        token,
        user_id: user.id,
        role: user.role,
        expires_at,
    })
}

/// End the session behind `token`; unknown tokens are not an error
pub async fn logout(db: &SqlitePool, token: &str) -> Result<()> {
    if auth::revoke_session(db, token).await? {
        info!("Session revoked");
    }
    Ok(())
}

/// The stored LinkedIn URL of `user_id`, readable only by that user
pub async fn linkedin_url_for(
    db: &SqlitePool,
    session: Option<&Session>,
    user_id: &str,
) -> Result<Option<String>> {
    let session = Session::require_user(session, "Unauthorized")?;
    if session.user_id != user_id {
        return Err(Error::Unauthorized("Unauthorized".to_string()));
    }

    let mut conn = db.acquire().await?;
    let user = users::find_user_by_id(&mut conn, user_id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
    Ok(user.linkedin_url)
}

/// Give an existing account the ADMIN role
pub async fn promote_admin(db: &SqlitePool, email: &str, now: DateTime<Utc>) -> Result<()> {
    let email = email.trim().to_lowercase();
    let mut conn = db.acquire().await?;
    if !users::set_role_by_email(&mut conn, &email, Role::Admin, now).await? {
        return Err(Error::NotFound(format!("No user with email {}", email)));
    }
    info!("Granted ADMIN role to {}", email);
    Ok(())
}
