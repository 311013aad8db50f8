//! Session authentication
//!
//! Login issues a random bearer token. Only its SHA-256 digest is stored in
//! the `sessions` table, so a leaked database cannot be replayed as a login.
//! Passwords are stored as bcrypt hashes.
//!
//! Every core operation receives the resolved [`Session`] explicitly; nothing
//! reads "the current user" from ambient state.

use crate::db::Role;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{debug, warn};

/// Authenticated identity passed into core operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Any logged-in user, with the message shown when nobody is
    pub fn require_user<'a>(session: Option<&'a Session>, message: &str) -> Result<&'a Session> {
        session.ok_or_else(|| Error::Unauthorized(message.to_string()))
    }

    /// Logged-in user with the ADMIN role
    pub fn require_admin(session: Option<&Session>) -> Result<&Session> {
        match session {
            Some(s) if s.is_admin() => Ok(s),
            _ => Err(Error::Unauthorized("Unauthorized access.".to_string())),
        }
    }
}

// ========================================
// Passwords
// ========================================

/// bcrypt hash of `password` at `cost` (4..=31), computed off the async runtime
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// False for a wrong password or a malformed stored hash
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let verified = tokio::task::spawn_blocking({
        let password = password.to_string();
        let hash = hash.to_string();
        move || bcrypt::verify(password, &hash)
    })
    .await
    .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?;

    match verified {
        Ok(valid) => Ok(valid),
        Err(e) => {
            warn!("Stored password hash could not be verified: {}", e);
            Ok(false)
        }
    }
}

// ========================================
// Tokens
// ========================================

const TOKEN_LENGTH: usize = 64;

/// 64 random alphanumeric characters
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// SHA-256 of the token as 64 hex characters
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

// ========================================
// Session Storage
// ========================================

/// Store a new session for `user_id` and return the plaintext token
pub async fn create_session(
    db: &SqlitePool,
    user_id: &str,
    ttl_seconds: i64,
    now: DateTime<Utc>,
) -> Result<(String, DateTime<Utc>)> {
    let token = generate_token();
    let expires_at = now + Duration::seconds(ttl_seconds);

    sqlx::query(
        "INSERT INTO sessions (token_hash, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(hash_token(&token))
    .bind(user_id)
    .bind(expires_at)
    .bind(now)
    .execute(db)
    .await?;

    debug!("Created session for user {}", user_id);
    Ok((token, expires_at))
}

/// Resolve a bearer token; unknown or expired tokens yield `None`
pub async fn resolve_session(
    db: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<Session>> {
    let row: Option<(String, String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT s.user_id, u.role, s.expires_at
         FROM sessions s
         JOIN users u ON u.guid = s.user_id
         WHERE s.token_hash = ?",
    )
    .bind(hash_token(token))
    .fetch_optional(db)
    .await?;

    Ok(match row {
        Some((user_id, role, expires_at)) if expires_at > now => Some(Session {
            user_id,
            role: Role::from_db(&role),
        }),
        Some(_) => {
            debug!("Rejected expired session token");
            None
        }
        None => None,
    })
}

/// Delete the session for `token`; returns whether one existed
pub async fn revoke_session(db: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove sessions that expired before `now`
pub async fn purge_expired_sessions(db: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
