//! User account queries

use crate::db::models::{Role, User};
use crate::error::Error;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

const USER_COLUMNS: &str =
    "guid, name, email, linkedin_url, role, terms_accepted_at, created_at";

/// Fields for a new account; `email` must already be lower-cased
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub linkedin_url: Option<&'a str>,
    pub role: Role,
    pub terms_accepted_at: Option<DateTime<Utc>>,
}

fn row_to_user(row: &SqliteRow) -> sqlx::Result<User> {
    Ok(User {
        id: row.try_get("guid")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        linkedin_url: row.try_get("linkedin_url")?,
        role: Role::from_db(&row.try_get::<String, _>("role")?),
        terms_accepted_at: row.try_get("terms_accepted_at")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a user; a taken email surfaces as `StoreConflict`
pub async fn insert_user(
    conn: &mut SqliteConnection,
    new_user: &NewUser<'_>,
    now: DateTime<Utc>,
) -> Result<User> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO users (guid, name, email, password_hash, linkedin_url, role,
                           terms_accepted_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new_user.name)
    .bind(new_user.email)
    .bind(new_user.password_hash)
    .bind(new_user.linkedin_url)
    .bind(new_user.role.as_str())
    .bind(new_user.terms_accepted_at)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| Error::from_write(e, "An account with this email"))?;

    Ok(User {
        id,
        name: new_user.name.to_string(),
        email: new_user.email.to_string(),
        linkedin_url: new_user.linkedin_url.map(str::to_string),
        role: new_user.role,
        terms_accepted_at: new_user.terms_accepted_at,
        created_at: now,
    })
}

pub async fn find_user_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE guid = ?", USER_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    Ok(row.as_ref().map(row_to_user).transpose()?)
}

/// User plus stored password hash, for login only
pub async fn find_credentials_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<(User, String)>> {
    let sql = format!(
        "SELECT {}, password_hash FROM users WHERE email = ?",
        USER_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(email.trim().to_lowercase())
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let user = row_to_user(&row)?;
            let hash: String = row.try_get("password_hash")?;
            Ok(Some((user, hash)))
        }
        None => Ok(None),
    }
}

pub async fn email_exists(conn: &mut SqliteConnection, email: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(email.trim().to_lowercase())
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

/// Change the role of the account with `email`; false if no such account
pub async fn set_role_by_email(
    conn: &mut SqliteConnection,
    email: &str,
    role: Role,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE email = ?")
        .bind(role.as_str())
        .bind(now)
        .bind(email.trim().to_lowercase())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::open_in_memory;

    fn jane(email: &str) -> NewUser<'_> {
        NewUser {
            name: "Jane",
            email,
            password_hash: "hash",
            linkedin_url: Some("https://www.linkedin.com/in/jane/"),
            role: Role::User,
            terms_accepted_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let pool = open_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let user = insert_user(&mut conn, &jane("jane@example.com"), Utc::now())
            .await
            .unwrap();
        let found = find_user_by_id(&mut conn, &user.id).await.unwrap().unwrap();
        assert_eq!(found.email, "jane@example.com");
        assert_eq!(found.role, Role::User);

        let (creds_user, hash) = find_credentials_by_email(&mut conn, " JANE@example.com ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(creds_user.id, user.id);
        assert_eq!(hash, "hash");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_store_conflict() {
        let pool = open_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        insert_user(&mut conn, &jane("jane@example.com"), Utc::now())
            .await
            .unwrap();
        let err = insert_user(&mut conn, &jane("jane@example.com"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreConflict(_)));
    }

    #[tokio::test]
    async fn test_set_role() {
        let pool = open_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let user = insert_user(&mut conn, &jane("jane@example.com"), Utc::now())
            .await
            .unwrap();
        assert!(set_role_by_email(&mut conn, "jane@example.com", Role::Admin, Utc::now())
            .await
            .unwrap());
        assert!(!set_role_by_email(&mut conn, "nobody@example.com", Role::Admin, Utc::now())
            .await
            .unwrap());

        let found = find_user_by_id(&mut conn, &user.id).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
    }
}
