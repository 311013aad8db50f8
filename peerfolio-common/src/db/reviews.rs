//! Review queries
//!
//! The UNIQUE(author_id, person_id) constraint backs the one-review-per-pair
//! rule; a lost race surfaces from [`insert_review`] as `StoreConflict`.

use crate::db::models::{Relationship, Review};
use crate::db::tags::tags_for_review;
use crate::error::Error;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

const REVIEW_COLUMNS: &str = "r.guid, r.rating, r.content, r.relationship, r.is_anonymous, \
     r.is_approved, r.interaction_date, r.author_id, r.person_id, r.created_at, r.updated_at";

/// Author-editable review fields
#[derive(Debug, Clone)]
pub struct ReviewFields<'a> {
    pub rating: i64,
    pub content: &'a str,
    pub relationship: Relationship,
    pub is_anonymous: bool,
    pub interaction_date: DateTime<Utc>,
}

/// Review row without tags; callers attach them with [`with_tags`]
fn row_to_review(row: &SqliteRow) -> sqlx::Result<Review> {
    let relationship: String = row.try_get("relationship")?;
    Ok(Review {
        id: row.try_get("guid")?,
        rating: row.try_get("rating")?,
        content: row.try_get("content")?,
        // CHECK constraint keeps this in range
        relationship: Relationship::from_str(&relationship).unwrap_or(Relationship::Other),
        is_anonymous: row.try_get("is_anonymous")?,
        is_approved: row.try_get("is_approved")?,
        interaction_date: row.try_get("interaction_date")?,
        author_id: row.try_get("author_id")?,
        person_id: row.try_get("person_id")?,
        tags: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn with_tags(conn: &mut SqliteConnection, mut review: Review) -> Result<Review> {
    review.tags = tags_for_review(conn, &review.id).await?;
    Ok(review)
}

/// Insert a review row and return its id
pub async fn insert_review(
    conn: &mut SqliteConnection,
    author_id: &str,
    person_id: &str,
    fields: &ReviewFields<'_>,
    is_approved: bool,
    now: DateTime<Utc>,
) -> Result<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO reviews (guid, rating, content, relationship, is_anonymous, is_approved,
                             interaction_date, author_id, person_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(fields.rating)
    .bind(fields.content)
    .bind(fields.relationship.as_str())
    .bind(fields.is_anonymous)
    .bind(is_approved)
    .bind(fields.interaction_date)
    .bind(author_id)
    .bind(person_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| Error::from_write(e, "A review for this person by this author"))?;

    Ok(id)
}

pub async fn find_review(conn: &mut SqliteConnection, id: &str) -> Result<Option<Review>> {
    let sql = format!("SELECT {} FROM reviews r WHERE r.guid = ?", REVIEW_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => Ok(Some(with_tags(conn, row_to_review(&row)?).await?)),
        None => Ok(None),
    }
}

/// Id of the author's review of a person, if any
pub async fn find_review_id_by_pair(
    conn: &mut SqliteConnection,
    author_id: &str,
    person_id: &str,
) -> Result<Option<String>> {
    let id: Option<String> =
        sqlx::query_scalar("SELECT guid FROM reviews WHERE author_id = ? AND person_id = ?")
            .bind(author_id)
            .bind(person_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(id)
}

/// Overwrite the author-editable fields; the subject is never touched
pub async fn update_review(
    conn: &mut SqliteConnection,
    id: &str,
    fields: &ReviewFields<'_>,
    is_approved: bool,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE reviews
        SET rating = ?, content = ?, relationship = ?, is_anonymous = ?,
            interaction_date = ?, is_approved = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(fields.rating)
    .bind(fields.content)
    .bind(fields.relationship.as_str())
    .bind(fields.is_anonymous)
    .bind(fields.interaction_date)
    .bind(is_approved)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_approved(
    conn: &mut SqliteConnection,
    id: &str,
    approved: bool,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query("UPDATE reviews SET is_approved = ?, updated_at = ? WHERE guid = ?")
        .bind(approved)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Hard delete; tag links go with it via ON DELETE CASCADE
pub async fn delete_review(conn: &mut SqliteConnection, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reviews WHERE guid = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Approved reviews about a person with the author's display name, newest first
pub async fn list_approved_for_person(
    conn: &mut SqliteConnection,
    person_id: &str,
) -> Result<Vec<(Review, String)>> {
    let sql = format!(
        "SELECT {}, u.name AS author_name
         FROM reviews r
         JOIN users u ON u.guid = r.author_id
         WHERE r.person_id = ? AND r.is_approved = 1
         ORDER BY r.created_at DESC",
        REVIEW_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(person_id).fetch_all(&mut *conn).await?;

    let mut reviews = Vec::with_capacity(rows.len());
    for row in &rows {
        let author_name: String = row.try_get("author_name")?;
        let review = with_tags(&mut *conn, row_to_review(row)?).await?;
        reviews.push((review, author_name));
    }
    Ok(reviews)
}

/// Every review written by an author, any approval state, newest first
pub async fn list_by_author(conn: &mut SqliteConnection, author_id: &str) -> Result<Vec<Review>> {
    let sql = format!(
        "SELECT {} FROM reviews r WHERE r.author_id = ? ORDER BY r.created_at DESC",
        REVIEW_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(author_id).fetch_all(&mut *conn).await?;

    let mut reviews = Vec::with_capacity(rows.len());
    for row in &rows {
        reviews.push(with_tags(&mut *conn, row_to_review(row)?).await?);
    }
    Ok(reviews)
}

pub async fn count_pending(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE is_approved = 0")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Reviews awaiting approval, oldest first
pub async fn list_pending(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Review>> {
    let sql = format!(
        "SELECT {} FROM reviews r WHERE r.is_approved = 0
         ORDER BY r.created_at ASC LIMIT ? OFFSET ?",
        REVIEW_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

    let mut reviews = Vec::with_capacity(rows.len());
    for row in &rows {
        reviews.push(with_tags(&mut *conn, row_to_review(row)?).await?);
    }
    Ok(reviews)
}
