//! Person queries
//!
//! `people.linkedin_url` only ever holds canonical URLs produced by
//! `linkedin::normalize_linkedin_url`.

use crate::db::models::Person;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

const PERSON_COLUMNS: &str = "guid, linkedin_url, name, title, created_at, updated_at";

fn row_to_person(row: &SqliteRow) -> sqlx::Result<Person> {
    Ok(Person {
        id: row.try_get("guid")?,
        linkedin_url: row.try_get("linkedin_url")?,
        name: row.try_get("name")?,
        title: row.try_get("title")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Find or create the person for a canonical URL, backfilling a missing name/title
///
/// The insert is `ON CONFLICT DO NOTHING`, so two concurrent submissions for
/// the same new person both end up reading the single row that won.
/// Populated name/title are never overwritten.
pub async fn upsert_person(
    conn: &mut SqliteConnection,
    canonical_url: &str,
    name: Option<&str>,
    title: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Person> {
    sqlx::query(
        r#"
        INSERT INTO people (guid, linkedin_url, name, title, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(linkedin_url) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(canonical_url)
    .bind(name)
    .bind(title)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        UPDATE people
        SET name = COALESCE(name, ?1),
            title = COALESCE(title, ?2),
            updated_at = ?3
        WHERE linkedin_url = ?4
          AND ((name IS NULL AND ?1 IS NOT NULL) OR (title IS NULL AND ?2 IS NOT NULL))
        "#,
    )
    .bind(name)
    .bind(title)
    .bind(now)
    .bind(canonical_url)
    .execute(&mut *conn)
    .await?;

    let sql = format!("SELECT {} FROM people WHERE linkedin_url = ?", PERSON_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(canonical_url)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row_to_person(&row)?)
}

pub async fn find_person_by_url(
    conn: &mut SqliteConnection,
    linkedin_url: &str,
) -> Result<Option<Person>> {
    let sql = format!("SELECT {} FROM people WHERE linkedin_url = ?", PERSON_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(linkedin_url)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.as_ref().map(row_to_person).transpose()?)
}

pub async fn find_person_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<Person>> {
    let sql = format!("SELECT {} FROM people WHERE guid = ?", PERSON_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    Ok(row.as_ref().map(row_to_person).transpose()?)
}

/// Case-insensitive substring match on name or title
pub async fn search_people(
    conn: &mut SqliteConnection,
    query: &str,
    limit: i64,
) -> Result<Vec<Person>> {
    let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
    let sql = format!(
        "SELECT {} FROM people
         WHERE LOWER(COALESCE(name, '')) LIKE ?1 ESCAPE '\\'
            OR LOWER(COALESCE(title, '')) LIKE ?1 ESCAPE '\\'
         ORDER BY name ASC
         LIMIT ?2",
        PERSON_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter()
        .map(row_to_person)
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(Into::into)
}

/// Ratings of approved reviews about a person
pub async fn approved_ratings(conn: &mut SqliteConnection, person_id: &str) -> Result<Vec<i64>> {
    let ratings: Vec<i64> = sqlx::query_scalar(
        "SELECT rating FROM reviews WHERE person_id = ? AND is_approved = 1",
    )
    .bind(person_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ratings)
}

/// People with at least one approved review, each with its approved ratings
pub async fn people_with_approved_ratings(
    conn: &mut SqliteConnection,
) -> Result<Vec<(Person, Vec<i64>)>> {
    let rows = sqlx::query(
        r#"
        SELECT p.guid, p.linkedin_url, p.name, p.title, p.created_at, p.updated_at, r.rating
        FROM people p
        JOIN reviews r ON r.person_id = p.guid
        WHERE r.is_approved = 1
        ORDER BY p.guid
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: Vec<(Person, Vec<i64>)> = Vec::new();
    for row in &rows {
        let rating: i64 = row.try_get("rating")?;
        let id: String = row.try_get("guid")?;
        match grouped.last_mut() {
            Some((person, ratings)) if person.id == id => ratings.push(rating),
            _ => grouped.push((row_to_person(row)?, vec![rating])),
        }
    }
    Ok(grouped)
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
