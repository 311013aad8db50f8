//! Report queries

use crate::db::models::Report;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

const REPORT_COLUMNS: &str =
    "guid, reason, resolved, reporter_id, review_id, resolved_by, resolved_at, created_at";

fn row_to_report(row: &SqliteRow) -> sqlx::Result<Report> {
    Ok(Report {
        id: row.try_get("guid")?,
        reason: row.try_get("reason")?,
        resolved: row.try_get("resolved")?,
        reporter_id: row.try_get("reporter_id")?,
        review_id: row.try_get("review_id")?,
        resolved_by: row.try_get("resolved_by")?,
        resolved_at: row.try_get("resolved_at")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn insert_report(
    conn: &mut SqliteConnection,
    reporter_id: &str,
    review_id: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<Report> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO reports (guid, reason, resolved, reporter_id, review_id, created_at)
        VALUES (?, ?, 0, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(reason)
    .bind(reporter_id)
    .bind(review_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(Report {
        id,
        reason: reason.to_string(),
        resolved: false,
        reporter_id: reporter_id.to_string(),
        review_id: review_id.to_string(),
        resolved_by: None,
        resolved_at: None,
        created_at: now,
    })
}

pub async fn find_report(conn: &mut SqliteConnection, id: &str) -> Result<Option<Report>> {
    let sql = format!("SELECT {} FROM reports WHERE guid = ?", REPORT_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    Ok(row.as_ref().map(row_to_report).transpose()?)
}

/// Mark one report resolved by `resolver_id`
pub async fn mark_resolved(
    conn: &mut SqliteConnection,
    id: &str,
    resolver_id: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE reports SET resolved = 1, resolved_by = ?, resolved_at = ? WHERE guid = ?",
    )
    .bind(resolver_id)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Resolve every open report pointing at a review; returns how many changed
pub async fn resolve_all_for_review(
    conn: &mut SqliteConnection,
    review_id: &str,
    resolver_id: &str,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE reports SET resolved = 1, resolved_by = ?, resolved_at = ?
         WHERE review_id = ? AND resolved = 0",
    )
    .bind(resolver_id)
    .bind(now)
    .bind(review_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_open(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE resolved = 0")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Open reports, oldest first
pub async fn list_open(conn: &mut SqliteConnection, limit: i64, offset: i64) -> Result<Vec<Report>> {
    let sql = format!(
        "SELECT {} FROM reports WHERE resolved = 0 ORDER BY created_at ASC LIMIT ? OFFSET ?",
        REPORT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter()
        .map(row_to_report)
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(Into::into)
}
