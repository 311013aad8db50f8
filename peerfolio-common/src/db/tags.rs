//! Tag queries

use crate::db::models::Tag;
use crate::Result;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Find or create a tag by exact name
pub async fn upsert_tag(conn: &mut SqliteConnection, name: &str) -> Result<Tag> {
    sqlx::query("INSERT INTO tags (guid, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .execute(&mut *conn)
        .await?;

    let (id, name): (String, String) = sqlx::query_as("SELECT guid, name FROM tags WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(Tag { id, name })
}

/// Replace the review's tag set with `names` (not a merge)
pub async fn replace_review_tags(
    conn: &mut SqliteConnection,
    review_id: &str,
    names: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM review_tags WHERE review_id = ?")
        .bind(review_id)
        .execute(&mut *conn)
        .await?;

    for name in names {
        let tag = upsert_tag(&mut *conn, name).await?;
        sqlx::query("INSERT OR IGNORE INTO review_tags (review_id, tag_id) VALUES (?, ?)")
            .bind(review_id)
            .bind(&tag.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Tag names attached to a review, alphabetical
pub async fn tags_for_review(conn: &mut SqliteConnection, review_id: &str) -> Result<Vec<String>> {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT t.name FROM tags t
         JOIN review_tags rt ON rt.tag_id = t.guid
         WHERE rt.review_id = ?
         ORDER BY t.name",
    )
    .bind(review_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(names)
}

/// Every known tag, alphabetical
pub async fn list_tags(conn: &mut SqliteConnection) -> Result<Vec<Tag>> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT guid, name FROM tags ORDER BY name")
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(|(id, name)| Tag { id, name }).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::open_in_memory;

    #[tokio::test]
    async fn test_upsert_tag_is_unique() {
        let pool = open_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let a = upsert_tag(&mut conn, "Leadership").await.unwrap();
        let b = upsert_tag(&mut conn, "Leadership").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(list_tags(&mut conn).await.unwrap().len(), 1);
    }
}
