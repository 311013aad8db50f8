//! Database schema migrations
//!
//! Versioned, idempotent steps applied after the baseline `CREATE TABLE IF NOT
//! EXISTS` pass. Never edit a released migration; add a new one and bump
//! [`CURRENT_SCHEMA_VERSION`].

use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// Highest applied version, 0 for a fresh database
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Apply every migration newer than the recorded schema version
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = get_schema_version(pool).await?;

    if current >= CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    if current < 1 {
        // v1 is the baseline schema from db::init
        set_schema_version(pool, 1).await?;
    }

    if current < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    info!(
        "Database schema migrated from v{} to v{}",
        current, CURRENT_SCHEMA_VERSION
    );
    Ok(())
}

/// v2: indexes for the author's review list and the admin report queue
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_author ON reviews(author_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_open ON reports(resolved, created_at)")
        .execute(pool)
        .await?;
    info!("Migration v2: added review author and open report indexes");
    Ok(())
}
