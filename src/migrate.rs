use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = apply(&pool).await;
    pool.close().await;
    result
}

/// Create the version store schema. Idempotent.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // The UNIQUE index is the store's uniqueness key: the store never holds
    // two records for the same (subject, artifact, version).
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS versions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject TEXT NOT NULL,
            artifact TEXT NOT NULL,
            version TEXT NOT NULL,
            schema_url TEXT NOT NULL,
            commit_hash TEXT NOT NULL,
            commit_date TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(subject, artifact, version)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_versions_artifact ON versions(artifact)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_versions_pair ON versions(subject, artifact, commit_date DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
