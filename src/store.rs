//! Version store reads and the idempotent writer.
//!
//! The store is a document-style collection over SQLite: records keyed by
//! (subject, artifact, version), informational fields alongside. Writers
//! insert each record at most once; readers serve the query surface. Every
//! record written is visible to subsequent reads as soon as the insert
//! returns.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::models::VersionRecord;

/// Whether a record with this uniqueness key is already stored.
pub async fn exists(
    pool: &SqlitePool,
    subject: &str,
    artifact: &str,
    version: &str,
) -> Result<bool> {
    let found: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM versions WHERE subject = ? AND artifact = ? AND version = ?",
    )
    .bind(subject)
    .bind(artifact)
    .bind(version)
    .fetch_one(pool)
    .await?;

    Ok(found)
}

/// Insert every candidate record not already present, returning the count
/// actually inserted.
///
/// Running the same batch twice inserts nothing the second time. A failure
/// inserting one record is logged and skipped; it never aborts the rest of
/// the batch. When two candidates share a key, the first one wins and the
/// rest are skipped by the existence check.
pub async fn insert_new(pool: &SqlitePool, records: &[VersionRecord]) -> Result<u64> {
    let mut inserted = 0u64;

    for record in records {
        if exists(pool, &record.subject, &record.artifact, &record.version).await? {
            continue;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO versions (subject, artifact, version, schema_url, commit_hash, commit_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.subject)
        .bind(&record.artifact)
        .bind(&record.version)
        .bind(&record.schema_url)
        .bind(&record.commit_hash)
        .bind(record.commit_date.to_rfc3339())
        .bind(Utc::now().timestamp())
        .execute(pool)
        .await;

        match result {
            Ok(_) => inserted += 1,
            Err(e) => warn!(
                subject = %record.subject,
                artifact = %record.artifact,
                version = %record.version,
                error = %e,
                "insert failed, skipping record"
            ),
        }
    }

    Ok(inserted)
}

/// The most recently observed record for a pair, by commit date (insertion
/// order breaks ties). This is the store's notion of "current version".
pub async fn find_latest(
    pool: &SqlitePool,
    subject: &str,
    artifact: &str,
) -> Result<Option<VersionRecord>> {
    let row = sqlx::query(
        r#"
        SELECT subject, artifact, version, schema_url, commit_hash, commit_date
        FROM versions
        WHERE subject = ? AND artifact = ?
        ORDER BY commit_date DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(subject)
    .bind(artifact)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_record).transpose()
}

/// All stored version tokens for an artifact, in insertion order.
pub async fn list_versions(pool: &SqlitePool, artifact: &str) -> Result<Vec<String>> {
    let versions = sqlx::query_scalar(
        "SELECT version FROM versions WHERE artifact = ? ORDER BY id ASC",
    )
    .bind(artifact)
    .fetch_all(pool)
    .await?;

    Ok(versions)
}

/// The stored record for an artifact at a specific version, if any.
pub async fn find_version(
    pool: &SqlitePool,
    artifact: &str,
    version: &str,
) -> Result<Option<VersionRecord>> {
    let row = sqlx::query(
        r#"
        SELECT subject, artifact, version, schema_url, commit_hash, commit_date
        FROM versions
        WHERE artifact = ? AND version = ?
        ORDER BY id ASC
        LIMIT 1
        "#,
    )
    .bind(artifact)
    .bind(version)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_record).transpose()
}

fn row_to_record(row: sqlx::sqlite::SqliteRow) -> Result<VersionRecord> {
    let commit_date: String = row.get("commit_date");
    let commit_date = DateTime::parse_from_rfc3339(&commit_date)?.with_timezone(&Utc);

    Ok(VersionRecord {
        subject: row.get("subject"),
        artifact: row.get("artifact"),
        version: row.get("version"),
        schema_url: row.get("schema_url"),
        commit_hash: row.get("commit_hash"),
        commit_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use chrono::TimeZone;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate::apply(&pool).await.unwrap();
        pool
    }

    fn record(version: &str, sha: &str, date_offset: i64) -> VersionRecord {
        VersionRecord {
            subject: "Weather".to_string(),
            artifact: "WeatherObserved".to_string(),
            version: version.to_string(),
            schema_url: format!("fake://raw/{}", sha),
            commit_hash: sha.to_string(),
            commit_date: Utc.timestamp_opt(1_700_000_000 + date_offset, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_counts_and_is_idempotent() {
        let pool = memory_pool().await;
        let batch = vec![record("1.0", "c3", 0), record("2.0", "c2", 100)];

        assert_eq!(insert_new(&pool, &batch).await.unwrap(), 2);
        assert_eq!(insert_new(&pool, &batch).await.unwrap(), 0);

        let versions = list_versions(&pool, "WeatherObserved").await.unwrap();
        assert_eq!(versions, vec!["1.0", "2.0"]);
        pool.close().await;
    }

    #[tokio::test]
    async fn duplicate_key_keeps_first_record() {
        let pool = memory_pool().await;
        let first = record("1.0", "aaa", 0);
        let second = record("1.0", "bbb", 50);

        assert_eq!(insert_new(&pool, &[first, second]).await.unwrap(), 1);

        let stored = find_version(&pool, "WeatherObserved", "1.0")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.commit_hash, "aaa");
        pool.close().await;
    }

    #[tokio::test]
    async fn find_latest_orders_by_commit_date() {
        let pool = memory_pool().await;
        // Backfill emits newest transitions first; the newest commit date
        // must win regardless of insertion order.
        let batch = vec![record("2.0", "c1", 500), record("1.5", "c2", 200)];
        insert_new(&pool, &batch).await.unwrap();

        let latest = find_latest(&pool, "Weather", "WeatherObserved")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.version, "2.0");
        pool.close().await;
    }

    #[tokio::test]
    async fn missing_pair_has_no_latest() {
        let pool = memory_pool().await;
        let latest = find_latest(&pool, "Energy", "Battery").await.unwrap();
        assert!(latest.is_none());
        pool.close().await;
    }

    #[tokio::test]
    async fn exists_matches_full_key_only() {
        let pool = memory_pool().await;
        insert_new(&pool, &[record("1.0", "c1", 0)]).await.unwrap();

        assert!(exists(&pool, "Weather", "WeatherObserved", "1.0")
            .await
            .unwrap());
        assert!(!exists(&pool, "Weather", "WeatherObserved", "2.0")
            .await
            .unwrap());
        assert!(!exists(&pool, "Energy", "WeatherObserved", "1.0")
            .await
            .unwrap());
        pool.close().await;
    }
}
