//! Incremental version checking.
//!
//! Where the backfill miner walks full histories, the updater looks at the
//! single newest commit per tracked pair and compares its declared version
//! against the store's latest known version for that pair. Absent or
//! different means a new record; equal means nothing to do. This is the
//! scheduled fast path that keeps the store current between backfills.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::error::FetchError;
use crate::extract::extract_version;
use crate::github::{CommitApi, GithubApi};
use crate::models::{CommitSummary, TrackedPair, VersionRecord};
use crate::store;

pub async fn run_update(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let api = match GithubApi::new(&config.github) {
        Ok(api) => api,
        Err(e) => {
            pool.close().await;
            return Err(e.into());
        }
    };

    let mut inserted = 0u64;
    for pair in &config.tracked {
        match check_pair(&api, &pool, pair).await {
            Ok(n) => inserted += n,
            Err(e) => {
                // Only store failures surface here; they are fatal.
                pool.close().await;
                return Err(e);
            }
        }
    }

    pool.close().await;

    println!("update");
    println!("  pairs checked: {}", config.tracked.len());
    println!("  inserted: {}", inserted);
    println!("ok");

    Ok(())
}

/// Check one pair's newest commit against the store; insert at most one
/// record. Fetch failures skip the pair with a warning and never abort the
/// run; store failures propagate.
pub async fn check_pair(
    api: &dyn CommitApi,
    pool: &SqlitePool,
    pair: &TrackedPair,
) -> Result<u64> {
    let live = match latest_remote_version(api, pair).await {
        Ok(live) => live,
        Err(e) => {
            warn!(
                subject = %pair.subject,
                artifact = %pair.artifact,
                error = %e,
                "remote check failed, skipping pair"
            );
            return Ok(0);
        }
    };

    let Some((commit, version)) = live else {
        return Ok(0);
    };

    let existing = store::find_latest(pool, &pair.subject, &pair.artifact).await?;
    if let Some(existing) = &existing {
        if existing.version == version {
            return Ok(0);
        }
    }

    let record = VersionRecord {
        subject: pair.subject.clone(),
        artifact: pair.artifact.clone(),
        version: version.clone(),
        schema_url: api.blob_url(pair, &commit.sha),
        commit_hash: commit.sha.clone(),
        commit_date: commit.date,
    };

    let inserted = store::insert_new(pool, std::slice::from_ref(&record)).await?;
    if inserted > 0 {
        match &existing {
            Some(prev) => info!(
                artifact = %pair.artifact,
                from = %prev.version,
                to = %version,
                "recorded version update"
            ),
            None => info!(
                artifact = %pair.artifact,
                version = %version,
                "recorded first known version"
            ),
        }
    }

    Ok(inserted)
}

/// The declared version at the pair's newest commit, if the pair has any
/// history and the newest revision declares one.
async fn latest_remote_version(
    api: &dyn CommitApi,
    pair: &TrackedPair,
) -> Result<Option<(CommitSummary, String)>, FetchError> {
    let page = api.commits_page(pair, 1).await?;
    let Some(latest) = page.into_iter().next() else {
        return Ok(None);
    };

    let content = api.schema_at_commit(pair, &latest.sha).await?;
    Ok(extract_version(&content).map(|version| (latest, version)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use sqlx::sqlite::SqlitePoolOptions;

    fn pair() -> TrackedPair {
        TrackedPair {
            subject: "Weather".to_string(),
            artifact: "WeatherObserved".to_string(),
        }
    }

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate::apply(&pool).await.unwrap();
        pool
    }

    async fn seed_version(pool: &SqlitePool, version: &str) {
        let record = VersionRecord {
            subject: "Weather".to_string(),
            artifact: "WeatherObserved".to_string(),
            version: version.to_string(),
            schema_url: "fake://raw/seed".to_string(),
            commit_hash: "seed".to_string(),
            commit_date: Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
        };
        store::insert_new(pool, &[record]).await.unwrap();
    }

    /// Fake hosting API with a single newest commit (or none, or a failure).
    struct LatestFake {
        content: Option<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl CommitApi for LatestFake {
        async fn commits_page(
            &self,
            _pair: &TrackedPair,
            page: u32,
        ) -> Result<Vec<CommitSummary>, FetchError> {
            if self.fail {
                return Err(FetchError::Status(502, "fake://commits".to_string()));
            }
            if page > 1 || self.content.is_none() {
                return Ok(Vec::new());
            }
            Ok(vec![CommitSummary {
                sha: "head".to_string(),
                date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            }])
        }

        async fn changed_files(
            &self,
            pair: &TrackedPair,
            _sha: &str,
        ) -> Result<Vec<String>, FetchError> {
            Ok(vec![format!("{}/schema.json", pair.artifact)])
        }

        async fn schema_at_commit(
            &self,
            _pair: &TrackedPair,
            _sha: &str,
        ) -> Result<String, FetchError> {
            Ok(self.content.unwrap_or_default().to_string())
        }

        fn schema_path(&self, pair: &TrackedPair) -> String {
            format!("{}/schema.json", pair.artifact)
        }

        fn raw_url(&self, _pair: &TrackedPair, sha: &str) -> String {
            format!("fake://raw/{}", sha)
        }

        fn blob_url(&self, _pair: &TrackedPair, sha: &str) -> String {
            format!("fake://blob/{}", sha)
        }
    }

    #[tokio::test]
    async fn new_version_is_recorded() {
        let pool = memory_pool().await;
        seed_version(&pool, "1.2").await;

        let api = LatestFake {
            content: Some(r#"{"$schemaVersion": "1.3"}"#),
            fail: false,
        };
        assert_eq!(check_pair(&api, &pool, &pair()).await.unwrap(), 1);

        let latest = store::find_latest(&pool, "Weather", "WeatherObserved")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.version, "1.3");
        assert_eq!(latest.schema_url, "fake://blob/head");
        pool.close().await;
    }

    #[tokio::test]
    async fn unchanged_version_is_not_recorded() {
        let pool = memory_pool().await;
        seed_version(&pool, "1.2").await;

        let api = LatestFake {
            content: Some(r#"{"$schemaVersion": "1.2"}"#),
            fail: false,
        };
        assert_eq!(check_pair(&api, &pool, &pair()).await.unwrap(), 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn unknown_pair_records_first_version() {
        let pool = memory_pool().await;

        let api = LatestFake {
            content: Some(r#"{"$schemaVersion": "0.9"}"#),
            fail: false,
        };
        assert_eq!(check_pair(&api, &pool, &pair()).await.unwrap(), 1);

        let latest = store::find_latest(&pool, "Weather", "WeatherObserved")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.version, "0.9");
        pool.close().await;
    }

    #[tokio::test]
    async fn empty_history_records_nothing() {
        let pool = memory_pool().await;

        let api = LatestFake {
            content: None,
            fail: false,
        };
        assert_eq!(check_pair(&api, &pool, &pair()).await.unwrap(), 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn undeclared_version_records_nothing() {
        let pool = memory_pool().await;

        let api = LatestFake {
            content: Some(r#"{"title": "no version"}"#),
            fail: false,
        };
        assert_eq!(check_pair(&api, &pool, &pair()).await.unwrap(), 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn fetch_failure_skips_pair_without_error() {
        let pool = memory_pool().await;

        let api = LatestFake {
            content: None,
            fail: true,
        };
        assert_eq!(check_pair(&api, &pool, &pair()).await.unwrap(), 0);
        pool.close().await;
    }
}
