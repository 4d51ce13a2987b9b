//! Commit-history API access.
//!
//! [`CommitApi`] is the seam between the mining pipeline and the hosting
//! API; [`GithubApi`] is the production implementation over the rate-limited
//! client. Tests drive the pipeline through in-memory fakes of the same
//! trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::client::RateLimitedClient;
use crate::config::GithubConfig;
use crate::error::FetchError;
use crate::models::{CommitSummary, TrackedPair};

#[async_trait]
pub trait CommitApi: Send + Sync {
    /// One page of the commit listing for the pair's schema file, in server
    /// order (newest first). An empty page signals the end of history.
    async fn commits_page(
        &self,
        pair: &TrackedPair,
        page: u32,
    ) -> Result<Vec<CommitSummary>, FetchError>;

    /// Filenames changed in the given commit.
    async fn changed_files(&self, pair: &TrackedPair, sha: &str)
        -> Result<Vec<String>, FetchError>;

    /// Raw content of the pair's schema file as it existed at the commit.
    async fn schema_at_commit(&self, pair: &TrackedPair, sha: &str)
        -> Result<String, FetchError>;

    /// Repository-relative path of the tracked schema file.
    fn schema_path(&self, pair: &TrackedPair) -> String;

    /// Commit-pinned raw-content URL. The backfill miner records this one.
    fn raw_url(&self, pair: &TrackedPair, sha: &str) -> String;

    /// Commit-pinned web (blob) URL. The incremental updater records this one.
    fn blob_url(&self, pair: &TrackedPair, sha: &str) -> String;
}

/// Fetch the full commit history for a pair's schema file, newest first.
///
/// Pages are fetched sequentially starting at page 1 until a page comes back
/// empty. A fetch failure on any page ends pagination and returns whatever
/// was accumulated so far (possibly nothing): downstream logic only detects
/// transitions within the history it has, so a partial list is acceptable.
pub async fn fetch_commits(api: &dyn CommitApi, pair: &TrackedPair) -> Vec<CommitSummary> {
    let mut all = Vec::new();
    let mut page = 1u32;

    loop {
        match api.commits_page(pair, page).await {
            Ok(batch) if batch.is_empty() => break,
            Ok(batch) => {
                all.extend(batch);
                page += 1;
            }
            Err(e) => {
                warn!(
                    subject = %pair.subject,
                    artifact = %pair.artifact,
                    page,
                    error = %e,
                    "commit listing failed, keeping partial history"
                );
                break;
            }
        }
    }

    all
}

// ============ GitHub API response shapes ============

#[derive(Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitMeta,
}

#[derive(Deserialize)]
struct ApiCommitMeta {
    committer: ApiCommitter,
}

#[derive(Deserialize)]
struct ApiCommitter {
    date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ApiCommitDetail {
    #[serde(default)]
    files: Vec<ApiChangedFile>,
}

#[derive(Deserialize)]
struct ApiChangedFile {
    filename: String,
}

// ============ GitHub implementation ============

pub struct GithubApi {
    client: RateLimitedClient,
    config: GithubConfig,
}

impl GithubApi {
    pub fn new(config: &GithubConfig) -> Result<Self, FetchError> {
        let client = RateLimitedClient::new(config.timeout_secs, config.token())?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl CommitApi for GithubApi {
    async fn commits_page(
        &self,
        pair: &TrackedPair,
        page: u32,
    ) -> Result<Vec<CommitSummary>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/commits?path={}&page={}",
            self.config.api_base,
            self.config.org,
            self.config.repo_name(&pair.subject),
            self.config.schema_path(&pair.artifact),
            page
        );
        let body = self.client.get_api(&url).await?;
        let commits: Vec<ApiCommit> = serde_json::from_str(&body)?;
        Ok(commits
            .into_iter()
            .map(|c| CommitSummary {
                sha: c.sha,
                date: c.commit.committer.date,
            })
            .collect())
    }

    async fn changed_files(
        &self,
        pair: &TrackedPair,
        sha: &str,
    ) -> Result<Vec<String>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.config.api_base,
            self.config.org,
            self.config.repo_name(&pair.subject),
            sha
        );
        let body = self.client.get_api(&url).await?;
        let detail: ApiCommitDetail = serde_json::from_str(&body)?;
        Ok(detail.files.into_iter().map(|f| f.filename).collect())
    }

    async fn schema_at_commit(
        &self,
        pair: &TrackedPair,
        sha: &str,
    ) -> Result<String, FetchError> {
        self.client.get_raw(&self.raw_url(pair, sha)).await
    }

    fn schema_path(&self, pair: &TrackedPair) -> String {
        self.config.schema_path(&pair.artifact)
    }

    fn raw_url(&self, pair: &TrackedPair, sha: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.config.raw_base,
            self.config.org,
            self.config.repo_name(&pair.subject),
            sha,
            self.config.schema_path(&pair.artifact)
        )
    }

    fn blob_url(&self, pair: &TrackedPair, sha: &str) -> String {
        format!(
            "https://github.com/{}/{}/blob/{}/{}",
            self.config.org,
            self.config.repo_name(&pair.subject),
            sha,
            self.config.schema_path(&pair.artifact)
        )
    }
}
