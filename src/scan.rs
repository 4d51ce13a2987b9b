//! Version-transition scanning over a pair's commit history.
//!
//! The scanner walks the newest-first commit list for one tracked pair and
//! emits a [`VersionRecord`] at each point the declared version differs from
//! the previously seen one. Because the walk runs newest first, the previous
//! observation is the *newer* revision, and the commit where it was last seen
//! is the commit that introduced it; that observation is what gets emitted.
//!
//! Cold start: the first observed version has no baseline to differ from, so
//! it is never emitted on its own. A pair whose entire history carries a
//! single version yields zero records. The scan direction and this
//! suppression are observable behavior and must not change.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::extract::extract_version;
use crate::github::{fetch_commits, CommitApi};
use crate::models::{TrackedPair, VersionRecord};

/// One parsable schema revision the scanner has seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedVersion {
    pub sha: String,
    pub date: DateTime<Utc>,
    pub version: String,
}

/// Per-pair scan state. One instance per (subject, artifact); never shared
/// across pairs.
#[derive(Debug, Default)]
pub struct ScanState {
    last_subject: Option<String>,
    last: Option<ObservedVersion>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one parsable revision, newest first.
    ///
    /// Returns the previous observation when this revision's version differs
    /// from it for the same subject: that observation pins the newer version
    /// to the commit that introduced it. The baseline always advances to the
    /// current revision, emitted or not.
    pub fn observe(
        &mut self,
        subject: &str,
        sha: &str,
        date: DateTime<Utc>,
        version: &str,
    ) -> Option<ObservedVersion> {
        let emitted = match (&self.last_subject, &self.last) {
            (Some(s), Some(prev)) if s == subject && prev.version != version => Some(prev.clone()),
            _ => None,
        };

        self.last_subject = Some(subject.to_string());
        self.last = Some(ObservedVersion {
            sha: sha.to_string(),
            date,
            version: version.to_string(),
        });

        emitted
    }
}

/// Mine the full version history for one pair.
///
/// Fetches the commit list, resolves changed files and schema content per
/// commit, and runs the transition state machine. A fetch failure on a
/// single commit skips that commit only; it never aborts the rest of the
/// pair's scan, and the caller processes sibling pairs regardless.
pub async fn scan_pair(api: &dyn CommitApi, pair: &TrackedPair) -> Vec<VersionRecord> {
    let commits = fetch_commits(api, pair).await;
    let schema_path = api.schema_path(pair);

    let mut state = ScanState::new();
    let mut records = Vec::new();

    for commit in &commits {
        let files = match api.changed_files(pair, &commit.sha).await {
            Ok(files) => files,
            Err(e) => {
                warn!(sha = %commit.sha, error = %e, "commit detail fetch failed, skipping commit");
                continue;
            }
        };

        if !files.iter().any(|f| f == &schema_path) {
            continue;
        }

        let content = match api.schema_at_commit(pair, &commit.sha).await {
            Ok(content) => content,
            Err(e) => {
                warn!(sha = %commit.sha, error = %e, "schema content fetch failed, skipping commit");
                continue;
            }
        };

        // A revision without a parsable version token is skipped without
        // touching the baseline, so it cannot poison the comparison.
        let Some(version) = extract_version(&content) else {
            continue;
        };

        if let Some(prev) = state.observe(&pair.subject, &commit.sha, commit.date, &version) {
            records.push(VersionRecord {
                subject: pair.subject.clone(),
                artifact: pair.artifact.clone(),
                version: prev.version,
                schema_url: api.raw_url(pair, &prev.sha),
                commit_hash: prev.sha,
                commit_date: prev.date,
            });
        }
    }

    records
}
