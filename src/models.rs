//! Core data models used throughout the tracker.
//!
//! These types represent the tracked pairs, commits, and version records that
//! flow through the mining and incremental-update pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A (subject, artifact) pair the tracker is configured to follow.
///
/// The subject names a repository grouping (`<repo_prefix><subject>` on the
/// hosting side); the artifact names a versioned schema within it. Pairs are
/// supplied by configuration and processed in configuration order.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TrackedPair {
    pub subject: String,
    pub artifact: String,
}

/// A commit summary as returned by the commit-listing endpoint.
///
/// Changed files and file content are not carried here; they are resolved
/// lazily, one API call per commit, only for commits the scanner looks at.
#[derive(Debug, Clone)]
pub struct CommitSummary {
    pub sha: String,
    pub date: DateTime<Utc>,
}

/// The unit of persisted state: one observed version of one artifact.
///
/// The triple (subject, artifact, version) is the uniqueness key in the
/// store; `schema_url`, `commit_hash`, and `commit_date` are informational.
/// A record is written exactly once, by either the backfill miner or the
/// incremental updater, and is immutable afterwards.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VersionRecord {
    pub subject: String,
    pub artifact: String,
    pub version: String,
    #[serde(rename = "schemaUrl")]
    pub schema_url: String,
    #[serde(rename = "commitHash")]
    pub commit_hash: String,
    #[serde(rename = "commitDate")]
    pub commit_date: DateTime<Utc>,
}
