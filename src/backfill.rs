//! Batch mining orchestration.
//!
//! Walks every tracked pair in configuration order, scans its full commit
//! history for version transitions, and populates the store idempotently.
//! Network trouble on individual commits or pairs is logged and skipped; the
//! run fails only when the store itself cannot be opened or written.

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::github::GithubApi;
use crate::models::VersionRecord;
use crate::progress::ProgressMode;
use crate::scan::scan_pair;
use crate::store;

pub async fn run_backfill(config: &Config, dry_run: bool, limit: Option<usize>) -> Result<()> {
    // Store first: a run that cannot reach the store must fail before any
    // mining starts.
    let pool = db::connect(config).await?;

    let api = match GithubApi::new(&config.github) {
        Ok(api) => api,
        Err(e) => {
            pool.close().await;
            return Err(e.into());
        }
    };

    let mut pairs: Vec<_> = config.tracked.iter().collect();
    if let Some(lim) = limit {
        pairs.truncate(lim);
    }
    let total = pairs.len();

    let reporter = ProgressMode::default_for_tty().reporter();
    let mut candidates: Vec<VersionRecord> = Vec::new();

    for (i, pair) in pairs.iter().enumerate() {
        reporter.pair_started(&pair.subject, &pair.artifact, i + 1, total);
        let records = scan_pair(&api, pair).await;
        info!(
            subject = %pair.subject,
            artifact = %pair.artifact,
            transitions = records.len(),
            "pair scanned"
        );
        candidates.extend(records);
    }

    if dry_run {
        println!("backfill (dry-run)");
        println!("  pairs scanned: {}", total);
        println!("  candidate records: {}", candidates.len());
        pool.close().await;
        return Ok(());
    }

    let result = store::insert_new(&pool, &candidates).await;
    pool.close().await;
    let inserted = result?;

    println!("backfill");
    println!("  pairs scanned: {}", total);
    println!("  candidate records: {}", candidates.len());
    println!("  inserted: {}", inserted);
    println!("ok");

    Ok(())
}
