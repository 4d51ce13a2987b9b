//! # Schema Version Tracker CLI (`svt`)
//!
//! The `svt` binary drives the version-mining pipeline and the query
//! service. All commands accept a `--config` flag pointing to a TOML
//! configuration file; see `config/svt.example.toml` for a full example.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `svt init` | Create the SQLite version store and run schema migrations |
//! | `svt pairs` | List the configured tracked (subject, artifact) pairs |
//! | `svt backfill` | Mine every pair's full commit history into the store |
//! | `svt update` | Check each pair's newest commit and record changed versions |
//! | `svt serve` | Start the HTTP query service |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the store
//! svt init --config ./config/svt.toml
//!
//! # One-time historical population (slow: one API call per commit)
//! GITHUB_TOKEN=... svt backfill --config ./config/svt.toml
//!
//! # Scheduled incremental run
//! GITHUB_TOKEN=... svt update --config ./config/svt.toml
//!
//! # Serve the stored versions
//! svt serve --config ./config/svt.toml
//! ```

mod backfill;
mod client;
mod config;
mod db;
mod error;
mod extract;
mod github;
mod migrate;
mod models;
mod pairs;
mod progress;
mod scan;
mod server;
mod store;
mod update;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Schema Version Tracker: mines artifact version history from GitHub
/// commit logs into a queryable version store.
#[derive(Parser)]
#[command(
    name = "svt",
    about = "Tracks the published-version history of schema artifacts hosted on GitHub",
    version,
    long_about = "Schema Version Tracker walks the commit history of each tracked \
    (subject, artifact) pair, detects the commits at which the artifact's declared \
    version changed, and populates a version store that answers \"what versions \
    exist\" and \"what is the current version\" queries over HTTP."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/svt.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the version store schema.
    ///
    /// Creates the SQLite database file and the versions table with its
    /// uniqueness index. Idempotent; running it multiple times is safe.
    Init,

    /// List the configured tracked pairs.
    Pairs,

    /// Mine the full commit history of every tracked pair.
    ///
    /// Walks each pair's schema-file commit log newest first, emits a record
    /// at every version transition, and inserts records not already stored.
    /// Safe to re-run: an unchanged history inserts nothing new.
    Backfill {
        /// Scan and report without writing to the store.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of tracked pairs to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Record versions that changed since the last run.
    ///
    /// Checks only the newest commit per pair against the store's latest
    /// known version. Intended for a scheduler (cron or similar).
    Update,

    /// Start the HTTP query service.
    ///
    /// Binds to `[server].bind` and serves the stored version records.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr so stdout stays parseable for scripts.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Version store initialized successfully.");
        }
        Commands::Pairs => {
            pairs::list_pairs(&cfg)?;
        }
        Commands::Backfill { dry_run, limit } => {
            backfill::run_backfill(&cfg, dry_run, limit).await?;
        }
        Commands::Update => {
            update::run_update(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
