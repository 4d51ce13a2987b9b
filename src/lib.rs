//! # Schema Version Tracker
//!
//! Mines the published-version history of a catalog of versioned schema
//! artifacts out of GitHub commit logs and keeps a queryable store of
//! (subject, artifact, version) records.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │ GitHub API  │──▶│   Miners     │──▶│  SQLite   │
//! │ rate-limited│   │ backfill/upd │   │ versions  │
//! └─────────────┘   └──────────────┘   └────┬─────┘
//!                                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │  (svt)   │       │  (query) │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! svt init                      # create the version store
//! svt backfill                  # mine full histories for all tracked pairs
//! svt update                    # record versions that changed since last run
//! svt serve                     # start the HTTP query service
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`client`] | Rate-limited HTTP client |
//! | [`github`] | Commit-history API access |
//! | [`extract`] | Version-token extraction |
//! | [`scan`] | Version-transition scanning |
//! | [`backfill`] | Batch mining orchestration |
//! | [`update`] | Incremental version checking |
//! | [`store`] | Version store reads/writes |
//! | [`server`] | HTTP query service |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod backfill;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod github;
pub mod migrate;
pub mod models;
pub mod pairs;
pub mod progress;
pub mod scan;
pub mod server;
pub mod store;
pub mod update;
