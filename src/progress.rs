//! Backfill progress reporting.
//!
//! Mining a full catalog makes one API call per commit, so a run can take
//! hours under rate limiting. Progress is emitted on **stderr**, one line per
//! tracked pair, so stdout stays parseable for scripts.

use std::io::Write;

/// Reports per-pair mining progress. Implementations write to stderr.
pub trait MiningProgress: Send + Sync {
    /// Called as each pair's scan starts: pair `n` of `total`.
    fn pair_started(&self, subject: &str, artifact: &str, n: usize, total: usize);
}

fn progress_line(subject: &str, artifact: &str, n: usize, total: usize) -> String {
    format!("backfill [{}/{}] {}/{}\n", n, total, subject, artifact)
}

/// Human-friendly progress: "backfill [3/120] Weather/WeatherObserved".
pub struct StderrProgress;

impl MiningProgress for StderrProgress {
    fn pair_started(&self, subject: &str, artifact: &str, n: usize, total: usize) {
        let line = progress_line(subject, artifact, n, total);
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl MiningProgress for NoProgress {
    fn pair_started(&self, _subject: &str, _artifact: &str, _n: usize, _total: usize) {}
}

/// Progress mode for the CLI: human lines on stderr, or off.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn MiningProgress> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
        }
    }
}
