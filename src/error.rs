//! Error types for the fetch layer.

use thiserror::Error;

/// Failure talking to the commit-history API.
///
/// Rate limiting is never represented here: the client recovers from it
/// internally by sleeping and retrying, so callers only ever see transport
/// failures and unexpected HTTP statuses. Both are recovered locally by the
/// pipeline (skip the affected commit or pair and carry on); neither aborts
/// processing of sibling tracked pairs.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-2xx status that is not a rate limit.
    #[error("unexpected HTTP status {0} from {1}")]
    Status(u16, String),

    /// The API answered 2xx but the body did not match the expected shape.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}
