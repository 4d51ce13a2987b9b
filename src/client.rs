//! Rate-limited HTTP client for the commit-history API.
//!
//! Wraps a transport with the quota protocol the hosting API speaks through
//! response headers: after any successful response, if the remaining quota
//! is down to one request or less, the client sleeps until the advertised
//! reset time (plus one second) before returning control, so the next call
//! lands inside a fresh quota window. A 403 whose body mentions a rate limit
//! triggers the same sleep and then re-issues the identical request.
//!
//! The retry is unbounded: this client serves a scheduled batch job that is
//! expected to run to completion or be killed externally. Transport failures
//! and other non-2xx statuses are surfaced as [`FetchError`] without retry.
//!
//! [`Transport`] is the seam between the quota loop and the wire; the
//! production implementation runs over reqwest, tests script responses
//! through a fake.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::warn;

use crate::error::FetchError;

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// One response as the quota loop sees it: status, quota headers, body.
pub struct RawResponse {
    pub status: u16,
    pub remaining: Option<i64>,
    pub reset: Option<i64>,
    pub body: String,
}

/// Issues a single HTTP GET and surfaces the quota headers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str, authenticated: bool) -> Result<RawResponse, FetchError>;
}

struct ReqwestTransport {
    http: reqwest::Client,
    token: Option<String>,
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, url: &str, authenticated: bool) -> Result<RawResponse, FetchError> {
        let mut request = self.http.get(url);
        if authenticated {
            request = request.header("Accept", "application/vnd.github.v3+json");
            if let Some(token) = &self.token {
                request = request.header("Authorization", format!("token {}", token));
            }
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let remaining = header_i64(&response, REMAINING_HEADER);
        let reset = header_i64(&response, RESET_HEADER);
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            remaining,
            reset,
            body,
        })
    }
}

pub struct RateLimitedClient {
    transport: Box<dyn Transport>,
}

impl RateLimitedClient {
    pub fn new(timeout_secs: u64, token: Option<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self::with_transport(Box::new(ReqwestTransport {
            http,
            token,
        })))
    }

    /// Build over an arbitrary transport. Tests script responses through
    /// this.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// GET against the commit-history API, with auth and rate-limit handling.
    pub async fn get_api(&self, url: &str) -> Result<String, FetchError> {
        self.get(url, true).await
    }

    /// GET against the raw-content host. No credential is sent; the rate
    /// limit protocol still applies in case the host advertises one.
    pub async fn get_raw(&self, url: &str) -> Result<String, FetchError> {
        self.get(url, false).await
    }

    async fn get(&self, url: &str, authenticated: bool) -> Result<String, FetchError> {
        loop {
            let response = self.transport.fetch(url, authenticated).await?;

            if (200..300).contains(&response.status) {
                if matches!(response.remaining, Some(r) if r <= 1) {
                    let secs = backoff_seconds(response.reset.unwrap_or(0), epoch_now());
                    warn!(sleep_secs = secs, "rate limit nearly exhausted, pausing");
                    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
                }
                return Ok(response.body);
            }

            if response.status == 403 && response.body.to_lowercase().contains("rate limit") {
                let secs = backoff_seconds(response.reset.unwrap_or(0), epoch_now());
                warn!(
                    sleep_secs = secs,
                    url, "rate limit exceeded, sleeping and retrying"
                );
                tokio::time::sleep(Duration::from_secs_f64(secs)).await;
                continue;
            }

            return Err(FetchError::Status(response.status, url.to_string()));
        }
    }
}

fn header_i64(response: &reqwest::Response, name: &str) -> Option<i64> {
    response.headers().get(name)?.to_str().ok()?.parse().ok()
}

fn epoch_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Seconds to sleep so the next request lands after the quota reset:
/// `max(reset - now, 0) + 1`.
fn backoff_seconds(reset_epoch: i64, now_epoch: f64) -> f64 {
    (reset_epoch as f64 - now_epoch).max(0.0) + 1.0
}
