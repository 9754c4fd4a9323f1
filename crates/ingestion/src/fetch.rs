//! HTTP fetcher for upstream CFS2/CMIP6 sources.
//!
//! Each source file is fetched whole, once, with no partial-range
//! resumption: a `reqwest::Client` built with a fixed timeout and
//! connection pool, retrying on failure with backoff.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// NOAA's NOMADS filter CGI returns an HTML rate-limit page with a 200
/// status instead of a 429; the body's opening bytes are the only signal.
const NOMADS_RATE_LIMIT_PREFIX: &str = "<!doctype html>";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);
const MAX_ATTEMPTS: u32 = 3;

/// Result of one fetch attempt against an upstream source.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Fetched successfully.
    Ok(Bytes),
    /// Upstream returned 404 — the caller treats this as "not yet published"
    /// for reanalysis sources, or as a hard failure for forecast sources.
    NotFound,
    /// NOMADS returned its rate-limit HTML page.
    RateLimited,
    /// Exhausted retries or hit a non-2xx/404 status.
    Failed(String),
}

/// Fetches upstream CFS2/CMIP6 resources over HTTP.
///
/// A single instance is shared across all requests to one upstream (e.g. one
/// `Fetcher` per NOMADS filter endpoint) so that `min_interval` pacing is
/// enforced across the whole ingester, not per-call.
pub struct Fetcher {
    client: Client,
    min_interval: Option<Duration>,
    max_attempts: u32,
    last_call: Mutex<Option<Instant>>,
}

impl Fetcher {
    /// A fetcher with no inter-request pacing, for sources without a rate
    /// limit (NCEI reanalysis archive, S3-hosted CMIP6 NetCDF files).
    pub fn new() -> Self {
        Self::build(None, REQUEST_TIMEOUT, MAX_ATTEMPTS)
    }

    /// A fetcher that waits at least `min_interval` between requests,
    /// for the NOMADS forecast filter CGI (1 request per 3 seconds).
    pub fn with_pacing(min_interval: Duration) -> Self {
        Self::build(Some(min_interval), REQUEST_TIMEOUT, MAX_ATTEMPTS)
    }

    /// A fetcher with every knob configurable, for the driver's settings
    /// resolution (CLI flag > env var > default, §4.M).
    pub fn with_config(min_interval: Option<Duration>, timeout: Duration, max_attempts: u32) -> Self {
        Self::build(min_interval, timeout, max_attempts)
    }

    fn build(min_interval: Option<Duration>, timeout: Duration, max_attempts: u32) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .build()
            .expect("reqwest client configuration is static and always valid");

        Self {
            client,
            min_interval,
            max_attempts: max_attempts.max(1),
            last_call: Mutex::new(None),
        }
    }

    async fn pace(&self) {
        let Some(min_interval) = self.min_interval else {
            return;
        };

        let wait = {
            let mut last_call = self.last_call.lock().unwrap();
            let wait = match *last_call {
                Some(last) => min_interval.saturating_sub(last.elapsed()),
                None => Duration::ZERO,
            };
            *last_call = Some(Instant::now() + wait);
            wait
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Fetch `url`, retrying transient failures up to `max_attempts` times
    /// with linear backoff.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            self.pace().await;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::NOT_FOUND {
                        return FetchOutcome::NotFound;
                    }

                    if !status.is_success() {
                        last_error = format!("HTTP {status}");
                        warn!(url, attempt, %status, "fetch attempt failed");
                        Self::backoff(attempt).await;
                        continue;
                    }

                    match response.bytes().await {
                        Ok(body) => {
                            if body.starts_with(NOMADS_RATE_LIMIT_PREFIX.as_bytes()) {
                                return FetchOutcome::RateLimited;
                            }
                            debug!(url, bytes = body.len(), "fetched");
                            return FetchOutcome::Ok(body);
                        }
                        Err(e) => {
                            last_error = e.to_string();
                            warn!(url, attempt, error = %e, "failed to read response body");
                        }
                    }
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(url, attempt, error = %e, "fetch attempt errored");
                }
            }

            Self::backoff(attempt).await;
        }

        FetchOutcome::Failed(last_error)
    }

    async fn backoff(attempt: u32) {
        tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paced_fetcher_records_no_interval_before_first_call() {
        let fetcher = Fetcher::with_pacing(Duration::from_millis(300));
        assert!(fetcher.last_call.lock().unwrap().is_none());
    }

    #[test]
    fn unpaced_fetcher_has_no_min_interval() {
        let fetcher = Fetcher::new();
        assert!(fetcher.min_interval.is_none());
    }

    #[tokio::test]
    async fn pacing_enforces_minimum_gap_between_calls() {
        let fetcher = Fetcher::with_pacing(Duration::from_millis(100));
        let start = Instant::now();
        fetcher.pace().await;
        fetcher.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(90));
    }
}
