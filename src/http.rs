//! Shared REST plumbing for the taps
//!
//! One client per tap run. Retriable failures (rate limits, server
//! errors, timeouts) back off exponentially with half-jitter; terminal
//! failures surface immediately. Every request is timed and counted.

use rand::Rng;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::error::{RetryClass, TapError};
use crate::telemetry::observe_http_request;

/// Retry policy for one upstream API
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_tries: u32,
    /// Base backoff factor in seconds; attempt `n` waits around `factor * 2^n`
    pub factor_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_tries: 6,
            factor_secs: 5.0,
        }
    }
}

/// Thin REST client: base URL, auth query parameter, retry policy
pub struct RestClient {
    client: Client,
    base_url: String,
    auth_param: Option<(&'static str, String)>,
    retry: RetryPolicy,
}

impl RestClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        auth_param: Option<(&'static str, String)>,
        retry: RetryPolicy,
    ) -> Result<Self, TapError> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| TapError::Transport {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            base_url,
            auth_param,
            retry,
        })
    }

    /// GET a JSON document, retrying retriable failures.
    ///
    /// `endpoint` is a low-cardinality label for metrics; `path` may embed
    /// symbols and dates.
    pub async fn get_json(
        &self,
        endpoint: &'static str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, TapError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let started = Instant::now();
            let result = self.request_once(&url, params).await;
            let status_label = match &result {
                Ok(_) => "ok",
                Err(TapError::Status { status, .. }) if status.is_server_error() => "5xx",
                Err(TapError::Status { .. }) => "4xx",
                Err(_) => "error",
            };
            observe_http_request(endpoint, status_label, started.elapsed());

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.retry_class() == RetryClass::Retry => {
                    if attempt >= self.retry.max_tries {
                        return Err(TapError::RetriesExhausted {
                            url,
                            tries: attempt,
                            last: Box::new(err),
                        });
                    }
                    let delay = backoff_delay(self.retry.factor_secs, attempt);
                    tracing::warn!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn request_once(&self, url: &str, params: &[(&str, String)]) -> Result<Value, TapError> {
        let mut query: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        if let Some((name, value)) = &self.auth_param {
            query.push((name, value.as_str()));
        }

        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|source| TapError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TapError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| TapError::Transport {
                url: url.to_string(),
                source,
            })?;
        serde_json::from_str(&body).map_err(|source| TapError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Exponential backoff with half-jitter: wait `w/2 + uniform(0, w/2)`
/// where `w = factor * 2^(attempt-1)`.
fn backoff_delay(factor_secs: f64, attempt: u32) -> Duration {
    let window = factor_secs * f64::from(2u32.saturating_pow(attempt.saturating_sub(1)));
    let jitter: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    Duration::from_secs_f64(window / 2.0 + jitter * window / 2.0)
}
