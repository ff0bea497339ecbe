//! Shared HTTP transport with bounded retry on transient server errors.

use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use tokio::time::sleep;
use tracing::debug;

use crate::config::HttpConfig;

/// Statuses worth retrying: the register occasionally answers with gateway
/// errors under load.
const RETRYABLE: [StatusCode; 4] = [
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Shared register client. Cheap to clone; all in-flight fetches reuse the
/// same connection pool, and the retry loop keeps no state between calls, so
/// concurrent use is safe.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    max_attempts: u32,
    backoff_factor: f64,
}

impl Transport {
    pub fn new(http: &HttpConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&http.accept)
                .context("invalid accept header value in configuration")?,
        );

        let client = Client::builder()
            .user_agent(&http.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(http.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            max_attempts: http.max_attempts.max(1),
            backoff_factor: http.backoff_factor,
        })
    }

    /// GET with retry. Returns the first non-retryable response, or the last
    /// retryable one once attempts are exhausted. Network-level errors
    /// (timeouts, connection failures) are not retried; the caller classifies
    /// them.
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        let mut attempt = 1;
        loop {
            let response = self.client.get(url).send().await?;
            if !RETRYABLE.contains(&response.status()) || attempt >= self.max_attempts {
                return Ok(response);
            }

            let delay = self.backoff(attempt);
            debug!(
                url,
                status = %response.status(),
                attempt,
                "transient server error, retrying in {:?}",
                delay
            );
            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Exponential schedule: backoff_factor * 2^(attempt - 1) seconds.
    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_factor * 2f64.powi(attempt as i32 - 1))
    }
}
