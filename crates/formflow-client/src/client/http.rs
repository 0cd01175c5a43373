//! HTTP layer: status mapping and retry.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Upper bound on any single backoff, including a server's Retry-After.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Longest error body carried into an error message.
const MAX_ERROR_BODY: usize = 200;

/// HTTP backend for making requests (holds reqwest client, base URL, config).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) config: ClientConfig,
}

impl HttpBackend {
    /// `base_url` with `segments` appended to its path.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Config {
                message: format!("base URL cannot carry a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, retrying transient failures.
    ///
    /// Only GET is retried. A POST that timed out or got a 5xx may still have
    /// been applied by the server.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> ClientResult<reqwest::Response> {
        use rand::Rng;

        let mut retries = 0;
        let max_retries = if method == Method::GET {
            self.config.max_retries
        } else {
            0
        };

        loop {
            let result = self.request_once(method.clone(), url, body).await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;

                    let backoff = match &e {
                        ClientError::RateLimited {
                            retry_after: Some(retry_after),
                        } => {
                            let base_ms = (*retry_after).min(MAX_BACKOFF).as_millis() as u64;
                            let jitter_factor: f64 =
                                rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
                            Duration::from_millis(jittered_ms.max(100))
                        }
                        _ => {
                            let base_backoff = Duration::from_secs(1 << retries).min(MAX_BACKOFF);
                            let jittered_ms =
                                rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
                            Duration::from_millis(jittered_ms.max(10))
                        }
                    };

                    warn!(
                        error = %e,
                        url = %url,
                        retry = retries,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_once(
        &self,
        method: Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> ClientResult<reqwest::Response> {
        let mut request = self.client.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "response received");

        match status.as_u16() {
            200..=299 => Ok(response),

            404 => Err(ClientError::NotFound {
                url: url.to_string(),
            }),

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);

                Err(ClientError::RateLimited { retry_after })
            }

            500..=599 => Err(ClientError::Server {
                status: status.as_u16(),
                message: error_body(response, status).await,
            }),

            _ => Err(ClientError::Rejected {
                status: status.as_u16(),
                message: error_body(response, status).await,
            }),
        }
    }
}

async fn error_body(response: reqwest::Response, status: StatusCode) -> String {
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => text.chars().take(MAX_ERROR_BODY).collect(),
        _ => status
            .canonical_reason()
            .unwrap_or("no reason provided")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend {
            client: reqwest::Client::new(),
            base_url: Url::parse(base).unwrap(),
            config: ClientConfig::default(),
        }
    }

    #[test]
    fn test_endpoint_on_bare_host() {
        let url = backend("http://localhost:3000").endpoint(&["api", "form"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/form");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = backend("https://example.com/tenant-a")
            .endpoint(&["api", "form", "submit"])
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/tenant-a/api/form/submit");
    }
}
