//! Form server client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use formflow_core::{FormSchema, ShapeParams, SubmissionAck, SubmissionPayload};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Method;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

mod http;

use http::HttpBackend;

pub(crate) const USER_AGENT_VALUE: &str = concat!("formflow-client/", env!("CARGO_PKG_VERSION"));

/// Client for the form server's schema and submit endpoints.
#[derive(Debug, Clone)]
pub struct FormClient {
    http: HttpBackend,
}

impl FormClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ClientError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let base_url = config.parsed_base_url()?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url,
                config,
            },
        })
    }

    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// `GET /api/form`, with the shape as query parameters when set.
    pub async fn fetch_schema(&self, params: &ShapeParams) -> ClientResult<FormSchema> {
        let url = self.schema_url(params)?;
        debug!(url = %url, %params, "fetching form schema");

        let response = self.http.request(Method::GET, &url, None).await?;
        let body = response.text().await.map_err(|e| ClientError::Network {
            message: format!("failed to read response body: {}", e),
        })?;

        FormSchema::from_json_str(&body).map_err(|e| ClientError::InvalidResponse {
            message: format!("failed to parse form schema: {}", e),
        })
    }

    /// `POST /api/form/submit` with the payload as JSON.
    pub async fn submit(&self, payload: &SubmissionPayload) -> ClientResult<SubmissionAck> {
        let url = self.http.endpoint(&["api", "form", "submit"])?;
        debug!(url = %url, fields = payload.values.len(), "submitting form");

        let body = serde_json::to_value(payload).map_err(|e| ClientError::InvalidResponse {
            message: format!("failed to encode submission: {}", e),
        })?;
        let response = self.http.request(Method::POST, &url, Some(&body)).await?;
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to read submission acknowledgement");
                String::new()
            }
        };
        if text.trim().is_empty() {
            return Ok(SubmissionAck::default());
        }

        // The server accepted the submission; an unreadable body only loses the id.
        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(error = %e, "unreadable submission acknowledgement");
            SubmissionAck::default()
        }))
    }

    fn schema_url(&self, params: &ShapeParams) -> ClientResult<Url> {
        let mut url = self.http.endpoint(&["api", "form"])?;
        let pairs = params.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.http.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.http.config
    }
}
