//! `reqwest`-backed implementation of [`ApiTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use super::{ApiError, ApiTransport};

/// User agent the camera firmware expects from its companion app.
pub const USER_AGENT: &str = "TP-LINK_APP";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Connect and whole-request timeouts for the control API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            request: Duration::from_secs(10),
        }
    }
}

/// Production HTTP transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client with the camera's expected headers and `timeouts`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the TLS backend or client cannot be
    /// initialised.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

fn network(context: &str, err: reqwest::Error) -> ApiError {
    ApiError::Network(format!("{context}: {err}"))
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| network("GET failed", e))?;

        // The nonce endpoint answers with an error status on some firmware.
        debug!(status = %response.status(), "GET {url}");
        response
            .json::<Value>()
            .await
            .map_err(|e| network("unreadable GET body", e))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| ApiError::Network(format!("failed to encode request body: {e}")))?;

        let response = self
            .http
            .post(url)
            .body(bytes)
            .send()
            .await
            .map_err(|e| network("POST failed", e))?
            .error_for_status()
            .map_err(|e| network("POST rejected", e))?;

        debug!(status = %response.status(), "POST accepted");
        response
            .json::<Value>()
            .await
            .map_err(|e| network("unreadable POST body", e))
    }
}
