//! Session client for the camera's JSON-over-HTTP control API.
//!
//! # Login flow
//!
//! ```text
//! Client                                   Camera
//! ──────                                   ──────
//! GET  /pc/Content.htm               ──►
//!                                    ◄──   {"data": {"nonce": "..."}}
//! POST /  {"method": "do", "login": {
//!           "username": ...,
//!           "password": MD5(pw ":" nonce),
//!           "encrypt_type": "3",
//!           "md5_encrypt_type": "1"}} ──►
//!                                    ◄──   {"stok": "..."}
//! POST /stok=<token>/ds  {command}   ──►
//!                                    ◄──   {"error_code": 0, ...}
//! ```
//!
//! The token is cached in the [`SessionClient`] that fetched it and is never
//! persisted.  A fresh nonce is fetched for every login attempt.
//!
//! # Expired tokens
//!
//! When a command reply carries [`EXPIRED_TOKEN_CODE`], the client drops its
//! token, logs in again, and resends the command exactly once.  If the retry
//! is also rejected as expired the call fails with
//! [`ApiError::SessionExpired`].  Every other non-zero `error_code` is a
//! soft, domain-level error: it is logged and handed back to the caller
//! inside the [`ApiResponse`] unchanged.

use async_trait::async_trait;
use ipc_core::{
    domain::lens_mask::{self, LensMaskState},
    protocol::digest::login_digest,
    DeviceEndpoint, ProtocolError,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod transport;

pub use transport::{HttpTimeouts, ReqwestTransport};

/// `error_code` the camera returns when the session token is expired or
/// unknown.
pub const EXPIRED_TOKEN_CODE: i64 = -40401;

/// Errors surfaced by the session client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, timeout, HTTP error status, or an unreadable body.
    #[error("network error: {0}")]
    Network(String),
    /// The reply parsed but did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// The nonce or the session token was missing from a login exchange.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// The token was reported expired again on the already-retried call.
    #[error("session expired (error_code {code}) after re-login")]
    SessionExpired { code: i64 },
}

/// A command reply together with its embedded status code.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// `error_code` from the reply body; `0` when the field is absent.
    pub error_code: i64,
    /// The complete reply envelope.
    pub body: Value,
}

impl ApiResponse {
    pub fn from_body(body: Value) -> Self {
        let error_code = body.get("error_code").and_then(Value::as_i64).unwrap_or(0);
        Self { error_code, body }
    }

    pub fn is_success(&self) -> bool {
        self.error_code == 0
    }

    pub fn is_session_expired(&self) -> bool {
        self.error_code == EXPIRED_TOKEN_CODE
    }
}

/// Trait abstracting the HTTP exchange with the camera.
///
/// The production implementation is [`ReqwestTransport`]; unit tests use a
/// `mockall` mock to count logins and retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Performs a GET and parses the body as JSON, whatever the HTTP status.
    ///
    /// The nonce resource answers with a non-success status on some
    /// firmware while still carrying the nonce in its body.
    async fn get_json(&self, url: &str) -> Result<Value, ApiError>;

    /// POSTs `body` as JSON and parses the reply as JSON.  HTTP error
    /// statuses are reported as [`ApiError::Network`].
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ApiError>;
}

/// Outcome of one authenticated command attempt.
enum Attempt {
    Done(ApiResponse),
    Expired(i64),
}

/// HTTP control-API client bound to one device.
///
/// Owns at most one cached session token.  Methods take `&mut self`: one
/// instance serves one caller at a time.
pub struct SessionClient<T: ApiTransport = ReqwestTransport> {
    endpoint: DeviceEndpoint,
    base_url: String,
    transport: T,
    token: Option<String>,
}

impl<T: ApiTransport> SessionClient<T> {
    /// Creates a client for `endpoint` using `transport` for HTTP.
    pub fn with_transport(endpoint: DeviceEndpoint, transport: T) -> Self {
        let base_url = endpoint.base_url();
        info!("control API client initialised for {base_url}");
        Self {
            endpoint,
            base_url,
            transport,
            token: None,
        }
    }

    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    /// Returns `true` while a session token is cached.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Logs in with a fresh nonce and caches the returned token.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Authentication`] if the nonce or the token is missing.
    /// - [`ApiError::Network`] on transport failure.
    pub async fn login(&mut self) -> Result<(), ApiError> {
        self.login_token().await.map(|_| ())
    }

    async fn login_token(&mut self) -> Result<String, ApiError> {
        info!("logging in to {}", self.base_url);
        self.token = None;

        let nonce_reply = self
            .transport
            .get_json(&format!("{}/pc/Content.htm", self.base_url))
            .await?;
        let nonce = nonce_reply
            .pointer("/data/nonce")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::Authentication("device did not return a nonce".to_string()))?;

        let credentials = self.endpoint.credentials();
        let payload = json!({
            "method": "do",
            "login": {
                "username": credentials.username,
                "password": login_digest(&credentials.password, nonce),
                "encrypt_type": "3",
                "md5_encrypt_type": "1"
            }
        });

        let login_reply = self
            .transport
            .post_json(&format!("{}/", self.base_url), &payload)
            .await?;
        let token = login_reply
            .get("stok")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                let code = ApiResponse::from_body(login_reply.clone()).error_code;
                ApiError::Authentication(format!("login rejected (error_code {code}): no stok"))
            })?
            .to_string();

        self.token = Some(token.clone());
        info!("login successful; session token cached");
        Ok(token)
    }

    /// Sends `payload` to the token-scoped command endpoint, logging in first
    /// if no token is cached and retrying once on token expiry.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Network`] / [`ApiError::Authentication`] from login or
    ///   transport.
    /// - [`ApiError::SessionExpired`] if the retried call is also rejected
    ///   as expired.
    pub async fn request(&mut self, payload: &Value) -> Result<ApiResponse, ApiError> {
        self.request_with_retry(payload, true).await
    }

    /// Like [`request`](Self::request), with explicit control over the single
    /// expiry retry.  With `allow_retry == false` an expired token is an
    /// immediate [`ApiError::SessionExpired`].
    pub async fn request_with_retry(
        &mut self,
        payload: &Value,
        allow_retry: bool,
    ) -> Result<ApiResponse, ApiError> {
        match self.attempt(payload).await? {
            Attempt::Done(response) => Ok(response),
            Attempt::Expired(_) if allow_retry => {
                warn!("session token expired or invalid; logging in again and retrying once");
                match self.attempt(payload).await? {
                    Attempt::Done(response) => Ok(response),
                    Attempt::Expired(code) => Err(ApiError::SessionExpired { code }),
                }
            }
            Attempt::Expired(code) => Err(ApiError::SessionExpired { code }),
        }
    }

    async fn attempt(&mut self, payload: &Value) -> Result<Attempt, ApiError> {
        let token = match &self.token {
            Some(token) => token.clone(),
            None => self.login_token().await?,
        };

        let url = format!("{}/stok={token}/ds", self.base_url);
        let response = ApiResponse::from_body(self.transport.post_json(&url, payload).await?);

        if response.is_session_expired() {
            self.token = None;
            return Ok(Attempt::Expired(response.error_code));
        }
        if response.is_success() {
            debug!("command succeeded");
        } else {
            warn!("camera returned error_code {}: {}", response.error_code, response.body);
        }
        Ok(Attempt::Done(response))
    }

    /// Reads the privacy-shutter state: `true` when the lens is masked.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Protocol`] if `enabled` is absent or is neither
    /// `"on"` nor `"off"`, plus any error from [`request`](Self::request).
    pub async fn get_lens_mask_status(&mut self) -> Result<bool, ApiError> {
        let response = self.request(&lens_mask::get_payload()).await?;
        let state = lens_mask::parse_status(&response.body)?;
        Ok(state.is_on())
    }

    /// Closes the privacy shutter and returns the raw reply envelope.
    pub async fn set_lens_mask_on(&mut self) -> Result<ApiResponse, ApiError> {
        self.request(&lens_mask::set_payload(LensMaskState::On)).await
    }

    /// Opens the privacy shutter and returns the raw reply envelope.
    pub async fn set_lens_mask_off(&mut self) -> Result<ApiResponse, ApiError> {
        self.request(&lens_mask::set_payload(LensMaskState::Off)).await
    }
}

impl SessionClient<ReqwestTransport> {
    /// Creates a client using the production HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(endpoint: DeviceEndpoint, timeouts: transport::HttpTimeouts) -> Result<Self, ApiError> {
        Ok(Self::with_transport(endpoint, ReqwestTransport::new(timeouts)?))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
