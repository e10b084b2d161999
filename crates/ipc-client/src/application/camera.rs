//! Per-device facade.
//!
//! A [`Camera`] pairs one control-API session and one talkback player bound
//! to the same [`DeviceEndpoint`].  It is the object a host application keeps
//! per configured camera.

use ipc_core::{DeviceEndpoint, LensMaskState};
use reqwest::Url;
use thiserror::Error;
use tracing::info;

use crate::{
    application::relay::{PlaybackError, RelayStats, TalkSettings, TalkbackPlayer},
    infrastructure::api::{
        ApiError, ApiResponse, ApiTransport, HttpTimeouts, ReqwestTransport, SessionClient,
    },
};

/// Error returned when a media reference cannot become an absolute URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaUrlError {
    /// A `/path` reference was given without a base URL to join it to.
    #[error("relative media path {0:?} requires a base URL")]
    MissingBase(String),
    /// The reference is neither an absolute URL nor a `/path`.
    #[error("unsupported media reference {0:?}")]
    Unsupported(String),
    /// The base URL is not a valid absolute URL.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBase { url: String, reason: String },
}

/// Turns a media reference into a URL the transcoder can open.
///
/// Absolute URLs (any scheme, including `file://`) pass through unchanged.
/// References starting with `/` are joined onto `base`.
///
/// # Errors
///
/// See [`MediaUrlError`].
pub fn resolve_media_url(media: &str, base: Option<&str>) -> Result<String, MediaUrlError> {
    let media = media.trim();
    if Url::parse(media).is_ok() {
        return Ok(media.to_string());
    }
    if !media.starts_with('/') {
        return Err(MediaUrlError::Unsupported(media.to_string()));
    }

    let base = base.ok_or_else(|| MediaUrlError::MissingBase(media.to_string()))?;
    let invalid = |reason: String| MediaUrlError::InvalidBase {
        url: base.to_string(),
        reason,
    };
    let base_url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    let joined = base_url.join(media).map_err(|e| invalid(e.to_string()))?;
    Ok(joined.to_string())
}

/// One camera: control API plus speaker playback.
pub struct Camera<T: ApiTransport = ReqwestTransport> {
    api: SessionClient<T>,
    talkback: TalkbackPlayer,
}

impl Camera<ReqwestTransport> {
    /// Builds a camera with the production HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: DeviceEndpoint,
        timeouts: HttpTimeouts,
        talk: TalkSettings,
    ) -> Result<Self, ApiError> {
        let api = SessionClient::new(endpoint.clone(), timeouts)?;
        Ok(Self::from_parts(api, TalkbackPlayer::new(endpoint, talk)))
    }
}

impl<T: ApiTransport> Camera<T> {
    pub fn from_parts(api: SessionClient<T>, talkback: TalkbackPlayer) -> Self {
        Self { api, talkback }
    }

    pub fn endpoint(&self) -> &DeviceEndpoint {
        self.api.endpoint()
    }

    pub fn talkback(&self) -> &TalkbackPlayer {
        &self.talkback
    }

    /// Reads the current privacy-shutter state.
    pub async fn lens_mask(&mut self) -> Result<LensMaskState, ApiError> {
        let enabled = self.api.get_lens_mask_status().await?;
        Ok(if enabled { LensMaskState::On } else { LensMaskState::Off })
    }

    /// Sets the privacy shutter and returns the camera's reply envelope.
    pub async fn set_lens_mask(&mut self, state: LensMaskState) -> Result<ApiResponse, ApiError> {
        match state {
            LensMaskState::On => self.api.set_lens_mask_on().await,
            LensMaskState::Off => self.api.set_lens_mask_off().await,
        }
    }

    /// Verifies host and credentials by logging in and reading the lens mask.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from login or the status read.
    pub async fn check_connection(&mut self) -> Result<LensMaskState, ApiError> {
        self.api.login().await?;
        let state = self.lens_mask().await?;
        info!("camera {} reachable; lens mask {}", self.endpoint().host(), state.as_str());
        Ok(state)
    }

    /// Best-effort playback through the camera speaker.
    pub async fn play_media(&self, media_url: &str) {
        self.talkback.play_media(media_url).await;
    }

    /// Playback that reports its outcome.
    pub async fn try_play_media(&self, media_url: &str) -> Result<RelayStats, PlaybackError> {
        self.talkback.try_play(media_url).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
