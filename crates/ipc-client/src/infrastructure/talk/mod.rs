//! MULTITRANS talk-channel negotiation.
//!
//! Opens a half-duplex audio channel on the camera's RTSP control port with
//! three request/response round trips on one TCP connection:
//!
//! ```text
//! Client                                        Camera
//! ──────                                        ──────
//! MULTITRANS (no auth)                    ──►
//!                                         ◄──   401 + WWW-Authenticate: Digest
//! MULTITRANS + Authorization: Digest ...  ──►
//!                                         ◄──   200 + Session: <id>
//! MULTITRANS + Session + talk JSON        ──►
//!                                         ◄──   {"error_code": 0, ...}
//! ```
//!
//! [`TalkHandshake`] walks these steps as an explicit state machine.  The
//! socket only leaves the handshake once the channel is open; any failure
//! shuts it down first.

use std::{fmt, io, time::Duration};

use ipc_core::{
    domain::talk::{reply_error_code, talk_request_body, ClientInstanceId},
    protocol::{
        digest::{DigestChallenge, DigestCredentials},
        multitrans::{
            multitrans_uri, MultitransRequest, MultitransResponse, MAX_RESPONSE_SIZE,
            MULTITRANS_METHOD,
        },
    },
    DeviceEndpoint, ProtocolError,
};
use serde_json::Value;
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    time,
};
use tracing::{debug, info, warn};

/// Default RTSP control port the camera listens on.
pub const DEFAULT_CONTROL_PORT: u16 = 554;

/// Maximum time allowed for the TCP connect to the control port.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const READ_CHUNK: usize = 2048;

/// Errors that can occur while opening the talk channel.
#[derive(Debug, Error)]
pub enum TalkError {
    /// TCP connection to the control port failed or timed out.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// An I/O error occurred on the established connection.
    #[error("talk channel I/O error: {0}")]
    Io(#[from] io::Error),
    /// The camera did not answer a response within the configured limit.
    #[error("no response from camera within {0:?}")]
    Timeout(Duration),
    /// The camera closed the connection mid-handshake.
    #[error("camera closed the connection during the handshake")]
    ConnectionClosed,
    /// The unauthenticated request was not answered with `401`.
    #[error("expected 401 challenge, got {status} {reason}")]
    Handshake { status: u16, reason: String },
    /// The challenge was unusable or the digest was rejected.
    #[error("talk authentication failed: {0}")]
    Authentication(String),
    /// A response was malformed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// The talk request was answered with a non-zero `error_code`.
    #[error("camera refused to open talk channel (error_code {code})")]
    ChannelOpen { code: i64 },
}

/// Where a [`TalkHandshake`] currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent yet.
    Init,
    /// The camera answered with a digest challenge.
    ChallengeReceived(DigestChallenge),
    /// The digest was accepted; the camera assigned a session.
    Authenticated { session_id: String },
    /// The talk channel is open; the socket carries interleaved media.
    ChannelOpen,
    /// A step failed and the socket was shut down.
    Closed,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ChallengeReceived(_) => "challenge-received",
            Self::Authenticated { .. } => "authenticated",
            Self::ChannelOpen => "channel-open",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Talk-channel negotiation over one stream.
///
/// Generic over the stream so unit tests can drive it through an in-memory
/// duplex pipe.
pub struct TalkHandshake<S = TcpStream> {
    stream: S,
    uri: String,
    username: String,
    password: String,
    client_id: String,
    response_timeout: Option<Duration>,
    state: HandshakeState,
    next_cseq: u32,
    recv_buf: Vec<u8>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> TalkHandshake<S> {
    /// Prepares a handshake for `endpoint` on an already connected `stream`.
    ///
    /// `response_timeout` bounds each individual response read; `None` waits
    /// indefinitely.
    pub fn new(
        stream: S,
        endpoint: &DeviceEndpoint,
        client_id: &ClientInstanceId,
        response_timeout: Option<Duration>,
    ) -> Self {
        let credentials = endpoint.credentials();
        Self {
            stream,
            uri: multitrans_uri(endpoint.host()),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            client_id: client_id.to_string(),
            response_timeout,
            state: HandshakeState::Init,
            next_cseq: 0,
            recv_buf: Vec::with_capacity(READ_CHUNK),
        }
    }

    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// Runs every remaining step and hands back the open stream.
    ///
    /// On failure the stream is shut down and dropped before the error is
    /// returned.
    pub async fn run(mut self) -> Result<S, TalkError> {
        while self.state != HandshakeState::ChannelOpen {
            if let Err(e) = self.step().await {
                self.close().await;
                return Err(e);
            }
        }
        info!("talk channel open on {}", self.uri);
        Ok(self.stream)
    }

    /// Performs exactly one round trip and advances the state.
    ///
    /// Calling `step` once the channel is open is a no-op.  On error the
    /// state is left unchanged; [`run`](Self::run) is responsible for
    /// closing the stream.
    pub async fn step(&mut self) -> Result<(), TalkError> {
        let next = match self.state.clone() {
            HandshakeState::Init => self.request_challenge().await?,
            HandshakeState::ChallengeReceived(challenge) => self.authenticate(&challenge).await?,
            HandshakeState::Authenticated { session_id } => self.open_channel(&session_id).await?,
            HandshakeState::ChannelOpen => return Ok(()),
            HandshakeState::Closed => return Err(TalkError::ConnectionClosed),
        };
        debug!("talk handshake: {} -> {next}", self.state);
        self.state = next;
        Ok(())
    }

    async fn request_challenge(&mut self) -> Result<HandshakeState, TalkError> {
        let request = self.request().client_id(&self.client_id);
        let response = self.round_trip(&request).await?;

        if response.status_code != 401 {
            return Err(TalkError::Handshake {
                status: response.status_code,
                reason: response.reason,
            });
        }
        let header = response.header("WWW-Authenticate").ok_or_else(|| {
            TalkError::Authentication("401 without WWW-Authenticate header".to_string())
        })?;
        let challenge = DigestChallenge::parse(header)
            .map_err(|e| TalkError::Authentication(format!("unusable digest challenge: {e}")))?;
        Ok(HandshakeState::ChallengeReceived(challenge))
    }

    async fn authenticate(
        &mut self,
        challenge: &DigestChallenge,
    ) -> Result<HandshakeState, TalkError> {
        let credentials = DigestCredentials {
            username: &self.username,
            password: &self.password,
        };
        let authorization = challenge.authorization(credentials, MULTITRANS_METHOD, &self.uri);
        let request = self
            .request()
            .client_id(&self.client_id)
            .authorization(authorization);
        let response = self.round_trip(&request).await?;

        if response.status_code != 200 {
            return Err(TalkError::Authentication(format!(
                "digest rejected: {} {}",
                response.status_code, response.reason
            )));
        }
        let session_id = response
            .session_id()
            .ok_or(ProtocolError::MissingField("Session"))?
            .to_string();
        Ok(HandshakeState::Authenticated { session_id })
    }

    async fn open_channel(&mut self, session_id: &str) -> Result<HandshakeState, TalkError> {
        let request = self
            .request()
            .client_id(&self.client_id)
            .session(session_id)
            .json_body(&talk_request_body());
        let response = self.round_trip(&request).await?;

        // Some firmware omits Content-Length and just streams the JSON after
        // the headers.
        let reply = if response.body.is_empty() && response.header("Content-Length").is_none() {
            match self.response_timeout {
                Some(limit) => time::timeout(limit, self.read_unframed_json())
                    .await
                    .map_err(|_| TalkError::Timeout(limit))??,
                None => self.read_unframed_json().await?,
            }
        } else {
            response.body_json()?
        };
        let code = reply_error_code(&reply)?;
        if code != 0 {
            return Err(TalkError::ChannelOpen { code });
        }
        Ok(HandshakeState::ChannelOpen)
    }

    fn request(&mut self) -> MultitransRequest {
        let cseq = self.next_cseq;
        self.next_cseq += 1;
        MultitransRequest::new(self.uri.clone(), cseq)
    }

    async fn round_trip(
        &mut self,
        request: &MultitransRequest,
    ) -> Result<MultitransResponse, TalkError> {
        self.stream.write_all(&request.encode()).await?;
        self.stream.flush().await?;

        match self.response_timeout {
            Some(limit) => time::timeout(limit, self.read_response())
                .await
                .map_err(|_| TalkError::Timeout(limit))?,
            None => self.read_response().await,
        }
    }

    /// Reads until one complete response is buffered.  Bytes beyond it stay
    /// in `recv_buf` for the next read.
    async fn read_response(&mut self) -> Result<MultitransResponse, TalkError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match MultitransResponse::parse(&self.recv_buf) {
                Ok((response, used)) => {
                    self.recv_buf.drain(..used);
                    debug!(
                        "talk response {} {}",
                        response.status_code, response.reason
                    );
                    return Ok(response);
                }
                Err(ProtocolError::InsufficientData { .. }) => {}
                Err(e) => return Err(e.into()),
            }

            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(TalkError::ConnectionClosed);
            }
            self.recv_buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Reads one JSON value that follows a response without a
    /// `Content-Length`, starting with whatever is already buffered.
    async fn read_unframed_json(&mut self) -> Result<Value, TalkError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let parsed = {
                let mut values =
                    serde_json::Deserializer::from_slice(&self.recv_buf).into_iter::<Value>();
                match values.next() {
                    Some(Ok(value)) => Some(Ok((value, values.byte_offset()))),
                    Some(Err(e)) if !e.is_eof() => Some(Err(e)),
                    _ => None,
                }
            };
            match parsed {
                Some(Ok((value, used))) => {
                    self.recv_buf.drain(..used);
                    return Ok(value);
                }
                Some(Err(e)) => return Err(ProtocolError::MalformedJson(e.to_string()).into()),
                None => {}
            }

            if self.recv_buf.len() > MAX_RESPONSE_SIZE {
                return Err(ProtocolError::MessageTooLarge {
                    size: self.recv_buf.len(),
                    limit: MAX_RESPONSE_SIZE,
                }
                .into());
            }
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(TalkError::ConnectionClosed);
            }
            self.recv_buf.extend_from_slice(&chunk[..n]);
        }
    }

    async fn close(&mut self) {
        self.state = HandshakeState::Closed;
        if let Err(e) = self.stream.shutdown().await {
            debug!("talk socket shutdown: {e}");
        }
    }
}

/// Connects to the camera's control port and opens the talk channel.
///
/// # Errors
///
/// - [`TalkError::Connect`] if the TCP connection cannot be established
///   within [`CONNECT_TIMEOUT`].
/// - Any handshake error from [`TalkHandshake::run`].
pub async fn negotiate_talk_channel(
    endpoint: &DeviceEndpoint,
    client_id: &ClientInstanceId,
    port: u16,
    response_timeout: Option<Duration>,
) -> Result<TcpStream, TalkError> {
    let addr = format!("{}:{port}", endpoint.host());
    debug!("connecting to talk control port {addr}");

    let stream = match time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => return Err(TalkError::Connect { addr, source }),
        Err(_) => {
            return Err(TalkError::Connect {
                addr,
                source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
            })
        }
    };
    if let Err(e) = stream.set_nodelay(true) {
        warn!("failed to set TCP_NODELAY on talk socket: {e}");
    }

    TalkHandshake::new(stream, endpoint, client_id, response_timeout)
        .run()
        .await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
