//! Audio relay: plays a media source through the camera's speaker.
//!
//! One playback owns exactly three resources:
//!
//! ```text
//! ffmpeg ──RTP/UDP──► loopback listener ──► '$' 0x01 len payload ──► talk socket ──► camera
//! ```
//!
//! - the negotiated talk socket (TCP, from the talk handshake),
//! - a UDP listener on `127.0.0.1` with an ephemeral port,
//! - the transcoder process writing RTP datagrams to that listener.
//!
//! The relay runs on a single task.  It waits for a datagram with a bounded
//! timeout; every datagram becomes exactly one interleave frame on the talk
//! socket, in arrival order.  Each time the wait times out it checks whether
//! the transcoder has exited, and stops once it has.
//!
//! [`RelayResources`] guarantees the three resources are released on every
//! exit path.  Normal and error paths call [`RelayResources::release`]
//! explicitly; if the enclosing future is dropped mid-relay the guard's
//! fields drop with it, which kills the transcoder (`kill_on_drop`) and
//! closes both sockets.
//!
//! [`TalkbackPlayer::play_media`] is the best-effort entry point: it logs
//! failures and never returns an error.

use std::{
    io,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use ipc_core::{
    domain::talk::ClientInstanceId,
    protocol::interleave::{InterleaveFrame, INTERLEAVE_HEADER_SIZE, TALK_CHANNEL_ID},
    DeviceEndpoint, ProtocolError,
};
use thiserror::Error;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    net::UdpSocket,
    time,
};
use tracing::{debug, error, info, warn};

use crate::infrastructure::{
    storage::config::TalkConfig,
    talk::{negotiate_talk_channel, TalkError, DEFAULT_CONTROL_PORT},
    transcoder::{FfmpegTranscoder, Transcoder, TranscoderConfig, TranscoderExit},
};

/// Receive buffer size for one RTP datagram.
pub const RELAY_BUFFER_SIZE: usize = 2048;

/// Idle wait before checking transcoder liveness.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Shortest liveness poll the relay will use.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors that can end a playback.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The loopback UDP listener could not be bound.
    #[error("failed to bind relay listener: {0}")]
    Bind(#[source] io::Error),
    /// The transcoder process could not be started.
    #[error("failed to start transcoder: {0}")]
    Spawn(#[source] io::Error),
    /// Receiving a datagram or writing to the talk socket failed.
    #[error("relay I/O error: {0}")]
    Io(#[from] io::Error),
    /// A datagram could not be framed.
    #[error("failed to frame datagram: {0}")]
    Frame(#[from] ProtocolError),
    /// The talk channel could not be opened.
    #[error("talk channel negotiation failed: {0}")]
    Talk(#[from] TalkError),
    /// The transcoder failed on its own.
    #[error("transcoder exited abnormally ({status}): {stderr}")]
    Transcoder { status: String, stderr: String },
}

/// Counters for one relay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Datagrams forwarded, one interleave frame each.
    pub datagrams: u64,
    /// Payload bytes forwarded, excluding frame headers.
    pub bytes: u64,
}

/// Forwards datagrams from `listener` to `sink` until `transcoder` exits.
///
/// Datagrams already queued on the listener are always drained before the
/// exit is noticed, since liveness is only checked after an idle wait.
///
/// `poll_interval` is raised to [`MIN_POLL_INTERVAL`] if shorter.
///
/// # Errors
///
/// Returns the first receive, write, or framing error.  Nothing is released
/// here; that is the caller's job.
pub async fn relay_datagrams<T, W>(
    listener: &UdpSocket,
    sink: &mut W,
    transcoder: &mut T,
    poll_interval: Duration,
) -> Result<RelayStats, PlaybackError>
where
    T: Transcoder + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut datagram = [0u8; RELAY_BUFFER_SIZE];
    let mut frame = Vec::with_capacity(INTERLEAVE_HEADER_SIZE + RELAY_BUFFER_SIZE);
    let mut stats = RelayStats::default();
    let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);

    loop {
        match time::timeout(poll_interval, listener.recv(&mut datagram)).await {
            Ok(received) => {
                let n = received?;
                InterleaveFrame::encode_into(TALK_CHANNEL_ID, &datagram[..n], &mut frame)?;
                sink.write_all(&frame).await?;
                stats.datagrams += 1;
                stats.bytes += n as u64;
            }
            Err(_) => {
                if transcoder.has_exited()? {
                    debug!("transcoder exited; relay loop finished");
                    return Ok(stats);
                }
            }
        }
    }
}

struct RelayParts<T, W> {
    transcoder: T,
    listener: UdpSocket,
    sink: W,
}

/// Owns the transcoder, the listener, and the talk socket of one playback.
pub struct RelayResources<T, W> {
    parts: Option<RelayParts<T, W>>,
}

impl<T, W> RelayResources<T, W>
where
    T: Transcoder,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(transcoder: T, listener: UdpSocket, sink: W) -> Self {
        Self {
            parts: Some(RelayParts {
                transcoder,
                listener,
                sink,
            }),
        }
    }

    /// Runs [`relay_datagrams`] over the owned resources.
    ///
    /// Once released there is nothing to relay and empty stats are returned.
    pub async fn relay(&mut self, poll_interval: Duration) -> Result<RelayStats, PlaybackError> {
        match self.parts.as_mut() {
            Some(parts) => {
                relay_datagrams(
                    &parts.listener,
                    &mut parts.sink,
                    &mut parts.transcoder,
                    poll_interval,
                )
                .await
            }
            None => Ok(RelayStats::default()),
        }
    }

    /// Stops the transcoder, closes the listener, and shuts the talk socket
    /// down.  Only the first call does any work.
    ///
    /// Returns how the transcoder ended, or `None` if it had already been
    /// released or could not be reaped.
    pub async fn release(&mut self) -> Option<TranscoderExit> {
        let RelayParts {
            mut transcoder,
            listener,
            mut sink,
        } = self.parts.take()?;

        let exit = match transcoder.shutdown().await {
            Ok(exit) => {
                if exit.is_abnormal() {
                    error!("transcoder failed (code {:?}): {}", exit.code, exit.stderr);
                }
                Some(exit)
            }
            Err(e) => {
                error!("failed to stop transcoder: {e}");
                None
            }
        };
        drop(transcoder);
        drop(listener);
        if let Err(e) = sink.shutdown().await {
            debug!("talk socket shutdown: {e}");
        }
        drop(sink);

        info!("relay resources released");
        exit
    }
}

impl<T, W> RelayResources<T, W> {
    pub fn is_released(&self) -> bool {
        self.parts.is_none()
    }
}

impl<T, W> Drop for RelayResources<T, W> {
    fn drop(&mut self) {
        if !self.is_released() {
            warn!("relay cancelled before cleanup; dropping transcoder and sockets");
        }
    }
}

/// Relays until the transcoder exits, then releases every resource.
///
/// # Errors
///
/// - Any relay error from [`relay_datagrams`].
/// - [`PlaybackError::Transcoder`] if the relay itself succeeded but the
///   transcoder exited with a failure status.
pub async fn relay_to_socket<T, W>(
    sink: W,
    listener: UdpSocket,
    transcoder: T,
    poll_interval: Duration,
) -> Result<RelayStats, PlaybackError>
where
    T: Transcoder,
    W: AsyncWrite + Unpin + Send,
{
    let mut resources = RelayResources::new(transcoder, listener, sink);
    let result = resources.relay(poll_interval).await;
    let exit = resources.release().await;

    let stats = result?;
    match exit {
        Some(exit) if exit.is_abnormal() => Err(PlaybackError::Transcoder {
            status: describe_exit(&exit),
            stderr: exit.stderr,
        }),
        _ => Ok(stats),
    }
}

fn describe_exit(exit: &TranscoderExit) -> String {
    match exit.code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

/// Tunables for talk-channel playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalkSettings {
    pub control_port: u16,
    /// Per-response read limit during the handshake; `None` waits forever.
    pub response_timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub transcoder: TranscoderConfig,
}

impl Default for TalkSettings {
    fn default() -> Self {
        Self {
            control_port: DEFAULT_CONTROL_PORT,
            response_timeout: Some(Duration::from_secs(10)),
            poll_interval: DEFAULT_POLL_INTERVAL,
            transcoder: TranscoderConfig::default(),
        }
    }
}

impl From<&TalkConfig> for TalkSettings {
    fn from(config: &TalkConfig) -> Self {
        Self {
            control_port: config.control_port,
            response_timeout: config.response_timeout(),
            poll_interval: config.poll_interval(),
            transcoder: TranscoderConfig {
                program: config.ffmpeg_path.clone(),
                initial_delay: config.initial_delay(),
            },
        }
    }
}

/// Counts one in-flight playback; the count drops on every exit path,
/// cancellation included.
struct PlayingGuard<'a>(&'a AtomicUsize);

impl<'a> PlayingGuard<'a> {
    fn engage(in_flight: &'a AtomicUsize) -> Self {
        if in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            warn!("playback started while another is in flight on this player");
        }
        Self(in_flight)
    }
}

impl Drop for PlayingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Plays media through one camera's speaker.
///
/// Holds the per-instance client identifier sent with every talk request.
/// There is no internal lock: the camera has a single talk channel, so
/// callers must not run two playbacks on the same device at once.
pub struct TalkbackPlayer {
    endpoint: DeviceEndpoint,
    client_id: ClientInstanceId,
    settings: TalkSettings,
    playing: AtomicUsize,
}

impl TalkbackPlayer {
    pub fn new(endpoint: DeviceEndpoint, settings: TalkSettings) -> Self {
        Self::with_client_id(endpoint, settings, ClientInstanceId::new())
    }

    pub fn with_client_id(
        endpoint: DeviceEndpoint,
        settings: TalkSettings,
        client_id: ClientInstanceId,
    ) -> Self {
        Self {
            endpoint,
            client_id,
            settings,
            playing: AtomicUsize::new(0),
        }
    }

    pub fn client_id(&self) -> &ClientInstanceId {
        &self.client_id
    }

    pub fn settings(&self) -> &TalkSettings {
        &self.settings
    }

    /// `true` while at least one playback is in flight.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst) > 0
    }

    /// Plays `media_url` to completion.  Failures are logged, never returned.
    pub async fn play_media(&self, media_url: &str) {
        match self.try_play(media_url).await {
            Ok(stats) => info!(
                "playback finished: {} datagrams, {} bytes",
                stats.datagrams, stats.bytes
            ),
            Err(e) => error!("playback of {media_url} failed: {e}"),
        }
    }

    /// Like [`play_media`](Self::play_media) but reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first failure: negotiation, bind, spawn, relay, or an
    /// abnormal transcoder exit.
    pub async fn try_play(&self, media_url: &str) -> Result<RelayStats, PlaybackError> {
        let _playing = PlayingGuard::engage(&self.playing);
        info!("starting playback of {media_url} on {}", self.endpoint.host());

        let socket = negotiate_talk_channel(
            &self.endpoint,
            &self.client_id,
            self.settings.control_port,
            self.settings.response_timeout,
        )
        .await?;

        let listener = UdpSocket::bind(("127.0.0.1", 0))
            .await
            .map_err(PlaybackError::Bind)?;
        let sink_addr = listener.local_addr().map_err(PlaybackError::Bind)?;
        debug!("relay listening on {sink_addr}");

        let transcoder = FfmpegTranscoder::spawn(&self.settings.transcoder, media_url, sink_addr)
            .map_err(PlaybackError::Spawn)?;

        relay_to_socket(socket, listener, transcoder, self.settings.poll_interval).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ipc_core::Credentials;
    use std::{
        pin::Pin,
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc,
        },
        task::{Context, Poll},
    };

    const POLL: Duration = Duration::from_millis(50);

    /// Scripted transcoder recording how it was driven.
    struct FakeTranscoder {
        exited: Arc<AtomicBool>,
        polls: Arc<AtomicUsize>,
        shutdowns: Arc<AtomicUsize>,
        dropped: Arc<AtomicBool>,
        exit: TranscoderExit,
    }

    #[derive(Clone, Default)]
    struct Recorder {
        exited: Arc<AtomicBool>,
        polls: Arc<AtomicUsize>,
        shutdowns: Arc<AtomicUsize>,
        dropped: Arc<AtomicBool>,
    }

    impl Recorder {
        fn transcoder(&self, exit: TranscoderExit) -> FakeTranscoder {
            FakeTranscoder {
                exited: Arc::clone(&self.exited),
                polls: Arc::clone(&self.polls),
                shutdowns: Arc::clone(&self.shutdowns),
                dropped: Arc::clone(&self.dropped),
                exit,
            }
        }
    }

    fn clean_exit() -> TranscoderExit {
        TranscoderExit { success: true, code: Some(0), killed: false, stderr: String::new() }
    }

    #[async_trait]
    impl Transcoder for FakeTranscoder {
        fn has_exited(&mut self) -> io::Result<bool> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(self.exited.load(Ordering::SeqCst))
        }

        async fn shutdown(&mut self) -> io::Result<TranscoderExit> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            self.exited.store(true, Ordering::SeqCst);
            Ok(self.exit.clone())
        }
    }

    impl Drop for FakeTranscoder {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    /// Sink whose every write fails; counts shutdown calls.
    #[derive(Default)]
    struct BrokenSink {
        shutdowns: Arc<AtomicUsize>,
    }

    impl AsyncWrite for BrokenSink {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "camera went away")))
        }
        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Poll::Ready(Ok(()))
        }
    }

    async fn listener_with_datagrams(payloads: &[&[u8]]) -> UdpSocket {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        for payload in payloads {
            sender.send_to(payload, listener.local_addr().unwrap()).await.unwrap();
        }
        listener
    }

    fn decode_all(mut bytes: &[u8]) -> Vec<InterleaveFrame> {
        let mut frames = Vec::new();
        while !bytes.is_empty() {
            let (frame, used) = InterleaveFrame::decode(bytes).unwrap();
            frames.push(frame);
            bytes = &bytes[used..];
        }
        frames
    }

    #[tokio::test]
    async fn test_relay_frames_each_datagram_in_order_then_stops_on_exit() {
        // Arrange
        let rtp = [0u8; 172];
        let listener =
            listener_with_datagrams(&[b"first".as_slice(), b"second".as_slice(), rtp.as_slice()]).await;
        let recorder = Recorder::default();
        let mut transcoder = recorder.transcoder(clean_exit());
        recorder.exited.store(true, Ordering::SeqCst);
        let mut sink: Vec<u8> = Vec::new();

        // Act
        let stats = relay_datagrams(&listener, &mut sink, &mut transcoder, POLL).await.unwrap();

        // Assert
        let frames = decode_all(&sink);
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.channel == TALK_CHANNEL_ID));
        assert_eq!(frames[0].payload, b"first");
        assert_eq!(frames[1].payload, b"second");
        assert_eq!(frames[2].payload.len(), 172);
        assert_eq!(stats, RelayStats { datagrams: 3, bytes: 5 + 6 + 172 });
    }

    #[tokio::test]
    async fn test_relay_keeps_polling_while_transcoder_runs() {
        // Arrange: transcoder exits only after a few idle polls
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let recorder = Recorder::default();
        let mut transcoder = recorder.transcoder(clean_exit());
        let exited = Arc::clone(&recorder.exited);
        tokio::spawn(async move {
            tokio::time::sleep(POLL * 3).await;
            exited.store(true, Ordering::SeqCst);
        });
        let mut sink: Vec<u8> = Vec::new();

        // Act: the exit lands at 3 polls, so the loop must finish well inside 5
        let stats = tokio::time::timeout(
            POLL * 5,
            relay_datagrams(&listener, &mut sink, &mut transcoder, POLL),
        )
        .await
        .expect("relay did not stop within one poll of the exit")
        .unwrap();

        // Assert
        assert_eq!(stats, RelayStats::default());
        assert!(sink.is_empty());
        assert!(recorder.polls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_zero_poll_interval_is_raised_to_minimum() {
        // Arrange
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let recorder = Recorder::default();
        let mut transcoder = recorder.transcoder(clean_exit());
        let exited = Arc::clone(&recorder.exited);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            exited.store(true, Ordering::SeqCst);
        });
        let mut sink: Vec<u8> = Vec::new();

        // Act
        relay_datagrams(&listener, &mut sink, &mut transcoder, Duration::ZERO)
            .await
            .unwrap();

        // Assert: 100ms at a 10ms floor is about ten polls, not thousands
        assert!(recorder.polls.load(Ordering::SeqCst) <= 20);
    }

    #[test]
    fn test_overlapping_playbacks_stay_playing_until_last_ends() {
        // Arrange
        let endpoint = DeviceEndpoint::new("cam", Credentials::new("admin", "pw")).unwrap();
        let player = TalkbackPlayer::new(endpoint, TalkSettings::default());

        // Act / Assert
        let first = PlayingGuard::engage(&player.playing);
        let second = PlayingGuard::engage(&player.playing);
        drop(first);
        assert!(player.is_playing());
        drop(second);
        assert!(!player.is_playing());
    }

    #[tokio::test]
    async fn test_relay_to_socket_releases_once_on_success() {
        // Arrange
        let listener = listener_with_datagrams(&[b"rtp".as_slice()]).await;
        let recorder = Recorder::default();
        recorder.exited.store(true, Ordering::SeqCst);
        let transcoder = recorder.transcoder(clean_exit());

        // Act
        let stats = relay_to_socket(Vec::<u8>::new(), listener, transcoder, POLL).await.unwrap();

        // Assert
        assert_eq!(stats.datagrams, 1);
        assert_eq!(recorder.shutdowns.load(Ordering::SeqCst), 1);
        assert!(recorder.dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_write_failure_still_releases_everything_once() {
        // Arrange
        let listener = listener_with_datagrams(&[b"rtp".as_slice()]).await;
        let recorder = Recorder::default();
        let transcoder = recorder.transcoder(clean_exit());
        let sink = BrokenSink::default();
        let sink_shutdowns = Arc::clone(&sink.shutdowns);

        // Act
        let result = relay_to_socket(sink, listener, transcoder, POLL).await;

        // Assert
        assert!(matches!(result, Err(PlaybackError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(recorder.shutdowns.load(Ordering::SeqCst), 1);
        assert!(recorder.dropped.load(Ordering::SeqCst));
        assert_eq!(sink_shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abnormal_transcoder_exit_is_reported_with_stderr() {
        // Arrange
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let recorder = Recorder::default();
        recorder.exited.store(true, Ordering::SeqCst);
        let transcoder = recorder.transcoder(TranscoderExit {
            success: false,
            code: Some(1),
            killed: false,
            stderr: "No such file or directory".to_string(),
        });

        // Act
        let result = relay_to_socket(Vec::<u8>::new(), listener, transcoder, POLL).await;

        // Assert
        match result {
            Err(PlaybackError::Transcoder { status, stderr }) => {
                assert_eq!(status, "exit code 1");
                assert_eq!(stderr, "No such file or directory");
            }
            other => panic!("expected transcoder error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        // Arrange
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let recorder = Recorder::default();
        let mut resources = RelayResources::new(recorder.transcoder(clean_exit()), listener, Vec::<u8>::new());

        // Act
        let first = resources.release().await;
        let second = resources.release().await;

        // Assert
        assert_eq!(first, Some(clean_exit()));
        assert_eq!(second, None);
        assert!(resources.is_released());
        assert_eq!(recorder.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(resources.relay(POLL).await.unwrap(), RelayStats::default());
    }

    #[tokio::test]
    async fn test_cancelled_relay_drops_all_resources() {
        // Arrange: the transcoder never exits, so the relay runs until aborted
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let recorder = Recorder::default();
        let transcoder = recorder.transcoder(clean_exit());
        let handle = tokio::spawn(relay_to_socket(Vec::<u8>::new(), listener, transcoder, POLL));
        tokio::time::sleep(POLL * 2).await;

        // Act
        handle.abort();
        let joined = handle.await;

        // Assert
        assert!(joined.unwrap_err().is_cancelled());
        assert!(recorder.dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_try_play_against_closed_port_fails_and_clears_playing() {
        // Arrange
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = closed.local_addr().unwrap().port();
        drop(closed);
        let endpoint = DeviceEndpoint::new("127.0.0.1", Credentials::new("admin", "pw")).unwrap();
        let settings = TalkSettings { control_port: port, ..TalkSettings::default() };
        let player = TalkbackPlayer::new(endpoint, settings);

        // Act
        let result = player.try_play("http://example.invalid/a.mp3").await;

        // Assert
        assert!(matches!(result, Err(PlaybackError::Talk(TalkError::Connect { .. }))));
        assert!(!player.is_playing());
    }

    #[tokio::test]
    async fn test_play_media_swallows_errors() {
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = closed.local_addr().unwrap().port();
        drop(closed);
        let endpoint = DeviceEndpoint::new("127.0.0.1", Credentials::new("admin", "pw")).unwrap();
        let player = TalkbackPlayer::new(
            endpoint,
            TalkSettings { control_port: port, ..TalkSettings::default() },
        );

        player.play_media("a.mp3").await;

        assert!(!player.is_playing());
    }

    #[test]
    fn test_talk_settings_from_config() {
        // Arrange
        let config = TalkConfig {
            control_port: 8554,
            ffmpeg_path: "/opt/ffmpeg".to_string(),
            initial_delay_ms: 1000,
            poll_interval_ms: 250,
            response_timeout_secs: 0,
        };

        // Act
        let settings = TalkSettings::from(&config);

        // Assert
        assert_eq!(settings.control_port, 8554);
        assert_eq!(settings.response_timeout, None);
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
        assert_eq!(settings.transcoder.program, "/opt/ffmpeg");
        assert_eq!(settings.transcoder.initial_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_players_get_distinct_client_ids() {
        let endpoint = DeviceEndpoint::new("cam", Credentials::new("admin", "pw")).unwrap();
        let a = TalkbackPlayer::new(endpoint.clone(), TalkSettings::default());
        let b = TalkbackPlayer::new(endpoint, TalkSettings::default());
        assert_ne!(a.client_id(), b.client_id());
    }
}
