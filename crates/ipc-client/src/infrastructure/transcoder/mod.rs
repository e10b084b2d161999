//! External audio transcoder process.
//!
//! The relay never decodes audio itself.  It starts `ffmpeg` to read the
//! media source in real time, delay it, re-encode it as 8 kHz mono G.711
//! A-law, and push it as RTP datagrams to a loopback UDP port the relay
//! listens on.
//!
//! [`Transcoder`] is the seam between the relay loop and the process so the
//! loop can be tested with a scripted fake.

use std::{io, net::SocketAddr, process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::AsyncReadExt,
    process::{Child, Command},
};
use tracing::{debug, info};

/// Delay applied to both audio channels before encoding.  Gives the camera
/// time to switch its speaker path on after the channel opens.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(2500);

/// How to launch the transcoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscoderConfig {
    /// Executable name or path.
    pub program: String,
    pub initial_delay: Duration,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

/// Builds the ffmpeg argument list for streaming `source` to `sink` as RTP.
///
/// ```rust
/// use std::time::Duration;
/// use ipc_client::infrastructure::transcoder::ffmpeg_args;
///
/// let args = ffmpeg_args("a.mp3", Duration::from_millis(2500), "127.0.0.1:5004".parse().unwrap());
/// assert_eq!(args.last().unwrap(), "rtp://127.0.0.1:5004");
/// ```
pub fn ffmpeg_args(source: &str, initial_delay: Duration, sink: SocketAddr) -> Vec<String> {
    let delay_ms = initial_delay.as_millis();
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-re".to_string(),
        "-i".to_string(),
        source.to_string(),
        "-af".to_string(),
        format!("adelay={delay_ms}|{delay_ms}"),
        "-acodec".to_string(),
        "pcm_alaw".to_string(),
        "-ar".to_string(),
        "8000".to_string(),
        "-ac".to_string(),
        "1".to_string(),
        "-f".to_string(),
        "rtp".to_string(),
        format!("rtp://{sink}"),
    ]
}

/// How a transcoder run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscoderExit {
    /// The process exited on its own with status 0.
    pub success: bool,
    /// Exit code, if the process exited rather than being signalled.
    pub code: Option<i32>,
    /// The process was still running and had to be killed.
    pub killed: bool,
    /// Everything the process wrote to stderr.
    pub stderr: String,
}

impl TranscoderExit {
    /// Returns `true` when the process failed without being asked to stop.
    pub fn is_abnormal(&self) -> bool {
        !self.success && !self.killed
    }
}

/// A running transcoder process.
#[async_trait]
pub trait Transcoder: Send {
    /// Non-blocking liveness check.
    fn has_exited(&mut self) -> io::Result<bool>;

    /// Stops the process if it is still running, collects its stderr, and
    /// reaps it.  Calling it again returns the same result.
    async fn shutdown(&mut self) -> io::Result<TranscoderExit>;
}

/// `ffmpeg` child process.
///
/// Spawned with `kill_on_drop(true)` so the process cannot outlive its
/// handle even if [`Transcoder::shutdown`] is never reached.
pub struct FfmpegTranscoder {
    child: Child,
    exit: Option<TranscoderExit>,
}

impl FfmpegTranscoder {
    /// Starts the transcoder streaming `source` to `sink`.
    ///
    /// # Errors
    ///
    /// Returns the spawn error if the executable cannot be started.
    pub fn spawn(config: &TranscoderConfig, source: &str, sink: SocketAddr) -> io::Result<Self> {
        let args = ffmpeg_args(source, config.initial_delay, sink);
        let transcoder = Self::launch(&config.program, &args)?;
        info!("transcoder started ({}), streaming to {sink}", config.program);
        Ok(transcoder)
    }

    fn launch(program: &str, args: &[String]) -> io::Result<Self> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        debug!("spawned {program} (pid {:?})", child.id());
        Ok(Self { child, exit: None })
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn has_exited(&mut self) -> io::Result<bool> {
        if self.exit.is_some() {
            return Ok(true);
        }
        Ok(self.child.try_wait()?.is_some())
    }

    async fn shutdown(&mut self) -> io::Result<TranscoderExit> {
        if let Some(exit) = &self.exit {
            return Ok(exit.clone());
        }

        let killed = self.child.try_wait()?.is_none();
        if killed {
            debug!("transcoder still running; killing it");
            self.child.start_kill()?;
        }

        let mut stderr = Vec::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            pipe.read_to_end(&mut stderr).await?;
        }
        let status = self.child.wait().await?;

        let exit = TranscoderExit {
            success: status.success(),
            code: status.code(),
            killed,
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        };
        info!("transcoder finished ({status})");
        self.exit = Some(exit.clone());
        Ok(exit)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
