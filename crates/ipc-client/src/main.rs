//! `ipc-ctl`: command-line control for a TP-Link IPC camera.
//!
//! # Usage
//!
//! ```text
//! ipc-ctl [OPTIONS] <COMMAND>
//!
//! Commands:
//!   lens-mask status|on|off   Read or change the privacy shutter
//!   play <MEDIA>              Play a media URL through the camera speaker
//!   check                     Verify host and credentials
//!
//! Options:
//!   --config <PATH>      Config file [default: platform config dir]
//!   --host <HOST>        Camera host or IP               [env: IPC_HOST]
//!   --username <USER>    Camera account                  [env: IPC_USERNAME]
//!   --password <PASS>    Camera password                 [env: IPC_PASSWORD]
//!   --log-level <LEVEL>  error|warn|info|debug|trace
//! ```
//!
//! Values given on the command line override the config file.  The password
//! is never read from the config file.  `RUST_LOG`, when set, overrides the
//! log level entirely.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ipc_client::{
    application::{
        camera::{resolve_media_url, Camera},
        relay::TalkSettings,
    },
    infrastructure::{
        api::HttpTimeouts,
        storage::config::{load_config, load_config_from, AppConfig},
    },
};
use ipc_core::{Credentials, DeviceEndpoint, LensMaskState};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Lens-mask control and speaker playback for TP-Link IPC cameras.
#[derive(Debug, Parser)]
#[command(name = "ipc-ctl", version)]
struct Cli {
    /// Path to an `ipc.toml` file.  Must exist when given.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Camera host name or IP address, without a scheme.
    #[arg(long, global = true, env = "IPC_HOST")]
    host: Option<String>,

    /// Camera account name.
    #[arg(long, global = true, env = "IPC_USERNAME")]
    username: Option<String>,

    /// Camera account password.
    #[arg(long, global = true, env = "IPC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log level filter; overrides `[logging] level`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read or change the privacy shutter.
    LensMask {
        #[arg(value_enum)]
        action: LensMaskAction,
    },
    /// Play a media URL through the camera speaker.
    Play {
        /// Absolute URL, or a `/path` resolved against `--base-url`.
        media: String,
        /// Base URL for `/path` media references; overrides `[media] base_url`.
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Log in and read the lens mask to verify host and credentials.
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LensMaskAction {
    Status,
    On,
    Off,
}

/// Everything needed to build a [`Camera`], after merging CLI and file.
#[derive(Debug)]
struct Settings {
    endpoint: DeviceEndpoint,
    timeouts: HttpTimeouts,
    talk: TalkSettings,
    media_base_url: Option<String>,
}

impl Cli {
    /// Log level from the CLI, else from the config file.
    fn log_level(&self, config: &AppConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.logging.level.clone())
    }

    /// Merges CLI values over `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if no host or password is available, or if the host
    /// fails endpoint validation.
    fn settings(&self, config: &AppConfig) -> anyhow::Result<Settings> {
        let host = self
            .host
            .clone()
            .or_else(|| config.device.host.clone())
            .context("no camera host: pass --host, set IPC_HOST, or set [device] host")?;
        let username = self
            .username
            .clone()
            .unwrap_or_else(|| config.device.username.clone());
        let password = self
            .password
            .clone()
            .context("no camera password: pass --password or set IPC_PASSWORD")?;

        let endpoint = DeviceEndpoint::new(host, Credentials::new(username, password))
            .context("invalid device endpoint")?;

        let media_base_url = match &self.command {
            Command::Play { base_url: Some(url), .. } => Some(url.clone()),
            _ => config.media.base_url.clone(),
        };

        Ok(Settings {
            endpoint,
            timeouts: HttpTimeouts {
                connect: config.api.connect_timeout(),
                request: config.api.request_timeout(),
            },
            talk: TalkSettings::from(&config.talk),
            media_base_url,
        })
    }
}

fn read_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => load_config().context("failed to load config"),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = read_config(&cli)?;

    // `RUST_LOG` wins; otherwise the CLI/config level applies.
    let level = cli.log_level(&config);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let settings = cli.settings(&config)?;
    info!("ipc-ctl targeting {}", settings.endpoint.host());

    let mut camera = Camera::new(settings.endpoint, settings.timeouts, settings.talk)?;

    match cli.command {
        Command::LensMask { action: LensMaskAction::Status } => {
            let state = camera.lens_mask().await?;
            println!("{}", state.as_str());
        }
        Command::LensMask { action } => {
            let state = if action == LensMaskAction::On {
                LensMaskState::On
            } else {
                LensMaskState::Off
            };
            let response = camera.set_lens_mask(state).await?;
            if !response.is_success() {
                bail!("camera rejected lens mask change (error_code {})", response.error_code);
            }
            println!("lens mask {}", state.as_str());
        }
        Command::Play { media, .. } => {
            let url = resolve_media_url(&media, settings.media_base_url.as_deref())?;
            tokio::select! {
                result = camera.try_play_media(&url) => {
                    let stats = result?;
                    println!("played {} datagrams ({} bytes)", stats.datagrams, stats.bytes);
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.context("failed to listen for Ctrl+C")?;
                    info!("received Ctrl+C; stopping playback");
                }
            }
        }
        Command::Check => {
            let state = camera.check_connection().await?;
            println!("ok: {} reachable, lens mask {}", camera.endpoint().host(), state.as_str());
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("ipc-ctl").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_parses_lens_mask_actions() {
        for (arg, expected) in [
            ("status", LensMaskAction::Status),
            ("on", LensMaskAction::On),
            ("off", LensMaskAction::Off),
        ] {
            let cli = parse(&["lens-mask", arg]);
            assert!(matches!(cli.command, Command::LensMask { action } if action == expected));
        }
    }

    #[test]
    fn test_cli_rejects_unknown_lens_mask_action() {
        let result = Cli::try_parse_from(["ipc-ctl", "lens-mask", "toggle"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_play_with_base_url() {
        let cli = parse(&["play", "/api/a.mp3", "--base-url", "http://hub:8123"]);
        match cli.command {
            Command::Play { media, base_url } => {
                assert_eq!(media, "/api/a.mp3");
                assert_eq!(base_url.as_deref(), Some("http://hub:8123"));
            }
            other => panic!("expected play, got {other:?}"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = parse(&["check", "--host", "10.0.0.9", "--password", "pw"]);
        assert_eq!(cli.host.as_deref(), Some("10.0.0.9"));
        assert_eq!(cli.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_settings_cli_overrides_config() {
        // Arrange
        let mut config = AppConfig::default();
        config.device.host = Some("192.168.1.20".to_string());
        config.device.username = "operator".to_string();
        config.talk.control_port = 8554;
        config.api.request_timeout_secs = 3;
        let cli = parse(&["--host", "10.0.0.9", "--password", "pw", "check"]);

        // Act
        let settings = cli.settings(&config).unwrap();

        // Assert
        assert_eq!(settings.endpoint.host(), "10.0.0.9");
        assert_eq!(settings.endpoint.credentials().username, "operator");
        assert_eq!(settings.talk.control_port, 8554);
        assert_eq!(settings.timeouts.request, Duration::from_secs(3));
    }

    #[test]
    fn test_settings_falls_back_to_config_host() {
        let mut config = AppConfig::default();
        config.device.host = Some("cam.local".to_string());
        let cli = parse(&["--password", "pw", "check"]);

        let settings = cli.settings(&config).unwrap();

        assert_eq!(settings.endpoint.host(), "cam.local");
        assert_eq!(settings.endpoint.credentials().username, "admin");
    }

    #[test]
    fn test_settings_without_host_is_error() {
        let cli = Cli {
            config: None,
            host: None,
            username: None,
            password: Some("pw".to_string()),
            log_level: None,
            command: Command::Check,
        };

        let result = cli.settings(&AppConfig::default());

        assert!(result.is_err());
    }

    #[test]
    fn test_settings_without_password_is_error() {
        let cli = Cli {
            config: None,
            host: Some("cam".to_string()),
            username: None,
            password: None,
            log_level: None,
            command: Command::Check,
        };

        let result = cli.settings(&AppConfig::default());

        assert!(result.is_err());
    }

    #[test]
    fn test_settings_rejects_host_with_scheme() {
        let cli = Cli {
            config: None,
            host: Some("http://cam".to_string()),
            username: None,
            password: Some("pw".to_string()),
            log_level: None,
            command: Command::Check,
        };

        assert!(cli.settings(&AppConfig::default()).is_err());
    }

    #[test]
    fn test_play_base_url_overrides_config() {
        let mut config = AppConfig::default();
        config.media.base_url = Some("http://from-config".to_string());
        let cli = Cli {
            config: None,
            host: Some("cam".to_string()),
            username: None,
            password: Some("pw".to_string()),
            log_level: None,
            command: Command::Play {
                media: "/a.mp3".to_string(),
                base_url: Some("http://from-cli".to_string()),
            },
        };

        let settings = cli.settings(&config).unwrap();

        assert_eq!(settings.media_base_url.as_deref(), Some("http://from-cli"));
    }

    #[test]
    fn test_log_level_prefers_cli() {
        let mut config = AppConfig::default();
        config.logging.level = "warn".to_string();
        let cli = Cli {
            config: None,
            host: None,
            username: None,
            password: None,
            log_level: Some("debug".to_string()),
            command: Command::Check,
        };

        assert_eq!(cli.log_level(&config), "debug");
        assert_eq!(
            Cli { log_level: None, ..cli }.log_level(&config),
            "warn"
        );
    }
}
