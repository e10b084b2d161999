//! ipc-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does ipc-client do? (for beginners)
//!
//! It lets a controller (a home-automation hub, a script, a service) operate
//! two features of a TP-Link IPC camera:
//!
//! 1. The **lens mask** (privacy shutter), through the camera's JSON-over-HTTP
//!    control API.  The [`SessionClient`](infrastructure::api::SessionClient)
//!    logs in with a nonce challenge, caches the session token, and re-logs in
//!    once if the camera reports the token expired.
//! 2. **Talkback** (pushing audio to the camera speaker).  The
//!    [`TalkbackPlayer`](application::relay::TalkbackPlayer) negotiates a
//!    MULTITRANS talk channel with a three-step HTTP-Digest handshake, starts
//!    `ffmpeg` to transcode any source into 8 kHz mono A-law RTP, and relays
//!    each RTP datagram to the camera wrapped in an interleave frame.
//!
//! The [`Camera`](application::camera::Camera) facade pairs both clients for
//! one device.

/// Application layer: the relay pipeline and the per-device facade.
pub mod application;

/// Infrastructure layer: HTTP API, talk-channel handshake, transcoder
/// process, and configuration storage.
pub mod infrastructure;
