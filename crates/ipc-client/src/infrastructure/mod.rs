//! Infrastructure layer for the camera client.
//!
//! Contains everything that touches the network, a child process, or the
//! file system.
//!
//! # Sub-modules
//!
//! - **`api`** – The HTTP session client for the JSON control API: nonce
//!   login, token caching, the single retry on token expiry, and lens-mask
//!   commands.  HTTP itself sits behind the `ApiTransport` trait so the
//!   session logic can be tested without a camera.
//!
//! - **`talk`** – The MULTITRANS digest handshake, modelled as an explicit
//!   state machine over one TCP connection.  It yields an authenticated
//!   socket or closes it; a half-negotiated socket never escapes.
//!
//! - **`transcoder`** – The `Transcoder` trait and its `ffmpeg` child-process
//!   implementation.
//!
//! - **`storage`** – TOML configuration loading.

pub mod api;
pub mod storage;
pub mod talk;
pub mod transcoder;
