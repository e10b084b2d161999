//! Application layer for the camera client.
//!
//! Coordinates the infrastructure pieces into the two user-facing
//! operations:
//!
//! - **`relay`** – `play_media`: handshake, transcoder, datagram relay, and
//!   unconditional cleanup, all behind a best-effort boundary that never
//!   returns an error to the caller.
//! - **`camera`** – The per-device facade holding one session client and one
//!   talkback player, plus media URL resolution.

pub mod camera;
pub mod relay;
