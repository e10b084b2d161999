//! # ipc-core
//!
//! Shared library for talking to TP-Link IPC cameras.  It contains the
//! authentication math, the MULTITRANS wire format, the interleave frame
//! codec, and the domain types used by the control API.
//!
//! This crate has zero dependencies on sockets, processes, or async runtimes.
//! Everything here is a pure function over bytes, strings, or JSON values, so
//! it can be tested without a camera on the network.
//!
//! # Architecture overview (for beginners)
//!
//! A TP-Link IPC camera exposes two unrelated protocols:
//!
//! - A **JSON-over-HTTP control API**.  A client fetches a one-time *nonce*,
//!   proves it knows the password by sending `MD5(password ":" nonce)`, and
//!   receives a session token (`stok`).  Every later command is posted to
//!   `/stok=<token>/ds`.
//!
//! - A **MULTITRANS talk channel** on the RTSP port.  The client performs an
//!   HTTP-Digest handshake over a raw TCP connection, asks the camera to open
//!   a half-duplex talk channel, and then pushes audio over the same socket
//!   wrapped in small binary *interleave frames*.
//!
//! This crate is split into two modules:
//!
//! - **`protocol`** – How bytes travel over the network: digest hashing,
//!   MULTITRANS request/response text, and interleave frames.
//!
//! - **`domain`** – The device endpoint (host + credentials) and the JSON
//!   payloads that describe lens-mask and talk-channel commands.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `ipc_core::DeviceEndpoint` instead of `ipc_core::domain::endpoint::DeviceEndpoint`.
pub use domain::endpoint::{Credentials, DeviceEndpoint, EndpointError};
pub use domain::lens_mask::LensMaskState;
pub use domain::talk::ClientInstanceId;
pub use protocol::codec::ProtocolError;
pub use protocol::interleave::InterleaveFrame;
