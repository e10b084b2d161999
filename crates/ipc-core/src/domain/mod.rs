//! Domain types for IPC cameras.
//!
//! This module contains pure data and JSON shapes with no infrastructure
//! dependencies: the device endpoint a client is bound to, and the command
//! payloads the camera understands.
//!
//! Code in outer layers (the HTTP session client, the talk-channel
//! handshake) depends on these types, but nothing here depends on them.

/// Device address and login credentials.
pub mod endpoint;

/// Privacy-shutter ("lens mask") commands and status parsing.
pub mod lens_mask;

/// Talk-channel request body, reply parsing, and the client instance id.
pub mod talk;
