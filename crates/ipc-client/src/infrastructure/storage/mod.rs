//! Persistent storage infrastructure.
//!
//! Currently contains only [`config`]: read-only TOML configuration.

pub mod config;
