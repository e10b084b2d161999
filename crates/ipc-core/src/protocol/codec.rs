//! Error type shared by every parser in the protocol module.
//!
//! The MULTITRANS response parser works on a growing receive buffer: when the
//! bytes seen so far do not yet contain a complete response it returns
//! [`ProtocolError::InsufficientData`], and the caller reads more bytes from
//! the socket before trying again.  Every other variant means the peer sent
//! something that can never become a valid message.

use thiserror::Error;

/// Errors that can occur while encoding or decoding protocol data.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice does not yet hold a complete message.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The first line of a response is not `RTSP/1.0 <code> <reason>`.
    #[error("malformed status line: {0:?}")]
    MalformedStatusLine(String),

    /// A header line has no `:` separator or is not valid UTF-8.
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    /// The `Content-Length` header is not a non-negative integer.
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    /// The response grew past the maximum size accepted from the device.
    #[error("message too large: {size} bytes exceeds limit of {limit}")]
    MessageTooLarge { size: usize, limit: usize },

    /// An interleave payload does not fit in the 16-bit length field.
    #[error("payload too large for interleave frame: {0} bytes")]
    PayloadTooLarge(usize),

    /// The first byte of an interleave frame is not the `$` marker.
    #[error("invalid interleave marker: 0x{0:02X}")]
    InvalidMarker(u8),

    /// A JSON body could not be parsed.
    #[error("malformed JSON body: {0}")]
    MalformedJson(String),

    /// A required field is absent from a JSON body or header set.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but holds a value outside the accepted set.
    #[error("unexpected value for {field}: {value}")]
    UnexpectedValue { field: &'static str, value: String },
}
