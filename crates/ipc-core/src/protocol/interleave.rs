//! Binary interleave framing for media sent over the MULTITRANS socket.
//!
//! Wire format:
//! ```text
//! [marker:1 = '$'][channel:1][length:2][payload:N]
//! ```
//! `length` is the payload size as a big-endian `u16`.  Once the talk channel
//! is open, every RTP datagram produced by the transcoder is wrapped in one
//! frame on [`TALK_CHANNEL_ID`] and written to the socket as-is.  Frames are
//! never merged, split, or reordered.

use super::codec::ProtocolError;

/// First byte of every interleave frame.
pub const INTERLEAVE_MARKER: u8 = b'$';

/// Channel id used for the half-duplex talk (speaker) stream.
pub const TALK_CHANNEL_ID: u8 = 1;

/// Size of the fixed frame header preceding the payload.
pub const INTERLEAVE_HEADER_SIZE: usize = 4;

/// One decoded interleave frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterleaveFrame {
    pub channel: u8,
    pub payload: Vec<u8>,
}

impl InterleaveFrame {
    /// Encodes `payload` into `buf` as a frame on `channel`.
    ///
    /// `buf` is cleared first so a single allocation can be reused for every
    /// datagram in a relay session.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] if `payload` is longer than
    /// `u16::MAX` bytes.
    pub fn encode_into(channel: u8, payload: &[u8], buf: &mut Vec<u8>) -> Result<(), ProtocolError> {
        let len = u16::try_from(payload.len())
            .map_err(|_| ProtocolError::PayloadTooLarge(payload.len()))?;

        buf.clear();
        buf.reserve(INTERLEAVE_HEADER_SIZE + payload.len());
        buf.push(INTERLEAVE_MARKER);
        buf.push(channel);
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(payload);
        Ok(())
    }

    /// Encodes `payload` as a new frame on `channel`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ipc_core::protocol::interleave::{InterleaveFrame, TALK_CHANNEL_ID};
    ///
    /// let bytes = InterleaveFrame::encode(TALK_CHANNEL_ID, &[0xAA, 0xBB]).unwrap();
    /// assert_eq!(bytes, vec![b'$', 1, 0x00, 0x02, 0xAA, 0xBB]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] if `payload` is longer than
    /// `u16::MAX` bytes.
    pub fn encode(channel: u8, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let mut buf = Vec::new();
        Self::encode_into(channel, payload, &mut buf)?;
        Ok(buf)
    }

    /// Decodes one frame from the start of `bytes`.
    ///
    /// Returns the frame and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InsufficientData`] if `bytes` does not yet
    /// contain a whole frame, or [`ProtocolError::InvalidMarker`] if the first
    /// byte is not `$`.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), ProtocolError> {
        if bytes.len() < INTERLEAVE_HEADER_SIZE {
            return Err(ProtocolError::InsufficientData {
                needed: INTERLEAVE_HEADER_SIZE,
                available: bytes.len(),
            });
        }
        if bytes[0] != INTERLEAVE_MARKER {
            return Err(ProtocolError::InvalidMarker(bytes[0]));
        }

        let len = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        let total = INTERLEAVE_HEADER_SIZE + len;
        if bytes.len() < total {
            return Err(ProtocolError::InsufficientData {
                needed: total,
                available: bytes.len(),
            });
        }

        let frame = Self {
            channel: bytes[1],
            payload: bytes[INTERLEAVE_HEADER_SIZE..total].to_vec(),
        };
        Ok((frame, total))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
