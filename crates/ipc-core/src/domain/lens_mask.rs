//! Privacy-shutter ("lens mask") commands.
//!
//! The camera exposes the shutter as the `lens_mask_info.enabled` field of
//! the `lens_mask` feature:
//!
//! ```json
//! {"method": "get", "lens_mask": {"name": ["lens_mask_info"]}}
//! {"method": "set", "lens_mask": {"lens_mask_info": {"enabled": "on"}}}
//! ```
//!
//! A `get` reply carries `{"error_code": 0, "lens_mask": {"lens_mask_info":
//! {"enabled": "on" | "off"}}}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::protocol::codec::ProtocolError;

/// Whether the privacy shutter covers the lens.
///
/// Serialises as the wire value (`"on"` / `"off"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensMaskState {
    /// Shutter closed: privacy mode enabled.
    On,
    /// Shutter open: the camera is recording.
    Off,
}

impl LensMaskState {
    /// The wire value of the `enabled` field.
    pub fn as_str(self) -> &'static str {
        match self {
            LensMaskState::On => "on",
            LensMaskState::Off => "off",
        }
    }

    pub fn is_on(self) -> bool {
        self == LensMaskState::On
    }
}

impl TryFrom<&str> for LensMaskState {
    type Error = ProtocolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "on" => Ok(LensMaskState::On),
            "off" => Ok(LensMaskState::Off),
            other => Err(ProtocolError::UnexpectedValue {
                field: "lens_mask_info.enabled",
                value: other.to_string(),
            }),
        }
    }
}

/// Payload reading the current shutter state.
pub fn get_payload() -> Value {
    json!({"method": "get", "lens_mask": {"name": ["lens_mask_info"]}})
}

/// Payload moving the shutter to `state`.
pub fn set_payload(state: LensMaskState) -> Value {
    json!({"method": "set", "lens_mask": {"lens_mask_info": {"enabled": state}}})
}

/// Extracts the shutter state from a `get` reply.
///
/// # Errors
///
/// Returns [`ProtocolError::MissingField`] if the `enabled` field is absent
/// or not a string, and [`ProtocolError::UnexpectedValue`] if it is anything
/// other than `"on"` or `"off"`.
pub fn parse_status(response: &Value) -> Result<LensMaskState, ProtocolError> {
    let enabled = response
        .pointer("/lens_mask/lens_mask_info/enabled")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingField("lens_mask.lens_mask_info.enabled"))?;
    LensMaskState::try_from(enabled)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
