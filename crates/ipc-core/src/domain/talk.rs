//! Talk-channel request body, reply inspection, and client tagging.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::protocol::codec::ProtocolError;

/// Random identifier generated once per client construction and sent on
/// every MULTITRANS request in the `X-Client-UUID` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientInstanceId(Uuid);

impl ClientInstanceId {
    /// Generates a fresh random (v4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientInstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ClientInstanceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ClientInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Body asking the camera for a half-duplex talk channel.
pub fn talk_request_body() -> Value {
    json!({
        "type": "request",
        "seq": 0,
        "params": {"method": "get", "talk": {"mode": "half_duplex"}}
    })
}

/// Finds the `error_code` embedded in a talk-channel reply.
///
/// Firmware versions differ in where they put it: at the top level, or
/// nested under `params`/`result`.  The first `error_code` found in a
/// depth-first walk of nested objects wins.
///
/// # Errors
///
/// Returns [`ProtocolError::MissingField`] if no integer `error_code` exists.
pub fn reply_error_code(reply: &Value) -> Result<i64, ProtocolError> {
    find_error_code(reply).ok_or(ProtocolError::MissingField("error_code"))
}

fn find_error_code(value: &Value) -> Option<i64> {
    let object = value.as_object()?;
    if let Some(code) = object.get("error_code").and_then(Value::as_i64) {
        return Some(code);
    }
    object.values().find_map(find_error_code)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
