//! MULTITRANS request encoding and response parsing.
//!
//! MULTITRANS is a vendor extension method spoken on the camera's RTSP port.
//! Requests and responses use RTSP/1.0 text framing:
//!
//! ```text
//! MULTITRANS rtsp://192.168.1.20/multitrans RTSP/1.0\r\n
//! CSeq: 2\r\n
//! X-Client-UUID: 0b5f...\r\n
//! Session: 12345\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 78\r\n
//! \r\n
//! {"type":"request",...}
//! ```
//!
//! Responses are parsed incrementally: [`MultitransResponse::parse`] returns
//! [`ProtocolError::InsufficientData`] until the header block and the full
//! `Content-Length` body have arrived.

use serde_json::Value;

use super::codec::ProtocolError;

/// Request method for every talk-channel negotiation request.
pub const MULTITRANS_METHOD: &str = "MULTITRANS";

/// Header carrying the per-client instance identifier.
pub const CLIENT_UUID_HEADER: &str = "X-Client-UUID";

/// Largest response (headers + body) accepted from the device.
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Builds the request URI for `host`.
pub fn multitrans_uri(host: &str) -> String {
    format!("rtsp://{host}/multitrans")
}

// ── Request ───────────────────────────────────────────────────────────────────

/// A MULTITRANS request under construction.
#[derive(Debug, Clone)]
pub struct MultitransRequest {
    uri: String,
    cseq: u32,
    headers: Vec<(String, String)>,
    body: Option<(String, Vec<u8>)>,
}

impl MultitransRequest {
    /// Starts a request to `uri` with sequence number `cseq`.
    pub fn new(uri: impl Into<String>, cseq: u32) -> Self {
        Self {
            uri: uri.into(),
            cseq,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Adds an arbitrary header.  Headers are written in insertion order
    /// after `CSeq`.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Tags the request with the client instance identifier.
    pub fn client_id(self, id: impl ToString) -> Self {
        self.header(CLIENT_UUID_HEADER, id.to_string())
    }

    /// Adds an `Authorization` header.
    pub fn authorization(self, value: impl Into<String>) -> Self {
        self.header("Authorization", value)
    }

    /// Adds a `Session` header.
    pub fn session(self, session_id: impl Into<String>) -> Self {
        self.header("Session", session_id)
    }

    /// Attaches `value` as an `application/json` body.
    pub fn json_body(mut self, value: &Value) -> Self {
        self.body = Some(("application/json".to_string(), value.to_string().into_bytes()));
        self
    }

    /// Returns the sequence number of this request.
    pub fn cseq(&self) -> u32 {
        self.cseq
    }

    /// Serialises the request to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut head = format!(
            "{MULTITRANS_METHOD} {} RTSP/1.0\r\nCSeq: {}\r\n",
            self.uri, self.cseq
        );
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        if let Some((content_type, body)) = &self.body {
            head.push_str(&format!(
                "Content-Type: {content_type}\r\nContent-Length: {}\r\n",
                body.len()
            ));
        }
        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        if let Some((_, body)) = &self.body {
            bytes.extend_from_slice(body);
        }
        bytes
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

/// A parsed MULTITRANS (RTSP/1.0) response.
#[derive(Debug, Clone, PartialEq)]
pub struct MultitransResponse {
    pub status_code: u16,
    pub reason: String,
    headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MultitransResponse {
    /// Parses one response from the start of `bytes`.
    ///
    /// Returns the response and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InsufficientData`] – keep reading and retry.
    /// - [`ProtocolError::MessageTooLarge`] – the device sent more than
    ///   [`MAX_RESPONSE_SIZE`] bytes without completing a response.
    /// - Any other variant – the response is malformed.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), ProtocolError> {
        let header_end = match find_subslice(bytes, HEADER_TERMINATOR) {
            Some(pos) => pos,
            None => {
                if bytes.len() > MAX_RESPONSE_SIZE {
                    return Err(ProtocolError::MessageTooLarge {
                        size: bytes.len(),
                        limit: MAX_RESPONSE_SIZE,
                    });
                }
                return Err(ProtocolError::InsufficientData {
                    needed: bytes.len() + 1,
                    available: bytes.len(),
                });
            }
        };

        let head = std::str::from_utf8(&bytes[..header_end])
            .map_err(|_| ProtocolError::MalformedHeader("non UTF-8 header block".to_string()))?;
        let mut lines = head.split("\r\n");

        let status_line = lines.next().unwrap_or_default();
        let (status_code, reason) = parse_status_line(status_line)?;

        let mut headers = Vec::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ProtocolError::MalformedHeader(line.to_string()))?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        let content_length = match lookup(&headers, "Content-Length") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| ProtocolError::InvalidContentLength(raw.to_string()))?,
            None => 0,
        };

        let body_start = header_end + HEADER_TERMINATOR.len();
        let total = body_start + content_length;
        if total > MAX_RESPONSE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: total,
                limit: MAX_RESPONSE_SIZE,
            });
        }
        if bytes.len() < total {
            return Err(ProtocolError::InsufficientData {
                needed: total,
                available: bytes.len(),
            });
        }

        let response = Self {
            status_code,
            reason,
            headers,
            body: bytes[body_start..total].to_vec(),
        };
        Ok((response, total))
    }

    /// Case-insensitive header lookup returning the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }

    /// Returns the `Session` header with any `;timeout=` parameter removed.
    pub fn session_id(&self) -> Option<&str> {
        self.header("Session")
            .map(|raw| raw.split(';').next().unwrap_or(raw).trim())
            .filter(|id| !id.is_empty())
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedJson`] if the body is empty or not
    /// valid JSON.
    pub fn body_json(&self) -> Result<Value, ProtocolError> {
        serde_json::from_slice(&self.body).map_err(|e| ProtocolError::MalformedJson(e.to_string()))
    }
}

fn parse_status_line(line: &str) -> Result<(u16, String), ProtocolError> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !(version.starts_with("RTSP/") || version.starts_with("HTTP/")) {
        return Err(ProtocolError::MalformedStatusLine(line.to_string()));
    }
    let code = parts
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| ProtocolError::MalformedStatusLine(line.to_string()))?;
    let reason = parts.next().unwrap_or_default().trim().to_string();
    Ok((code, reason))
}

fn lookup<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
