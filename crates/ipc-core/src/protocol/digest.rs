//! MD5 digest helpers for both camera login schemes.
//!
//! # Two different digests
//!
//! The control API and the talk channel authenticate differently:
//!
//! - **Control API login**: the client sends `MD5(password ":" nonce)` as a
//!   lowercase hex string, where `nonce` comes from `GET /pc/Content.htm`.
//!   See [`login_digest`].
//!
//! - **MULTITRANS talk channel**: standard HTTP Digest (RFC 2617) without
//!   `qop`.  The camera answers the first request with
//!   `WWW-Authenticate: Digest realm="...", nonce="..."` and the client
//!   resends with
//!
//!   ```text
//!   HA1      = MD5(username ":" realm ":" password)
//!   HA2      = MD5(method ":" uri)
//!   response = MD5(HA1 ":" nonce ":" HA2)
//!   ```
//!
//!   See [`DigestChallenge::response`].
//!
//! All hashes are rendered as 32 lowercase hex characters.

use super::codec::ProtocolError;

/// Returns `MD5(input)` as 32 lowercase hex characters.
pub fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Computes the control-API login digest `MD5(password ":" nonce)`.
///
/// # Examples
///
/// ```rust
/// use ipc_core::protocol::digest::login_digest;
///
/// assert_eq!(login_digest("secret", "abc123"), "9e431c807def5e7fc7e9c873e61e44cf");
/// ```
pub fn login_digest(password: &str, nonce: &str) -> String {
    md5_hex(&format!("{password}:{nonce}"))
}

/// Username and password used to answer a digest challenge.
#[derive(Clone, Copy)]
pub struct DigestCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// The `realm` and `nonce` offered by a `WWW-Authenticate: Digest` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
}

impl DigestChallenge {
    /// Parses the value of a `WWW-Authenticate` header.
    ///
    /// The scheme must be `Digest` (case-insensitive).  Parameters may be
    /// quoted or bare; unknown parameters such as `opaque` or `algorithm` are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedHeader`] if the scheme is not
    /// `Digest`, and [`ProtocolError::MissingField`] if `realm` or `nonce` is
    /// absent.
    pub fn parse(header_value: &str) -> Result<Self, ProtocolError> {
        let trimmed = header_value.trim();
        let params = match trimmed.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("digest") => rest,
            _ => return Err(ProtocolError::MalformedHeader(trimmed.to_string())),
        };

        let mut realm = None;
        let mut nonce = None;
        for (key, value) in parse_auth_params(params) {
            if key.eq_ignore_ascii_case("realm") {
                realm = Some(value);
            } else if key.eq_ignore_ascii_case("nonce") {
                nonce = Some(value);
            }
        }

        Ok(Self {
            realm: realm.ok_or(ProtocolError::MissingField("realm"))?,
            nonce: nonce.ok_or(ProtocolError::MissingField("nonce"))?,
        })
    }

    /// Computes the digest `response` value for `method` and `uri`.
    pub fn response(&self, credentials: DigestCredentials<'_>, method: &str, uri: &str) -> String {
        let ha1 = md5_hex(&format!(
            "{}:{}:{}",
            credentials.username, self.realm, credentials.password
        ));
        let ha2 = md5_hex(&format!("{method}:{uri}"));
        md5_hex(&format!("{ha1}:{}:{ha2}", self.nonce))
    }

    /// Renders a complete `Authorization` header value answering this challenge.
    pub fn authorization(
        &self,
        credentials: DigestCredentials<'_>,
        method: &str,
        uri: &str,
    ) -> String {
        let response = self.response(credentials, method, uri);
        format!(
            r#"Digest username="{}", realm="{}", nonce="{}", uri="{uri}", response="{response}""#,
            credentials.username, self.realm, self.nonce
        )
    }
}

/// Splits `a="x, y", b=z` into `[("a", "x, y"), ("b", "z")]`.
///
/// Commas inside quoted values do not split parameters.
fn parse_auth_params(input: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        // Skip separators between parameters.
        while matches!(chars.peek(), Some(c) if *c == ',' || c.is_whitespace()) {
            chars.next();
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ',' {
                break;
            }
            key.push(c);
            chars.next();
        }
        let key = key.trim().to_string();

        if chars.peek() != Some(&'=') {
            if key.is_empty() {
                break;
            }
            // Bare token with no value.
            continue;
        }
        chars.next(); // '='

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
            value = value.trim().to_string();
        }

        params.push((key, value));
    }

    params
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const CREDS: DigestCredentials<'static> = DigestCredentials {
        username: "admin",
        password: "secret",
    };

    #[test]
    fn test_md5_hex_of_empty_string() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_login_digest_matches_known_vectors() {
        assert_eq!(login_digest("secret", "abc123"), "9e431c807def5e7fc7e9c873e61e44cf");
        assert_eq!(login_digest("admin", "5f3c9a"), "a939f4378d0c21dc1ac625919ef2e013");
    }

    #[test]
    fn test_login_digest_is_lowercase_hex_of_32_chars() {
        let digest = login_digest("pw", "n");
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_parse_challenge_extracts_realm_and_nonce() {
        // Arrange
        let header = r#"Digest realm="CAM", nonce="abc123""#;

        // Act
        let challenge = DigestChallenge::parse(header).unwrap();

        // Assert
        assert_eq!(challenge.realm, "CAM");
        assert_eq!(challenge.nonce, "abc123");
    }

    #[test]
    fn test_parse_challenge_ignores_extra_params_and_case() {
        let header = r#"digest algorithm=MD5, realm="IP Camera, Hall", opaque="zz", nonce=f00d"#;

        let challenge = DigestChallenge::parse(header).unwrap();

        assert_eq!(challenge.realm, "IP Camera, Hall");
        assert_eq!(challenge.nonce, "f00d");
    }

    #[test]
    fn test_parse_challenge_rejects_basic_scheme() {
        let result = DigestChallenge::parse(r#"Basic realm="CAM""#);
        assert!(matches!(result, Err(ProtocolError::MalformedHeader(_))));
    }

    #[test]
    fn test_parse_challenge_without_nonce_is_missing_field() {
        let result = DigestChallenge::parse(r#"Digest realm="CAM""#);
        assert_eq!(result, Err(ProtocolError::MissingField("nonce")));
    }

    #[test]
    fn test_parse_challenge_without_realm_is_missing_field() {
        let result = DigestChallenge::parse(r#"Digest nonce="abc""#);
        assert_eq!(result, Err(ProtocolError::MissingField("realm")));
    }

    #[test]
    fn test_digest_response_matches_known_vector() {
        // Arrange
        let challenge = DigestChallenge {
            realm: "CAM".to_string(),
            nonce: "abc123".to_string(),
        };

        // Act
        let response = challenge.response(CREDS, "MULTITRANS", "rtsp://127.0.0.1/multitrans");

        // Assert: MD5(MD5("admin:CAM:secret") ":abc123:" MD5("MULTITRANS:rtsp://127.0.0.1/multitrans"))
        assert_eq!(response, "4589b0961302c40988aa28002d77521a");
    }

    #[test]
    fn test_digest_response_depends_on_uri() {
        let challenge = DigestChallenge {
            realm: "CAM".to_string(),
            nonce: "abc123".to_string(),
        };

        let response = challenge.response(CREDS, "MULTITRANS", "rtsp://192.168.1.20/multitrans");

        assert_eq!(response, "678940d7cf3f2f971b980f6886e600ba");
    }

    #[test]
    fn test_authorization_header_carries_all_fields() {
        let challenge = DigestChallenge {
            realm: "CAM".to_string(),
            nonce: "abc123".to_string(),
        };

        let header = challenge.authorization(CREDS, "MULTITRANS", "rtsp://127.0.0.1/multitrans");

        assert_eq!(
            header,
            r#"Digest username="admin", realm="CAM", nonce="abc123", uri="rtsp://127.0.0.1/multitrans", response="4589b0961302c40988aa28002d77521a""#
        );
    }
}
