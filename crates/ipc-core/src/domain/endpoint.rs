//! The device endpoint a client instance is bound to.
//!
//! A [`DeviceEndpoint`] is created once and never changes for the lifetime of
//! the client that owns it.  The host is a bare address (`192.168.1.20` or
//! `cam.local`), never a URL: each protocol adds its own scheme and port.

use std::fmt;

use thiserror::Error;

/// Error returned when an endpoint fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The host string carries a URL scheme such as `http://`.
    #[error("host must not contain a URL scheme: {0:?}")]
    SchemeInHost(String),
    /// The host string is empty.
    #[error("host must not be empty")]
    EmptyHost,
    /// The username is empty.
    #[error("username must not be empty")]
    EmptyUsername,
}

/// Login credentials shared by the control API and the talk channel.
///
/// `Debug` output redacts the password so credentials can appear in logged
/// structs safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Host address plus credentials for one physical camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    host: String,
    credentials: Credentials,
}

impl DeviceEndpoint {
    /// Validates and builds an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::SchemeInHost`] if `host` contains `http://`
    /// or `https://`, [`EndpointError::EmptyHost`] for an empty host, and
    /// [`EndpointError::EmptyUsername`] for an empty username.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ipc_core::{Credentials, DeviceEndpoint};
    ///
    /// let ep = DeviceEndpoint::new("192.168.1.20", Credentials::new("admin", "pw")).unwrap();
    /// assert_eq!(ep.host(), "192.168.1.20");
    /// assert!(DeviceEndpoint::new("http://192.168.1.20", Credentials::new("admin", "pw")).is_err());
    /// ```
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Result<Self, EndpointError> {
        let host = host.into().trim().to_string();
        if host.is_empty() {
            return Err(EndpointError::EmptyHost);
        }
        let lower = host.to_ascii_lowercase();
        if lower.contains("http://") || lower.contains("https://") {
            return Err(EndpointError::SchemeInHost(host));
        }
        if credentials.username.is_empty() {
            return Err(EndpointError::EmptyUsername);
        }
        Ok(Self { host, credentials })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Base URL of the HTTP control API, e.g. `http://192.168.1.20`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.host)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("admin", "secret")
    }

    #[test]
    fn test_new_accepts_bare_ip() {
        let ep = DeviceEndpoint::new("192.168.1.20", creds()).unwrap();
        assert_eq!(ep.host(), "192.168.1.20");
        assert_eq!(ep.base_url(), "http://192.168.1.20");
    }

    #[test]
    fn test_new_trims_whitespace() {
        let ep = DeviceEndpoint::new("  cam.local ", creds()).unwrap();
        assert_eq!(ep.host(), "cam.local");
    }

    #[test]
    fn test_new_rejects_http_scheme() {
        let result = DeviceEndpoint::new("http://192.168.1.20", creds());
        assert_eq!(
            result,
            Err(EndpointError::SchemeInHost("http://192.168.1.20".to_string()))
        );
    }

    #[test]
    fn test_new_rejects_https_scheme_case_insensitively() {
        let result = DeviceEndpoint::new("HTTPS://cam", creds());
        assert!(matches!(result, Err(EndpointError::SchemeInHost(_))));
    }

    #[test]
    fn test_new_rejects_empty_host() {
        assert_eq!(DeviceEndpoint::new("   ", creds()), Err(EndpointError::EmptyHost));
    }

    #[test]
    fn test_new_rejects_empty_username() {
        let result = DeviceEndpoint::new("cam", Credentials::new("", "pw"));
        assert_eq!(result, Err(EndpointError::EmptyUsername));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let text = format!("{:?}", creds());
        assert!(text.contains("admin"));
        assert!(!text.contains("secret"));
    }
}
