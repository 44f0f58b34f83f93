//! Domain model types for tokengate.
//!
//! This module defines the core types used throughout tokengate:
//! - [`Token`] - Opaque bearer credential read from a secret store
//! - [`TargetUri`] - The identity whose token is looked up (e.g. `https://github.com`)
//! - [`ReauthEndpoint`] - A candidate external command that can re-authenticate

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use uuid::Uuid;

use crate::store::Secret;

/// An opaque bearer credential.
///
/// The value is never interpreted. Two tokens are equal when their strings
/// are identical, which is how the gate tells whether re-authentication
/// actually produced a new credential.
///
/// Debug and Display are redacted, like [`Secret`].
#[derive(Clone, PartialEq, Eq)]
pub struct Token(Secret);

impl Token {
    /// Create a token from its raw value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Secret::new(value))
    }

    /// Expose the raw token value.
    ///
    /// Use only when building an authorization header; never log the result.
    pub fn expose(&self) -> &str {
        self.0.expose()
    }

    /// Value for an `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("bearer {}", self.0.expose())
    }
}

impl From<Secret> for Token {
    fn from(secret: Secret) -> Self {
        Self(secret)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token([REDACTED])")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// The identity a token is stored under.
///
/// Normalized to `scheme://host[:port]`; any path, query or trailing slash
/// is dropped, so `https://github.com/` and `https://GitHub.com/login` name
/// the same target.
///
/// # Examples
///
/// ```
/// use tokengate_core::TargetUri;
///
/// let target = TargetUri::parse("https://github.com/").unwrap();
/// assert_eq!(target.as_str(), "https://github.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetUri(String);

impl TargetUri {
    /// Parse and normalize a target URI.
    pub fn parse(uri: &str) -> Result<Self, ParseError> {
        let url = Url::parse(uri).map_err(|e| ParseError::InvalidUri {
            uri: uri.to_string(),
            message: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ParseError::InvalidScheme {
                    expected: "http or https".to_string(),
                    got: other.to_string(),
                });
            }
        }

        let host = url.host_str().ok_or_else(|| ParseError::InvalidUri {
            uri: uri.to_string(),
            message: "missing host".to_string(),
        })?;

        let normalized = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        Ok(Self(normalized))
    }

    /// The well-known GitHub target.
    pub fn github() -> Self {
        Self("https://github.com".to_string())
    }

    /// Get the normalized URI as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Secret store key for this target.
    ///
    /// Keys follow the Git credential store convention: `{namespace}:{target}`,
    /// e.g. `git:https://github.com`.
    pub fn store_key(&self, namespace: &str) -> String {
        format!("{}:{}", namespace, self.0)
    }
}

impl fmt::Display for TargetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TargetUri {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TargetUri> for String {
    fn from(target: TargetUri) -> Self {
        target.0
    }
}

/// A candidate external command that can run an interactive re-authentication.
///
/// Hosts register triggerable actions under a namespace plus a numeric id.
/// The name is only used for logs and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReauthEndpoint {
    /// Human-readable name (e.g. "github-essentials").
    pub name: String,

    /// Command namespace the host registered the action under.
    pub namespace: Uuid,

    /// Command id within the namespace.
    pub id: u32,
}

impl ReauthEndpoint {
    /// Create a new endpoint.
    pub fn new(name: impl Into<String>, namespace: Uuid, id: u32) -> Self {
        Self {
            name: name.into(),
            namespace,
            id,
        }
    }

    /// Connect command of the GitHub Essentials extension.
    pub fn github_essentials() -> Self {
        Self::new(
            "github-essentials",
            Uuid::from_u128(0x8de10943_8643_4f81_88a3_83b81d204ff4),
            0x0110,
        )
    }

    /// Connect command of the GitHub for Visual Studio extension.
    pub fn github_for_visual_studio() -> Self {
        Self::new(
            "github-for-visual-studio",
            Uuid::from_u128(0xc4c91892_8881_4588_a5d9_b41e8f540f5a),
            0x0110,
        )
    }

    /// The GitHub connect commands in priority order.
    pub fn github_defaults() -> Vec<Self> {
        vec![Self::github_essentials(), Self::github_for_visual_studio()]
    }

    /// Dispatch key `(namespace, id)`.
    pub fn key(&self) -> (Uuid, u32) {
        (self.namespace, self.id)
    }
}

impl fmt::Display for ReauthEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{:#06x})", self.name, self.namespace, self.id)
    }
}

/// Error parsing a target URI.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid scheme: expected '{expected}', got '{got}'")]
    InvalidScheme { expected: String, got: String },

    #[error("invalid target uri '{uri}': {message}")]
    InvalidUri { uri: String, message: String },
}
