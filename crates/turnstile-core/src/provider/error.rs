//! Provider error taxonomy

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification a provider port assigns to every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Invalid, expired or missing credentials
    Auth,
    /// Rate limit or quota exhausted
    Rate,
    /// Connection failure, timeout, malformed transport
    Network,
    /// Remote service failure
    Server,
    /// The request exceeded the model's real context capacity
    Overflow,
}

impl ProviderErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Rate => "rate",
            Self::Network => "network",
            Self::Server => "server",
            Self::Overflow => "overflow",
        }
    }

    /// Classify an HTTP failure for adapter authors
    ///
    /// Status codes decide first; the body is only consulted for the generic
    /// 400 that several services use for context-length rejections. Anything
    /// without a usable status (0, redirects) counts as a transport failure.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::Auth,
            429 => Self::Rate,
            413 => Self::Overflow,
            400 if mentions_context_length(body) => Self::Overflow,
            400..=599 => Self::Server,
            _ => Self::Network,
        }
    }
}

fn mentions_context_length(body: &str) -> bool {
    let body = body.to_lowercase();
    [
        "context_length_exceeded",
        "context length",
        "context window",
        "prompt is too long",
        "maximum context",
        "too many tokens",
    ]
    .iter()
    .any(|needle| body.contains(needle))
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified failure returned by a provider port
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Overflow, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Auth, message)
    }

    pub fn rate(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Rate, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Server, message)
    }

    /// Build from an HTTP status and response body
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(ProviderErrorKind::from_status(status, &body), body)
    }

    pub fn is_overflow(&self) -> bool {
        self.kind == ProviderErrorKind::Overflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(ProviderErrorKind::from_status(401, ""), ProviderErrorKind::Auth);
        assert_eq!(ProviderErrorKind::from_status(403, ""), ProviderErrorKind::Auth);
        assert_eq!(ProviderErrorKind::from_status(429, ""), ProviderErrorKind::Rate);
        assert_eq!(ProviderErrorKind::from_status(413, ""), ProviderErrorKind::Overflow);
        assert_eq!(ProviderErrorKind::from_status(503, ""), ProviderErrorKind::Server);
        assert_eq!(ProviderErrorKind::from_status(404, ""), ProviderErrorKind::Server);
        assert_eq!(ProviderErrorKind::from_status(0, ""), ProviderErrorKind::Network);
    }

    #[test]
    fn test_bad_request_with_context_wording_is_overflow() {
        let error = ProviderError::from_status(
            400,
            r#"{"error":{"code":"context_length_exceeded"}}"#,
        );
        assert!(error.is_overflow());

        let error = ProviderError::from_status(400, "prompt is too long: 210000 tokens");
        assert!(error.is_overflow());

        let error = ProviderError::from_status(400, "invalid temperature");
        assert_eq!(error.kind, ProviderErrorKind::Server);
    }
}
