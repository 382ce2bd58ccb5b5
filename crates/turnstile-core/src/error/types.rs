//! Core error type

use crate::provider::ProviderErrorKind;
use thiserror::Error;

/// Result type alias for Turnstile operations
pub type TurnstileResult<T> = Result<T, TurnstileError>;

/// Main error type for budget allocation and sending
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TurnstileError {
    /// The new outgoing turn plus the system preamble cannot fit in the model
    /// context, regardless of history
    #[error(
        "User prompt too large: {user_tokens} prompt + {system_tokens} system tokens exceed the {max_context}-token context"
    )]
    UserPromptTooLarge {
        user_tokens: usize,
        system_tokens: usize,
        max_context: usize,
    },

    /// History could not be trimmed enough, locally or after provider retries
    #[error("Context overflow after trimming {trimmed} turns in {attempts} attempts")]
    ContextOverflowAfterTrimming { attempts: u32, trimmed: usize },

    /// No provider port is registered for the model's provider
    #[error("Provider not registered: {provider}")]
    ProviderNotRegistered { provider: String },

    /// The provider is registered but has no credentials
    #[error("Missing API key for provider: {provider}")]
    MissingApiKey { provider: String },

    /// A classified failure reported by the provider port
    #[error("Provider error ({kind}) after {attempts} attempts: {message}")]
    Provider {
        kind: ProviderErrorKind,
        message: String,
        attempts: u32,
    },

    /// The send was cancelled by the caller
    #[error("Send was cancelled")]
    Cancelled,

    /// No attempt completed within the configured request timeout
    #[error("Send timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Resource not found (unknown model, image, ...)
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        resource_type: Option<String>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },
}

impl From<std::io::Error> for TurnstileError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for TurnstileError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json {
            message: error.to_string(),
        }
    }
}
