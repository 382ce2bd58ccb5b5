//! Constructor methods for TurnstileError

use super::types::TurnstileError;
use crate::provider::ProviderError;
use crate::types::ProviderId;

impl TurnstileError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_type: None,
        }
    }

    /// Create a not found error with resource type
    pub fn not_found_resource(message: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_type: Some(resource_type.into()),
        }
    }

    /// Create an IO error with the offending path
    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn provider_not_registered(provider: &ProviderId) -> Self {
        Self::ProviderNotRegistered {
            provider: provider.to_string(),
        }
    }

    pub fn missing_api_key(provider: &ProviderId) -> Self {
        Self::MissingApiKey {
            provider: provider.to_string(),
        }
    }

    /// Wrap a classified provider failure together with the attempts used so far
    pub fn from_provider(error: ProviderError, attempts: u32) -> Self {
        Self::Provider {
            kind: error.kind,
            message: error.message,
            attempts,
        }
    }
}
