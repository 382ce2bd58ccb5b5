//! Stable error identities

use super::types::TurnstileError;

impl TurnstileError {
    /// Stable identifier for programmatic handling and telemetry
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UserPromptTooLarge { .. } => "user_prompt_too_large",
            Self::ContextOverflowAfterTrimming { .. } => "context_overflow_after_trimming",
            Self::ProviderNotRegistered { .. } => "provider_not_registered",
            Self::MissingApiKey { .. } => "missing_api_key",
            Self::Provider { kind, .. } => kind.code(),
            Self::Cancelled => "cancelled",
            Self::Timeout { .. } => "timeout",
            Self::Config { .. } => "config",
            Self::NotFound { .. } => "not_found",
            Self::Io { .. } => "io",
            Self::Json { .. } => "json",
        }
    }

    /// Whether the outcome is a pipeline fault; caller cancellation is not
    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Number of provider attempts made before the failure, when known
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Provider { attempts, .. } => Some(*attempts),
            Self::ContextOverflowAfterTrimming { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderErrorKind;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            TurnstileError::UserPromptTooLarge {
                user_tokens: 150,
                system_tokens: 0,
                max_context: 100,
            },
            TurnstileError::ContextOverflowAfterTrimming {
                attempts: 3,
                trimmed: 2,
            },
            TurnstileError::ProviderNotRegistered {
                provider: "openai".into(),
            },
            TurnstileError::MissingApiKey {
                provider: "openai".into(),
            },
            TurnstileError::Provider {
                kind: ProviderErrorKind::Rate,
                message: "slow down".into(),
                attempts: 1,
            },
            TurnstileError::Cancelled,
            TurnstileError::Timeout { seconds: 30 },
        ];

        let mut codes: Vec<_> = errors.iter().map(|e| e.error_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_cancellation_is_not_a_fault() {
        assert!(!TurnstileError::Cancelled.is_fault());
        assert!(TurnstileError::Timeout { seconds: 5 }.is_fault());
    }

    #[test]
    fn test_provider_code_follows_kind() {
        let error = TurnstileError::Provider {
            kind: ProviderErrorKind::Auth,
            message: "401".into(),
            attempts: 1,
        };
        assert_eq!(error.error_code(), "auth");
        assert_eq!(error.attempts(), Some(1));
    }
}
