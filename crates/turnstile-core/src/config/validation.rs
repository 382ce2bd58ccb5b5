//! Settings validation

use crate::error::{TurnstileError, TurnstileResult};

use super::settings::SendSettings;

/// Longest accepted request timeout (one day)
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 86_400;

/// Rejects settings the pipeline cannot run with
#[derive(Debug, Default)]
pub struct SettingsValidator;

impl SettingsValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate all fields, reporting every problem at once
    pub fn validate(&self, settings: &SendSettings) -> TurnstileResult<()> {
        let mut problems = Vec::new();

        if !settings.chars_per_token.is_finite() || settings.chars_per_token <= 0.0 {
            problems.push(format!(
                "chars_per_token must be a positive number, got {}",
                settings.chars_per_token
            ));
        }
        if settings.max_trim_attempts == 0 {
            problems.push("max_trim_attempts must be at least 1".to_string());
        }
        if settings.request_timeout_secs == 0 {
            problems.push("request_timeout_secs must be greater than 0".to_string());
        } else if settings.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            problems.push(format!(
                "request_timeout_secs must be at most {}, got {}",
                MAX_REQUEST_TIMEOUT_SECS, settings.request_timeout_secs
            ));
        }
        if let Some(temperature) = settings.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                problems.push(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(TurnstileError::config(problems.join("; ")))
        }
    }
}
