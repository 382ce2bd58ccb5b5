//! Per-send settings

use serde::{Deserialize, Serialize};

use crate::tokens::DEFAULT_CHARS_PER_TOKEN;

/// Settings read at the start of each send
///
/// The pipeline clones these when a send starts, so later changes never affect
/// an in-flight attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendSettings {
    /// Tokens reserved for the next user turn before its exact size is known
    pub user_request_allowance: usize,
    /// Tokens withheld for the model's reply
    pub assistant_response_allowance: usize,
    /// Estimation ratio
    pub chars_per_token: f32,
    /// Ceiling on provider attempts within one send
    pub max_trim_attempts: u32,
    /// Deferred cancellation after this many seconds without a completed attempt
    pub request_timeout_secs: u64,
    /// Fixed system preamble sent with every request
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub web_search: bool,
}

impl Default for SendSettings {
    fn default() -> Self {
        Self {
            user_request_allowance: 2_000,
            assistant_response_allowance: 4_096,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            max_trim_attempts: 10,
            request_timeout_secs: 120,
            system_prompt: None,
            temperature: None,
            web_search: false,
        }
    }
}

impl SendSettings {
    pub fn with_user_request_allowance(mut self, tokens: usize) -> Self {
        self.user_request_allowance = tokens;
        self
    }

    pub fn with_assistant_response_allowance(mut self, tokens: usize) -> Self {
        self.assistant_response_allowance = tokens;
        self
    }

    pub fn with_chars_per_token(mut self, ratio: f32) -> Self {
        self.chars_per_token = ratio;
        self
    }

    pub fn with_max_trim_attempts(mut self, attempts: u32) -> Self {
        self.max_trim_attempts = attempts;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.user_request_allowance {
            self.user_request_allowance = v;
        }
        if let Some(v) = patch.assistant_response_allowance {
            self.assistant_response_allowance = v;
        }
        if let Some(v) = patch.chars_per_token {
            self.chars_per_token = v;
        }
        if let Some(v) = patch.max_trim_attempts {
            self.max_trim_attempts = v;
        }
        if let Some(v) = patch.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(ref v) = patch.system_prompt {
            self.system_prompt = Some(v.clone());
        }
        if let Some(v) = patch.temperature {
            self.temperature = Some(v);
        }
        if let Some(v) = patch.web_search {
            self.web_search = v;
        }
    }
}

/// Partial settings update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_request_allowance: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_response_allowance: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chars_per_token: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_trim_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_search: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SendSettings::default();
        assert_eq!(settings.max_trim_attempts, 10);
        assert_eq!(settings.chars_per_token, 4.0);
        assert!(settings.system_prompt.is_none());
    }

    #[test]
    fn test_apply_patch_only_touches_set_fields() {
        let mut settings = SendSettings::default().with_user_request_allowance(500);
        let patch = SettingsPatch {
            max_trim_attempts: Some(3),
            web_search: Some(true),
            ..Default::default()
        };

        settings.apply(&patch);

        assert_eq!(settings.max_trim_attempts, 3);
        assert!(settings.web_search);
        assert_eq!(settings.user_request_allowance, 500);
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result: Result<SettingsPatch, _> = serde_json::from_str(r#"{"max_trim": 3}"#);
        assert!(result.is_err());
    }
}
