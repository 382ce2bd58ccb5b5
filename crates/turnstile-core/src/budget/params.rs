//! Per-send budget parameters

use serde::{Deserialize, Serialize};

use crate::config::{ModelSpec, SendSettings};

/// Capacity envelope for one allocation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetParameters {
    /// Model capacity (C)
    pub max_context: usize,
    /// Tokens reserved for the next user turn during prediction (URA)
    pub user_request_allowance: usize,
    /// Provider-specific response reserve (PARA); zero when folded
    pub provider_response_reserve: usize,
    /// Estimated size of the fixed system preamble
    pub system_tokens: usize,
    pub chars_per_token: f32,
}

impl BudgetParameters {
    /// Derive parameters from the catalog entry and the settings snapshot
    pub fn from_model(model: &ModelSpec, settings: &SendSettings, system_tokens: usize) -> Self {
        Self {
            max_context: model.max_context,
            user_request_allowance: settings.user_request_allowance,
            provider_response_reserve: model
                .response_reserve(settings.assistant_response_allowance),
            system_tokens,
            chars_per_token: settings.chars_per_token,
        }
    }

    /// History limit during prediction (HLP)
    pub fn predicted_history_limit(&self) -> usize {
        self.max_context
            .saturating_sub(self.user_request_allowance)
            .saturating_sub(self.system_tokens)
            .saturating_sub(self.provider_response_reserve)
    }

    /// History limit once the real turn size is known (HLA)
    pub fn actual_history_limit(&self, user_tokens: usize) -> usize {
        self.max_context
            .saturating_sub(user_tokens)
            .saturating_sub(self.system_tokens)
            .saturating_sub(self.provider_response_reserve)
    }
}
