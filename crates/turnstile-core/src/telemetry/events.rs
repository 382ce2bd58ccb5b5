//! Telemetry event records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::budget::TurnEstimate;
use crate::error::TurnstileError;
use crate::types::TurnId;

/// Pipeline transition an event marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Preflight,
    Attempt,
    Success,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preflight => "preflight",
            Self::Attempt => "attempt",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Budget numbers in effect for the send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetNumbers {
    pub max_context: usize,
    pub user_request_allowance: usize,
    pub provider_response_reserve: usize,
    pub system_tokens: usize,
    pub user_tokens: usize,
    /// History limit during prediction (HLP)
    pub predicted_capacity: usize,
    /// History limit after sizing the real turn (HLA)
    pub history_capacity: usize,
    /// Estimated input of the request currently selected
    pub input_tokens: usize,
}

/// A selected turn and its estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTurn {
    pub id: TurnId,
    pub tokens: usize,
}

impl From<&TurnEstimate> for SelectedTurn {
    fn from(estimate: &TurnEstimate) -> Self {
        Self {
            id: estimate.turn.id,
            tokens: estimate.tokens,
        }
    }
}

/// Terminal failure details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub code: String,
    pub message: String,
    /// False for caller cancellation
    pub fault: bool,
}

impl From<&TurnstileError> for ErrorSummary {
    fn from(error: &TurnstileError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            fault: error.is_fault(),
        }
    }
}

/// Immutable record emitted at a pipeline transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub kind: EventKind,
    pub model: String,
    /// Attempt index (1-based); zero before the first attempt
    pub attempt: u32,
    pub budget: BudgetNumbers,
    pub selected: Vec<SelectedTurn>,
    /// Turns dropped by local trimming (T_internal)
    pub trimmed_internal: usize,
    /// Turns dropped after provider overflow (T_provider)
    pub trimmed_provider: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorSummary>,
    pub timestamp: DateTime<Utc>,
}

impl TelemetryEvent {
    /// `T_internal + T_provider`
    pub fn trimmed_total(&self) -> usize {
        self.trimmed_internal + self.trimmed_provider
    }
}
