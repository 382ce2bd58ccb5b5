//! Send request, phases and report

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::budget::TurnEstimate;
use crate::provider::{ProviderErrorKind, ProviderResponse};
use crate::telemetry::BudgetNumbers;
use crate::types::{ConversationTurn, ImageRef, TurnId};

/// Input to one send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    pub model: String,
    /// Conversation history in any order
    pub history: Vec<ConversationTurn>,
    /// The new outgoing user text
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<ImageRef>,
}

impl SendRequest {
    pub fn new(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            history: Vec::new(),
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_attachment(mut self, image: ImageRef) -> Self {
        self.attachments.push(image);
        self
    }
}

/// Pipeline state for a single send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SendPhase {
    Idle,
    Estimating,
    Predicting,
    LocallyTrimming,
    Sending { attempt: u32 },
    Succeeded,
    Failed,
}

impl fmt::Display for SendPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Estimating => f.write_str("estimating"),
            Self::Predicting => f.write_str("predicting"),
            Self::LocallyTrimming => f.write_str("locally_trimming"),
            Self::Sending { attempt } => write!(f, "sending({attempt})"),
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// How a single provider call ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    Failed {
        kind: ProviderErrorKind,
        message: String,
    },
    Cancelled,
    TimedOut,
}

/// One provider call and the history it carried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendAttempt {
    /// 1-based
    pub index: u32,
    /// History turns sent, oldest first
    pub turn_ids: Vec<TurnId>,
    pub input_tokens: usize,
    pub outcome: AttemptOutcome,
}

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendReport {
    pub response: ProviderResponse,
    /// History turns carried by the successful attempt, oldest first
    pub included: Vec<TurnEstimate>,
    pub attempts: Vec<SendAttempt>,
    pub attempts_used: u32,
    /// Turns evicted by the local trim (T_internal)
    pub trimmed_internal: usize,
    /// Turns dropped after provider overflow (T_provider)
    pub trimmed_provider: usize,
    pub budget: BudgetNumbers,
    /// Ordered phase transitions of this send
    pub phases: Vec<SendPhase>,
}

impl SendReport {
    pub fn trimmed_total(&self) -> usize {
        self.trimmed_internal + self.trimmed_provider
    }

    pub fn included_ids(&self) -> Vec<TurnId> {
        self.included.iter().map(|t| t.turn.id).collect()
    }
}
