//! Per-send bookkeeping shared by the phases and the retry loop

use chrono::Utc;
use std::sync::Arc;

use super::types::{SendAttempt, SendPhase};
use crate::budget::TurnEstimate;
use crate::error::TurnstileError;
use crate::telemetry::{
    BudgetNumbers, ErrorSummary, EventKind, SelectedTurn, TelemetryEvent, TelemetrySink,
};

/// Current state of one send, mirrored into every telemetry event
pub(super) struct SendTrace {
    model: String,
    sink: Option<Arc<dyn TelemetrySink>>,
    pub(super) phases: Vec<SendPhase>,
    pub(super) budget: BudgetNumbers,
    pub(super) attempt: u32,
    pub(super) selected: Vec<SelectedTurn>,
    pub(super) trimmed_internal: usize,
    pub(super) trimmed_provider: usize,
    pub(super) attempts: Vec<SendAttempt>,
}

impl SendTrace {
    pub(super) fn new(model: impl Into<String>, sink: Option<Arc<dyn TelemetrySink>>) -> Self {
        Self {
            model: model.into(),
            sink,
            phases: vec![SendPhase::Idle],
            budget: BudgetNumbers::default(),
            attempt: 0,
            selected: Vec::new(),
            trimmed_internal: 0,
            trimmed_provider: 0,
            attempts: Vec::new(),
        }
    }

    pub(super) fn enter(&mut self, phase: SendPhase) {
        tracing::trace!(phase = %phase, "send phase");
        self.phases.push(phase);
    }

    /// Record the history about to be sent and the resulting input size
    pub(super) fn select(&mut self, turns: &[TurnEstimate]) {
        self.selected = turns.iter().map(SelectedTurn::from).collect();
        self.budget.input_tokens = self.budget.system_tokens
            + self.budget.user_tokens
            + turns.iter().map(|t| t.tokens).sum::<usize>();
    }

    pub(super) fn trimmed_total(&self) -> usize {
        self.trimmed_internal + self.trimmed_provider
    }

    pub(super) fn emit(&self, kind: EventKind, error: Option<&TurnstileError>) {
        let Some(sink) = &self.sink else {
            return;
        };
        sink.emit(&TelemetryEvent {
            kind,
            model: self.model.clone(),
            attempt: self.attempt,
            budget: self.budget,
            selected: self.selected.clone(),
            trimmed_internal: self.trimmed_internal,
            trimmed_provider: self.trimmed_provider,
            error: error.map(ErrorSummary::from),
            timestamp: Utc::now(),
        });
    }

    pub(super) fn succeed(&mut self) {
        self.enter(SendPhase::Succeeded);
        self.emit(EventKind::Success, None);
    }

    /// Close the send with its single terminal error event
    pub(super) fn fail(&mut self, error: TurnstileError) -> TurnstileError {
        self.enter(SendPhase::Failed);
        if error.is_fault() {
            tracing::warn!(
                code = error.error_code(),
                attempt = self.attempt,
                trimmed = self.trimmed_total(),
                error = %error,
                "send failed"
            );
        } else {
            tracing::info!(attempt = self.attempt, "send cancelled");
        }
        self.emit(EventKind::Error, Some(&error));
        error
    }
}
