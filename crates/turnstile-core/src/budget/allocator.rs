//! Two-phase history admission
//!
//! Both operations are pure: identical inputs always yield identical
//! selections, and eviction is strictly oldest-first so the included set is a
//! contiguous, newest-anchored suffix of the chronological history.

use serde::Serialize;
use std::sync::Arc;

use super::params::BudgetParameters;
use super::snapshot::BoundarySnapshot;
use crate::error::{TurnstileError, TurnstileResult};
use crate::tokens::{TokenEstimator, TurnTokenCache};
use crate::types::{ConversationTurn, ImageRef, ProviderId, sort_chronologically};

/// A turn paired with its token estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnEstimate {
    pub turn: ConversationTurn,
    pub tokens: usize,
}

/// Result of the prediction phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// History limit applied (HLP)
    pub candidate_capacity: usize,
    /// Admitted turns, oldest first
    pub predicted: Vec<TurnEstimate>,
    /// Turns older than the admission cut, oldest first
    pub excluded: Vec<TurnEstimate>,
    pub predicted_tokens: usize,
}

impl Prediction {
    pub fn is_empty(&self) -> bool {
        self.predicted.is_empty()
    }
}

/// Result of the finalize phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finalized {
    /// Turns to send, oldest first
    pub included: Vec<TurnEstimate>,
    /// Predicted turns evicted locally, oldest first
    pub trimmed: Vec<TurnEstimate>,
    pub user_tokens: usize,
    pub system_tokens: usize,
    pub history_tokens: usize,
    /// History limit applied (HLA)
    pub history_capacity: usize,
    /// `system + user + history`
    pub input_tokens: usize,
    pub remaining_context: usize,
}

/// Selects which historical turns fit inside a capacity envelope
#[derive(Debug, Clone)]
pub struct BudgetAllocator {
    provider: ProviderId,
    memo: Option<Arc<TurnTokenCache>>,
}

impl BudgetAllocator {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            memo: None,
        }
    }

    /// Share a memoization side-table across allocation runs
    pub fn with_memo(mut self, memo: Arc<TurnTokenCache>) -> Self {
        self.memo = Some(memo);
        self
    }

    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    pub fn estimator(&self, params: &BudgetParameters) -> TokenEstimator {
        TokenEstimator::new(self.provider.clone(), params.chars_per_token)
    }

    /// Exact size of the real outgoing turn (text + images)
    pub fn estimate_new_turn(
        &self,
        text: &str,
        images: &[ImageRef],
        params: &BudgetParameters,
    ) -> usize {
        let estimator = self.estimator(params);
        estimator.estimate_text(text) + estimator.estimate_images(images)
    }

    fn estimate(&self, estimator: &TokenEstimator, turn: &ConversationTurn) -> usize {
        match self.memo {
            Some(ref memo) => estimator.estimate_turn_cached(turn, memo),
            None => estimator.estimate_turn(turn),
        }
    }

    /// Admit the newest turns that fit inside `C − URA − system − PARA`
    ///
    /// Walks newest to oldest and stops before the first turn that would
    /// overflow; a turn larger than the whole capacity is never admitted,
    /// which leaves the prediction empty rather than failing.
    pub fn predict(&self, turns: &[ConversationTurn], params: &BudgetParameters) -> Prediction {
        let estimator = self.estimator(params);
        let capacity = params.predicted_history_limit();

        let mut ordered = turns.to_vec();
        sort_chronologically(&mut ordered);

        let mut predicted = Vec::new();
        let mut predicted_tokens = 0;
        let mut admitted_from = ordered.len();

        for (index, turn) in ordered.iter().enumerate().rev() {
            let tokens = self.estimate(&estimator, turn);
            if predicted_tokens + tokens > capacity {
                break;
            }
            predicted_tokens += tokens;
            predicted.push(TurnEstimate {
                turn: turn.clone(),
                tokens,
            });
            admitted_from = index;
        }
        predicted.reverse();

        let excluded = ordered[..admitted_from]
            .iter()
            .map(|turn| TurnEstimate {
                tokens: self.estimate(&estimator, turn),
                turn: turn.clone(),
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            capacity,
            admitted = predicted.len(),
            excluded = excluded.len(),
            predicted_tokens,
            "history prediction"
        );

        Prediction {
            candidate_capacity: capacity,
            predicted,
            excluded,
            predicted_tokens,
        }
    }

    /// Finalize admission for the real outgoing turn
    pub fn finalize(
        &self,
        prediction: &Prediction,
        new_user_text: &str,
        new_images: &[ImageRef],
        params: &BudgetParameters,
    ) -> TurnstileResult<Finalized> {
        let user_tokens = self.estimate_new_turn(new_user_text, new_images, params);
        self.finalize_with_tokens(prediction, user_tokens, params)
    }

    /// Finalize admission when the outgoing turn has already been sized
    ///
    /// Fails with `UserPromptTooLarge` when the turn and the system preamble
    /// alone exceed the context; otherwise evicts the oldest predicted turns
    /// until the history fits `C − user − system − PARA`.
    pub fn finalize_with_tokens(
        &self,
        prediction: &Prediction,
        user_tokens: usize,
        params: &BudgetParameters,
    ) -> TurnstileResult<Finalized> {
        if user_tokens + params.system_tokens > params.max_context {
            return Err(TurnstileError::UserPromptTooLarge {
                user_tokens,
                system_tokens: params.system_tokens,
                max_context: params.max_context,
            });
        }

        let capacity = params.actual_history_limit(user_tokens);
        let mut remaining: &[TurnEstimate] = &prediction.predicted;
        let mut history_tokens: usize = remaining.iter().map(|t| t.tokens).sum();

        while history_tokens > capacity {
            let Some((oldest, rest)) = remaining.split_first() else {
                break;
            };
            history_tokens -= oldest.tokens;
            remaining = rest;
        }

        let trimmed_count = prediction.predicted.len() - remaining.len();
        if history_tokens > capacity {
            return Err(TurnstileError::ContextOverflowAfterTrimming {
                attempts: 0,
                trimmed: trimmed_count,
            });
        }

        if trimmed_count > 0 {
            tracing::debug!(
                trimmed = trimmed_count,
                capacity,
                history_tokens,
                "evicted oldest turns to fit outgoing prompt"
            );
        }

        let input_tokens = params.system_tokens + user_tokens + history_tokens;
        Ok(Finalized {
            included: remaining.to_vec(),
            trimmed: prediction.predicted[..trimmed_count].to_vec(),
            user_tokens,
            system_tokens: params.system_tokens,
            history_tokens,
            history_capacity: capacity,
            input_tokens,
            remaining_context: params.max_context.saturating_sub(input_tokens),
        })
    }

    /// Current inclusion boundary with a zero-length placeholder for the next turn
    pub fn boundary(&self, turns: &[ConversationTurn], params: &BudgetParameters) -> BoundarySnapshot {
        BoundarySnapshot::from_prediction(self.predict(turns, params), params)
    }
}
