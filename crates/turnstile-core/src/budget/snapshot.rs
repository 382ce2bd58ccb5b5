//! Boundary snapshots

use serde::Serialize;

use super::allocator::{Prediction, TurnEstimate};
use super::params::BudgetParameters;
use crate::types::TurnId;

/// Token totals and counts of one allocation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryStats {
    pub included_tokens: usize,
    pub excluded_tokens: usize,
    pub included_count: usize,
    pub excluded_count: usize,
    pub max_context: usize,
    /// History capacity actually applied
    pub max_usable: usize,
    /// Reasons the last cache recompute was triggered; empty outside the cache
    pub dirty_reasons: Vec<String>,
}

/// Inclusion boundary over the transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundarySnapshot {
    pub included: Vec<TurnEstimate>,
    pub excluded: Vec<TurnEstimate>,
    pub stats: BoundaryStats,
}

impl BoundarySnapshot {
    pub fn from_prediction(prediction: Prediction, params: &BudgetParameters) -> Self {
        let excluded_tokens = prediction.excluded.iter().map(|t| t.tokens).sum();
        let stats = BoundaryStats {
            included_tokens: prediction.predicted_tokens,
            excluded_tokens,
            included_count: prediction.predicted.len(),
            excluded_count: prediction.excluded.len(),
            max_context: params.max_context,
            max_usable: prediction.candidate_capacity,
            dirty_reasons: Vec::new(),
        };

        Self {
            included: prediction.predicted,
            excluded: prediction.excluded,
            stats,
        }
    }

    pub fn included_ids(&self) -> Vec<TurnId> {
        self.included.iter().map(|t| t.turn.id).collect()
    }

    /// Total number of turns the boundary was computed over
    pub fn total_count(&self) -> usize {
        self.stats.included_count + self.stats.excluded_count
    }

    /// Short indicator such as `"3/5 included"`
    pub fn label(&self) -> String {
        format!("{}/{} included", self.stats.included_count, self.total_count())
    }
}
