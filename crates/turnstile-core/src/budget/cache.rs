//! Dirty-tracking boundary cache
//!
//! Consumers that need the current inclusion set repeatedly (a status line, a
//! transcript view) read it through [`BoundaryCache::get_boundary`]. Mutators
//! only record what changed; the allocator runs at most once per read after a
//! change.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::allocator::BudgetAllocator;
use super::params::BudgetParameters;
use super::snapshot::BoundarySnapshot;
use crate::config::{ModelSpec, SendSettings, SettingsPatch};
use crate::tokens::{TurnTokenCache, estimate_text};
use crate::types::ConversationTurn;

/// Why the cached boundary was invalidated
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirtyReason {
    Turns,
    Model,
    Settings,
    Manual(String),
}

impl fmt::Display for DirtyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Turns => f.write_str("turns"),
            Self::Model => f.write_str("model"),
            Self::Settings => f.write_str("settings"),
            Self::Manual(label) => f.write_str(label),
        }
    }
}

/// Cache state
#[derive(Debug, Clone)]
pub enum CacheState {
    Clean(Arc<BoundarySnapshot>),
    Dirty { reasons: BTreeSet<DirtyReason> },
}

/// Memoizing wrapper around [`BudgetAllocator::predict`]
///
/// Owned by a single consumer; mutators take `&mut self`.
#[derive(Debug)]
pub struct BoundaryCache {
    turns: Vec<ConversationTurn>,
    model: ModelSpec,
    settings: SendSettings,
    memo: Arc<TurnTokenCache>,
    state: CacheState,
    recomputes: u64,
}

impl BoundaryCache {
    pub fn new(model: ModelSpec, settings: SendSettings) -> Self {
        let reasons = [DirtyReason::Turns, DirtyReason::Model, DirtyReason::Settings]
            .into_iter()
            .collect();
        Self {
            turns: Vec::new(),
            model,
            settings,
            memo: Arc::new(TurnTokenCache::new()),
            state: CacheState::Dirty { reasons },
            recomputes: 0,
        }
    }

    /// Share a memoization side-table with other allocation consumers
    pub fn with_memo(mut self, memo: Arc<TurnTokenCache>) -> Self {
        self.memo = memo;
        self
    }

    pub fn update_turns(&mut self, turns: Vec<ConversationTurn>) {
        self.turns = turns;
        self.mark_dirty(DirtyReason::Turns);
    }

    pub fn set_model(&mut self, model: ModelSpec) {
        self.model = model;
        self.mark_dirty(DirtyReason::Model);
    }

    pub fn apply_settings(&mut self, patch: &SettingsPatch) {
        self.settings.apply(patch);
        self.mark_dirty(DirtyReason::Settings);
    }

    /// Invalidate the cached boundary, accumulating `reason`
    pub fn mark_dirty(&mut self, reason: DirtyReason) {
        match self.state {
            CacheState::Dirty { ref mut reasons } => {
                reasons.insert(reason);
            }
            CacheState::Clean(_) => {
                self.state = CacheState::Dirty {
                    reasons: BTreeSet::from([reason]),
                };
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.state, CacheState::Dirty { .. })
    }

    pub fn state(&self) -> &CacheState {
        &self.state
    }

    /// Number of allocator passes run so far
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn memo(&self) -> &Arc<TurnTokenCache> {
        &self.memo
    }

    /// Current boundary; recomputes only when dirty
    pub fn get_boundary(&mut self) -> Arc<BoundarySnapshot> {
        let reasons = match self.state {
            CacheState::Clean(ref snapshot) => return Arc::clone(snapshot),
            CacheState::Dirty { ref mut reasons } => std::mem::take(reasons),
        };

        let system_tokens = self
            .settings
            .system_prompt
            .as_deref()
            .map_or(0, |prompt| estimate_text(prompt, self.settings.chars_per_token));
        let params = BudgetParameters::from_model(&self.model, &self.settings, system_tokens);
        let allocator =
            BudgetAllocator::new(self.model.provider.clone()).with_memo(Arc::clone(&self.memo));

        let mut snapshot = allocator.boundary(&self.turns, &params);
        snapshot.stats.dirty_reasons = reasons.iter().map(ToString::to_string).collect();
        self.recomputes += 1;

        tracing::debug!(
            reasons = ?snapshot.stats.dirty_reasons,
            included = snapshot.stats.included_count,
            excluded = snapshot.stats.excluded_count,
            "boundary recomputed"
        );

        let snapshot = Arc::new(snapshot);
        self.state = CacheState::Clean(Arc::clone(&snapshot));
        snapshot
    }
}
