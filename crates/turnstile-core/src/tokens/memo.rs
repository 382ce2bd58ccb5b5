//! Per-turn memoization side-table
//!
//! Text estimates depend only on the ratio and the two text lengths, so an
//! entry is reused only while its key matches exactly. Editing a turn changes
//! the key; callers may also drop an entry explicitly with
//! [`TurnTokenCache::invalidate`].

use crate::types::{ConversationTurn, TurnId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache key: `(chars-per-token, user text length, assistant text length)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoKey {
    chars_per_token_bits: u32,
    user_len: usize,
    assistant_len: usize,
}

impl MemoKey {
    pub fn for_turn(turn: &ConversationTurn, chars_per_token: f32) -> Self {
        let (user_len, assistant_len) = turn.text_lengths();
        Self {
            chars_per_token_bits: chars_per_token.to_bits(),
            user_len,
            assistant_len,
        }
    }
}

/// Memoized text-token estimates keyed by turn id
#[derive(Debug, Default)]
pub struct TurnTokenCache {
    entries: Mutex<HashMap<TurnId, (MemoKey, usize)>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TurnTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a memoized estimate; a key mismatch counts as a miss
    pub fn get(&self, id: &TurnId, key: &MemoKey) -> Option<usize> {
        let found = self
            .entries
            .lock()
            .get(id)
            .and_then(|(stored, tokens)| (stored == key).then_some(*tokens));

        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn insert(&self, id: TurnId, key: MemoKey, tokens: usize) {
        self.entries.lock().insert(id, (key, tokens));
    }

    /// Drop the entry of an edited or deleted turn
    pub fn invalidate(&self, id: &TurnId) -> bool {
        self.entries.lock().remove(id).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mismatch_is_miss() {
        let cache = TurnTokenCache::new();
        let turn = ConversationTurn::new("hello", "world");
        let key = MemoKey::for_turn(&turn, 4.0);
        cache.insert(turn.id, key, 3);

        assert_eq!(cache.get(&turn.id, &key), Some(3));
        assert_eq!(cache.get(&turn.id, &MemoKey::for_turn(&turn, 3.0)), None);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_invalidate() {
        let cache = TurnTokenCache::new();
        let turn = ConversationTurn::new("hello", "world");
        cache.insert(turn.id, MemoKey::for_turn(&turn, 4.0), 3);

        assert!(cache.invalidate(&turn.id));
        assert!(!cache.invalidate(&turn.id));
        assert!(cache.is_empty());
    }
}
