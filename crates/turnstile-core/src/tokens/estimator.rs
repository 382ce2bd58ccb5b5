//! Character-ratio token estimator

use super::image::{estimate_dimensions, estimate_image};
use super::memo::{MemoKey, TurnTokenCache};
use crate::types::{ConversationTurn, ImageRef, ProviderId};

/// Common approximation for English text
pub const DEFAULT_CHARS_PER_TOKEN: f32 = 4.0;

/// Estimate tokens for a string: `0` when empty, else `max(1, ceil(chars / ratio))`
///
/// Non-finite or non-positive ratios fall back to [`DEFAULT_CHARS_PER_TOKEN`].
pub fn estimate_text(text: &str, chars_per_token: f32) -> usize {
    if text.is_empty() {
        return 0;
    }
    let ratio = sanitize_ratio(chars_per_token);
    let chars = text.chars().count() as f64;
    ((chars / f64::from(ratio)).ceil() as usize).max(1)
}

fn sanitize_ratio(chars_per_token: f32) -> f32 {
    if chars_per_token.is_finite() && chars_per_token > 0.0 {
        chars_per_token
    } else {
        DEFAULT_CHARS_PER_TOKEN
    }
}

/// Token estimator bound to a provider and a chars-per-token ratio
#[derive(Debug, Clone, PartialEq)]
pub struct TokenEstimator {
    chars_per_token: f32,
    provider: ProviderId,
}

impl TokenEstimator {
    pub fn new(provider: ProviderId, chars_per_token: f32) -> Self {
        Self {
            chars_per_token: sanitize_ratio(chars_per_token),
            provider,
        }
    }

    /// Estimator with the default ratio for `provider`
    pub fn for_provider(provider: ProviderId) -> Self {
        Self::new(provider, DEFAULT_CHARS_PER_TOKEN)
    }

    pub fn chars_per_token(&self) -> f32 {
        self.chars_per_token
    }

    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    pub fn estimate_text(&self, text: &str) -> usize {
        estimate_text(text, self.chars_per_token)
    }

    pub fn estimate_image(&self, width: Option<u32>, height: Option<u32>) -> usize {
        estimate_image(width, height, &self.provider)
    }

    /// Sum of image estimates using recorded dimensions
    pub fn estimate_images(&self, images: &[ImageRef]) -> usize {
        images
            .iter()
            .map(|image| estimate_dimensions(image.dimensions, &self.provider))
            .sum()
    }

    /// Estimate a whole turn: user text + assistant text + images
    pub fn estimate_turn(&self, turn: &ConversationTurn) -> usize {
        self.text_tokens(turn) + self.estimate_images(&turn.images)
    }

    /// Same as [`estimate_turn`](Self::estimate_turn), consulting and
    /// populating `cache` for the text part
    pub fn estimate_turn_cached(&self, turn: &ConversationTurn, cache: &TurnTokenCache) -> usize {
        let key = MemoKey::for_turn(turn, self.chars_per_token);
        let text = match cache.get(&turn.id, &key) {
            Some(tokens) => tokens,
            None => {
                let tokens = self.text_tokens(turn);
                cache.insert(turn.id, key, tokens);
                tokens
            }
        };
        text + self.estimate_images(&turn.images)
    }

    fn text_tokens(&self, turn: &ConversationTurn) -> usize {
        self.estimate_text(&turn.user_text) + self.estimate_text(&turn.assistant_text)
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::for_provider(ProviderId::Other("default".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_text_rounding() {
        assert_eq!(estimate_text("", 4.0), 0);
        assert_eq!(estimate_text("a", 4.0), 1);
        assert_eq!(estimate_text("abcd", 4.0), 1);
        assert_eq!(estimate_text("abcde", 4.0), 2);
        assert_eq!(estimate_text(&"a".repeat(100), 4.0), 25);
    }

    #[test]
    fn test_estimate_text_bad_ratio_falls_back() {
        assert_eq!(estimate_text(&"a".repeat(100), 0.0), 25);
        assert_eq!(estimate_text(&"a".repeat(100), f32::NAN), 25);
        assert_eq!(estimate_text(&"a".repeat(100), -2.0), 25);
    }

    #[test]
    fn test_smaller_ratio_estimates_more() {
        let text = "This is a test message with some content.";
        assert!(estimate_text(text, 3.5) >= estimate_text(text, 4.0));
    }

    #[test]
    fn test_estimate_turn_includes_images() {
        let estimator = TokenEstimator::for_provider(ProviderId::Anthropic);
        let turn = ConversationTurn::new("a".repeat(40), "b".repeat(40))
            .with_image(ImageRef::new("img-1").with_dimensions(1000, 750))
            .with_image(ImageRef::new("img-2"));

        assert_eq!(estimator.estimate_turn(&turn), 10 + 10 + 1000);
    }

    #[test]
    fn test_cached_estimate_matches_uncached() {
        let estimator = TokenEstimator::for_provider(ProviderId::OpenAi);
        let cache = TurnTokenCache::new();
        let turn = ConversationTurn::new("question ".repeat(30), "answer ".repeat(50))
            .with_image(ImageRef::new("img").with_dimensions(1024, 1024));

        let plain = estimator.estimate_turn(&turn);
        assert_eq!(estimator.estimate_turn_cached(&turn, &cache), plain);
        assert_eq!(estimator.estimate_turn_cached(&turn, &cache), plain);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_edited_turn_misses_cache() {
        let estimator = TokenEstimator::default();
        let cache = TurnTokenCache::new();
        let mut turn = ConversationTurn::new("short", "reply");
        estimator.estimate_turn_cached(&turn, &cache);

        turn.edit_user_text("a much longer question than before");
        let tokens = estimator.estimate_turn_cached(&turn, &cache);

        assert_eq!(tokens, estimator.estimate_turn(&turn));
        assert_eq!(cache.misses(), 2);
    }
}
