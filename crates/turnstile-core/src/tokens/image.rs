//! Provider-specific image token formulas

use crate::types::{ImageDimensions, ProviderId};

/// Minimum token estimate for any non-empty image
pub const MIN_IMAGE_TOKENS: usize = 85;

const ANTHROPIC_MAX_EDGE: f64 = 1568.0;
const PIXELS_PER_TOKEN: f64 = 750.0;

const OPENAI_MAX_EDGE: f64 = 2048.0;
const OPENAI_SHORT_EDGE: f64 = 768.0;
const OPENAI_TILE: f64 = 512.0;
const OPENAI_BASE_TOKENS: usize = 85;
const OPENAI_TILE_TOKENS: usize = 170;

const GOOGLE_TILE: f64 = 768.0;
const GOOGLE_TILE_TOKENS: usize = 258;

/// Estimate the tokens an image of the given size costs for `provider`
///
/// Missing or zero dimensions estimate to zero.
pub fn estimate_image(width: Option<u32>, height: Option<u32>, provider: &ProviderId) -> usize {
    let (Some(width), Some(height)) = (width, height) else {
        return 0;
    };
    if width == 0 || height == 0 {
        return 0;
    }

    let (w, h) = (f64::from(width), f64::from(height));
    match provider {
        ProviderId::Anthropic => anthropic(w, h),
        ProviderId::OpenAi => openai(w, h),
        ProviderId::Google => google(w, h),
        ProviderId::Other(_) => default_formula(w, h),
    }
}

/// Convenience wrapper for recorded dimensions
pub(crate) fn estimate_dimensions(
    dimensions: Option<ImageDimensions>,
    provider: &ProviderId,
) -> usize {
    estimate_image(
        dimensions.map(|d| d.width),
        dimensions.map(|d| d.height),
        provider,
    )
}

fn anthropic(w: f64, h: f64) -> usize {
    let scale = (ANTHROPIC_MAX_EDGE / w.max(h)).min(1.0);
    let (w, h) = ((w * scale).floor().max(1.0), (h * scale).floor().max(1.0));
    ((w * h) / PIXELS_PER_TOKEN).ceil() as usize
}

fn openai(w: f64, h: f64) -> usize {
    let fit = (OPENAI_MAX_EDGE / w.max(h)).min(1.0);
    let (w, h) = (w * fit, h * fit);
    let shrink = (OPENAI_SHORT_EDGE / w.min(h)).min(1.0);
    let (w, h) = (w * shrink, h * shrink);

    let tiles = (w / OPENAI_TILE).ceil() as usize * (h / OPENAI_TILE).ceil() as usize;
    OPENAI_BASE_TOKENS + OPENAI_TILE_TOKENS * tiles
}

fn google(w: f64, h: f64) -> usize {
    let tiles = (w / GOOGLE_TILE).ceil() as usize * (h / GOOGLE_TILE).ceil() as usize;
    GOOGLE_TILE_TOKENS * tiles.max(1)
}

fn default_formula(w: f64, h: f64) -> usize {
    (((w * h) / PIXELS_PER_TOKEN).ceil() as usize).max(MIN_IMAGE_TOKENS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dimensions_is_zero() {
        assert_eq!(estimate_image(None, Some(100), &ProviderId::Anthropic), 0);
        assert_eq!(estimate_image(Some(100), None, &ProviderId::OpenAi), 0);
        assert_eq!(estimate_image(Some(0), Some(100), &ProviderId::Google), 0);
    }

    #[test]
    fn test_anthropic_formula() {
        // 1000x750 / 750 = 1000 tokens, no downscale needed
        assert_eq!(
            estimate_image(Some(1000), Some(750), &ProviderId::Anthropic),
            1000
        );
        // 3136x3136 scales to 1568x1568
        assert_eq!(
            estimate_image(Some(3136), Some(3136), &ProviderId::Anthropic),
            ((1568.0 * 1568.0) / 750.0_f64).ceil() as usize
        );
    }

    #[test]
    fn test_openai_formula() {
        // 1024x1024 -> shortest side 768 -> 768x768 -> 2x2 tiles
        assert_eq!(
            estimate_image(Some(1024), Some(1024), &ProviderId::OpenAi),
            85 + 170 * 4
        );
        // small image fits one tile
        assert_eq!(
            estimate_image(Some(200), Some(100), &ProviderId::OpenAi),
            85 + 170
        );
    }

    #[test]
    fn test_google_formula() {
        assert_eq!(estimate_image(Some(500), Some(500), &ProviderId::Google), 258);
        assert_eq!(
            estimate_image(Some(1000), Some(500), &ProviderId::Google),
            258 * 2
        );
    }

    #[test]
    fn test_unknown_provider_uses_default() {
        let provider = ProviderId::Other("ollama".to_string());
        assert_eq!(estimate_image(Some(10), Some(10), &provider), MIN_IMAGE_TOKENS);
        assert_eq!(estimate_image(Some(1500), Some(1000), &provider), 2000);
    }
}
