//! Token estimation for conversation turns
//!
//! Exact tokenization varies by provider, so estimates are approximations
//! based on character counts plus provider-specific image formulas.

mod estimator;
mod image;
mod memo;

pub use estimator::{DEFAULT_CHARS_PER_TOKEN, TokenEstimator, estimate_text};
pub use image::{MIN_IMAGE_TOKENS, estimate_image};
pub use memo::{MemoKey, TurnTokenCache};
