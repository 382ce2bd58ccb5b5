//! Error types for Turnstile
//!
//! Every failure kind has a stable, distinguishable identity exposed through
//! [`TurnstileError::error_code`]. Mapping those identities to user-facing
//! text is left to the embedding application.

mod codes;
mod constructors;
mod types;

pub use types::{TurnstileError, TurnstileResult};
