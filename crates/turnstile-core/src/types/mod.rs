//! Core data model shared by the estimator, allocator and send pipeline

mod provider_id;
mod turn;

pub use provider_id::ProviderId;
pub use turn::{ConversationTurn, ImageDimensions, ImageRef, TurnId, sort_chronologically};
