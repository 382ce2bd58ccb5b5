//! Provider port
//!
//! Each remote service is reached through a [`ChatProvider`] implementation
//! that owns its wire format and classifies its own failures into
//! [`ProviderErrorKind`]. The send pipeline only ever retries `Overflow`.

mod error;
mod messages;
mod port;
mod registry;

pub use error::{ProviderError, ProviderErrorKind};
pub use messages::{ChatMessage, MessageRole, ProviderRequest, ProviderResponse, RequestOptions, TokenUsage};
pub use port::ChatProvider;
pub use registry::ProviderRegistry;

pub use crate::types::ProviderId;

#[cfg(test)]
pub use port::MockChatProvider;
