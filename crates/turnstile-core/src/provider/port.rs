//! Provider trait

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::ProviderError;
use super::messages::{ProviderRequest, ProviderResponse};
use crate::types::ProviderId;

/// Unified trait for all remote generative-text services
///
/// Implementations should watch `cancel` and abandon the in-flight call when
/// it fires; the pipeline also races the call against the token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn provider_id(&self) -> ProviderId;

    /// Whether credentials are configured; checked before any network call
    fn has_credentials(&self) -> bool {
        true
    }

    /// Send one request
    async fn send(
        &self,
        request: &ProviderRequest,
        cancel: CancellationToken,
    ) -> Result<ProviderResponse, ProviderError>;
}
