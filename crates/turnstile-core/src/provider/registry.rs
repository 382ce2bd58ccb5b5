//! Provider registry

use std::collections::HashMap;
use std::sync::Arc;

use super::port::ChatProvider;
use crate::error::{TurnstileError, TurnstileResult};
use crate::types::ProviderId;

/// Maps provider identities to their ports
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Arc<dyn ChatProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.providers.keys().map(ProviderId::name).collect();
        ids.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("providers", &ids)
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a port under its own provider id, replacing any previous one
    pub fn register(&mut self, provider: Arc<dyn ChatProvider>) {
        self.providers.insert(provider.provider_id(), provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Resolve a usable port or fail with a configuration error
    pub fn resolve(&self, id: &ProviderId) -> TurnstileResult<Arc<dyn ChatProvider>> {
        let provider = self
            .providers
            .get(id)
            .ok_or_else(|| TurnstileError::provider_not_registered(id))?;

        if !provider.has_credentials() {
            return Err(TurnstileError::missing_api_key(id));
        }
        Ok(Arc::clone(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockChatProvider;

    fn mock(id: ProviderId, has_key: bool) -> Arc<dyn ChatProvider> {
        let mut provider = MockChatProvider::new();
        provider.expect_provider_id().return_const(id);
        provider.expect_has_credentials().return_const(has_key);
        Arc::new(provider)
    }

    #[test]
    fn test_resolve_registered() {
        let registry = ProviderRegistry::new().with_provider(mock(ProviderId::OpenAi, true));
        assert!(registry.resolve(&ProviderId::OpenAi).is_ok());
    }

    #[test]
    fn test_resolve_unregistered() {
        let registry = ProviderRegistry::new().with_provider(mock(ProviderId::OpenAi, true));
        let error = registry.resolve(&ProviderId::Anthropic).err().unwrap();
        assert_eq!(error.error_code(), "provider_not_registered");
    }

    #[test]
    fn test_resolve_without_credentials() {
        let registry = ProviderRegistry::new().with_provider(mock(ProviderId::Google, false));
        let error = registry.resolve(&ProviderId::Google).err().unwrap();
        assert_eq!(error.error_code(), "missing_api_key");
    }
}
