//! Model catalog
//!
//! Resolves a model identifier to its context capacity, provider and
//! response-reserve policy. Limits are defined per model rather than per
//! provider.

use crate::error::{TurnstileError, TurnstileResult};
use crate::types::ProviderId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// How a model accounts for the tokens of its reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservePolicy {
    /// Output tokens must be reserved separately inside the context window
    Separate,
    /// Output budget is folded into the provider's own accounting
    Folded,
}

/// Capacity and provider of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub provider: ProviderId,
    /// Total context window (input + reserved output)
    pub max_context: usize,
    pub reserve_policy: ReservePolicy,
    /// Upper bound the provider accepts for `max_output_tokens`
    pub max_output_tokens: Option<usize>,
}

impl ModelSpec {
    pub fn new(id: impl Into<String>, provider: ProviderId, max_context: usize) -> Self {
        Self {
            id: id.into(),
            provider,
            max_context,
            reserve_policy: ReservePolicy::Folded,
            max_output_tokens: None,
        }
    }

    pub fn with_reserve_policy(mut self, policy: ReservePolicy) -> Self {
        self.reserve_policy = policy;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: usize) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Provider-specific response reserve (PARA) for the given allowance
    pub fn response_reserve(&self, assistant_response_allowance: usize) -> usize {
        match self.reserve_policy {
            ReservePolicy::Separate => self.clamp_output(assistant_response_allowance),
            ReservePolicy::Folded => 0,
        }
    }

    /// The `max_output_tokens` option to send with a request
    pub fn clamp_output(&self, assistant_response_allowance: usize) -> usize {
        match self.max_output_tokens {
            Some(limit) => assistant_response_allowance.min(limit),
            None => assistant_response_allowance,
        }
    }
}

/// Resolves model identifiers; queried once per send
pub trait ModelCatalog: Send + Sync {
    fn resolve(&self, model: &str) -> TurnstileResult<ModelSpec>;
}

static BUILTIN_MODELS: LazyLock<HashMap<String, ModelSpec>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    let mut add = |spec: ModelSpec| {
        m.insert(spec.id.clone(), spec);
    };

    // Anthropic Claude models
    for id in [
        "claude-3-5-sonnet-20241022",
        "claude-sonnet-4-20250514",
        "claude-3-opus-20240229",
        "claude-3-haiku-20240307",
    ] {
        let max_output = if id.contains("sonnet-4") { 16_384 } else { 8_192 };
        add(ModelSpec::new(id, ProviderId::Anthropic, 200_000)
            .with_reserve_policy(ReservePolicy::Separate)
            .with_max_output_tokens(max_output));
    }

    // OpenAI GPT models
    add(ModelSpec::new("gpt-4", ProviderId::OpenAi, 8_192).with_max_output_tokens(8_192));
    add(ModelSpec::new("gpt-4-turbo", ProviderId::OpenAi, 128_000).with_max_output_tokens(4_096));
    add(ModelSpec::new("gpt-4o", ProviderId::OpenAi, 128_000).with_max_output_tokens(16_384));
    add(ModelSpec::new("gpt-4o-mini", ProviderId::OpenAi, 128_000).with_max_output_tokens(16_384));
    add(ModelSpec::new("o1", ProviderId::OpenAi, 200_000).with_max_output_tokens(100_000));

    // Google Gemini models
    add(ModelSpec::new("gemini-1.5-pro", ProviderId::Google, 2_000_000).with_max_output_tokens(8_192));
    add(ModelSpec::new("gemini-1.5-flash", ProviderId::Google, 1_000_000).with_max_output_tokens(8_192));
    add(ModelSpec::new("gemini-2.0-flash", ProviderId::Google, 1_000_000).with_max_output_tokens(8_192));

    m
});

/// In-memory catalog seeded with well-known models
#[derive(Debug, Clone, Default)]
pub struct StaticModelCatalog {
    custom: HashMap<String, ModelSpec>,
    include_builtin: bool,
}

impl StaticModelCatalog {
    /// Catalog with the built-in models
    pub fn new() -> Self {
        Self {
            custom: HashMap::new(),
            include_builtin: true,
        }
    }

    /// Catalog with only explicitly registered models
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register or override a model
    pub fn with_model(mut self, spec: ModelSpec) -> Self {
        self.custom.insert(spec.id.clone(), spec);
        self
    }

    /// All known models, sorted by id
    pub fn models(&self) -> Vec<ModelSpec> {
        let mut models: HashMap<&str, &ModelSpec> = HashMap::new();
        if self.include_builtin {
            models.extend(BUILTIN_MODELS.iter().map(|(id, spec)| (id.as_str(), spec)));
        }
        models.extend(self.custom.iter().map(|(id, spec)| (id.as_str(), spec)));

        let mut list: Vec<ModelSpec> = models.into_values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }
}

impl ModelCatalog for StaticModelCatalog {
    fn resolve(&self, model: &str) -> TurnstileResult<ModelSpec> {
        if let Some(spec) = self.custom.get(model) {
            return Ok(spec.clone());
        }
        if self.include_builtin {
            if let Some(spec) = BUILTIN_MODELS.get(model) {
                return Ok(spec.clone());
            }
        }
        Err(TurnstileError::not_found_resource(
            format!("Unknown model: {}", model),
            "model",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_builtin() {
        let catalog = StaticModelCatalog::new();
        let spec = catalog.resolve("claude-3-5-sonnet-20241022").unwrap();
        assert_eq!(spec.max_context, 200_000);
        assert_eq!(spec.provider, ProviderId::Anthropic);
        assert_eq!(spec.reserve_policy, ReservePolicy::Separate);
    }

    #[test]
    fn test_unknown_model_is_not_found() {
        let catalog = StaticModelCatalog::new();
        let error = catalog.resolve("no-such-model").unwrap_err();
        assert_eq!(error.error_code(), "not_found");
    }

    #[test]
    fn test_custom_model_overrides_builtin() {
        let catalog = StaticModelCatalog::new()
            .with_model(ModelSpec::new("gpt-4o", ProviderId::OpenAi, 1_000));
        assert_eq!(catalog.resolve("gpt-4o").unwrap().max_context, 1_000);
    }

    #[test]
    fn test_empty_catalog_has_no_builtin() {
        let catalog = StaticModelCatalog::empty();
        assert!(catalog.resolve("gpt-4o").is_err());
        assert!(catalog.models().is_empty());
    }

    #[test]
    fn test_response_reserve_follows_policy() {
        let separate = ModelSpec::new("a", ProviderId::Anthropic, 1_000)
            .with_reserve_policy(ReservePolicy::Separate)
            .with_max_output_tokens(300);
        let folded = ModelSpec::new("b", ProviderId::OpenAi, 1_000);

        assert_eq!(separate.response_reserve(500), 300);
        assert_eq!(separate.response_reserve(200), 200);
        assert_eq!(folded.response_reserve(500), 0);
        assert_eq!(folded.clamp_output(500), 500);
    }
}
