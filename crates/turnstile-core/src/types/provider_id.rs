//! Provider identity used to pick image formulas and resolve provider ports

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a remote generative-text service
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderId {
    Anthropic,
    OpenAi,
    Google,
    /// Any provider without a dedicated formula (Ollama, OpenRouter, ...)
    Other(String),
}

impl ProviderId {
    /// Canonical lowercase name
    pub fn name(&self) -> &str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "anthropic" | "claude" => Self::Anthropic,
            "openai" | "azure" => Self::OpenAi,
            "google" | "gemini" => Self::Google,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ProviderId> for String {
    fn from(value: ProviderId) -> Self {
        value.name().to_string()
    }
}

impl FromStr for ProviderId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
