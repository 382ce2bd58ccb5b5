//! Settings loader
//!
//! Loads settings from the user file, an optional explicit file and the
//! environment, merging them according to priority.

use crate::error::{TurnstileError, TurnstileResult};
use std::path::{Path, PathBuf};

use super::settings::{SendSettings, SettingsPatch};
use super::validation::SettingsValidator;

/// Prefix of every settings environment variable
pub const ENV_PREFIX: &str = "TURNSTILE_";

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Settings loader that merges settings from multiple sources
pub struct SettingsLoader {
    user_path: Option<PathBuf>,
    file_path: Option<PathBuf>,
    env: Option<EnvLookup>,
    validate: bool,
}

impl std::fmt::Debug for SettingsLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsLoader")
            .field("user_path", &self.user_path)
            .field("file_path", &self.file_path)
            .field("env", &self.env.is_some())
            .field("validate", &self.validate)
            .finish()
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Loader reading the user settings file and the process environment
    pub fn new() -> Self {
        Self {
            user_path: Self::default_user_path(),
            file_path: None,
            env: Some(Box::new(|key| std::env::var(key).ok())),
            validate: true,
        }
    }

    /// Loader with no sources; only defaults until sources are added
    pub fn empty() -> Self {
        Self {
            user_path: None,
            file_path: None,
            env: None,
            validate: true,
        }
    }

    /// `~/.config/turnstile/settings.json`
    pub fn default_user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("turnstile").join("settings.json"))
    }

    pub fn with_user_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_path = Some(path.into());
        self
    }

    /// Add an explicit settings file; unlike the user file it must exist
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Replace the environment lookup (tests, sandboxed embedders)
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Some(Box::new(lookup));
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env = None;
        self
    }

    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Load and merge settings from all sources
    pub fn load(&self) -> TurnstileResult<SendSettings> {
        let mut settings = SendSettings::default();

        if let Some(ref user_path) = self.user_path {
            if user_path.exists() {
                match Self::load_patch(user_path) {
                    Ok(patch) => {
                        tracing::debug!("Loaded user settings from {:?}", user_path);
                        settings.apply(&patch);
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to load user settings from {:?}: {}",
                            user_path,
                            e
                        );
                    }
                }
            }
        }

        if let Some(ref file_path) = self.file_path {
            let patch = Self::load_patch(file_path)?;
            tracing::debug!("Loaded settings from {:?}", file_path);
            settings.apply(&patch);
        }

        if let Some(ref lookup) = self.env {
            let patch = Self::patch_from_env(lookup.as_ref())?;
            if !patch.is_empty() {
                tracing::debug!("Applied settings from environment");
                settings.apply(&patch);
            }
        }

        if self.validate {
            SettingsValidator::new().validate(&settings)?;
        }

        Ok(settings)
    }

    /// Parse a partial settings file
    pub fn load_patch(path: &Path) -> TurnstileResult<SettingsPatch> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TurnstileError::io_with_path(e.to_string(), path.display().to_string())
        })?;

        serde_json::from_str(&content).map_err(|e| {
            TurnstileError::config_with_context(
                format!("Invalid settings file: {}", e),
                path.display().to_string(),
            )
        })
    }

    /// Build a patch from `TURNSTILE_*` variables
    pub fn patch_from_env(lookup: &dyn Fn(&str) -> Option<String>) -> TurnstileResult<SettingsPatch> {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        Ok(SettingsPatch {
            user_request_allowance: parse_var(get("USER_REQUEST_ALLOWANCE"), "USER_REQUEST_ALLOWANCE")?,
            assistant_response_allowance: parse_var(
                get("ASSISTANT_RESPONSE_ALLOWANCE"),
                "ASSISTANT_RESPONSE_ALLOWANCE",
            )?,
            chars_per_token: parse_var(get("CHARS_PER_TOKEN"), "CHARS_PER_TOKEN")?,
            max_trim_attempts: parse_var(get("MAX_TRIM_ATTEMPTS"), "MAX_TRIM_ATTEMPTS")?,
            request_timeout_secs: parse_var(get("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS")?,
            system_prompt: get("SYSTEM_PROMPT"),
            temperature: parse_var(get("TEMPERATURE"), "TEMPERATURE")?,
            web_search: parse_var(get("WEB_SEARCH"), "WEB_SEARCH")?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(value: Option<String>, name: &str) -> TurnstileResult<Option<T>> {
    match value {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            TurnstileError::config(format!("Invalid {}{} value: {}", ENV_PREFIX, name, raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_sources() {
        let settings = SettingsLoader::empty().load().unwrap();
        assert_eq!(settings, SendSettings::default());
    }

    #[test]
    fn test_precedence_user_file_env() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("user.json");
        let explicit = dir.path().join("project.json");
        std::fs::write(&user, r#"{"max_trim_attempts": 4, "chars_per_token": 3.5}"#).unwrap();
        std::fs::write(&explicit, r#"{"max_trim_attempts": 6}"#).unwrap();

        let settings = SettingsLoader::empty()
            .with_user_path(&user)
            .with_file(&explicit)
            .with_env(env_from(&[("TURNSTILE_REQUEST_TIMEOUT_SECS", "15")]))
            .load()
            .unwrap();

        assert_eq!(settings.chars_per_token, 3.5);
        assert_eq!(settings.max_trim_attempts, 6);
        assert_eq!(settings.request_timeout_secs, 15);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("settings.json");
        std::fs::write(&explicit, r#"{"user_request_allowance": 100}"#).unwrap();

        let settings = SettingsLoader::empty()
            .with_file(&explicit)
            .with_env(env_from(&[("TURNSTILE_USER_REQUEST_ALLOWANCE", "250")]))
            .load()
            .unwrap();

        assert_eq!(settings.user_request_allowance, 250);
    }

    #[test]
    fn test_broken_user_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("user.json");
        std::fs::write(&user, "{not json").unwrap();

        let settings = SettingsLoader::empty().with_user_path(&user).load().unwrap();
        assert_eq!(settings, SendSettings::default());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = SettingsLoader::empty()
            .with_file("/nonexistent/turnstile.json")
            .load();
        assert!(matches!(result, Err(TurnstileError::Io { .. })));
    }

    #[test]
    fn test_invalid_env_value() {
        let result = SettingsLoader::empty()
            .with_env(env_from(&[("TURNSTILE_MAX_TRIM_ATTEMPTS", "many")]))
            .load();
        assert!(matches!(result, Err(TurnstileError::Config { .. })));
    }

    #[test]
    fn test_validation_applies_after_merge() {
        let result = SettingsLoader::empty()
            .with_env(env_from(&[("TURNSTILE_MAX_TRIM_ATTEMPTS", "0")]))
            .load();
        assert!(result.is_err());

        let settings = SettingsLoader::empty()
            .with_env(env_from(&[("TURNSTILE_MAX_TRIM_ATTEMPTS", "0")]))
            .without_validation()
            .load()
            .unwrap();
        assert_eq!(settings.max_trim_attempts, 0);
    }

    #[test]
    fn test_unbounded_env_timeout_is_rejected() {
        let max = u64::MAX.to_string();
        let result = SettingsLoader::empty()
            .with_env(env_from(&[("TURNSTILE_REQUEST_TIMEOUT_SECS", max.as_str())]))
            .load();

        let error = result.unwrap_err();
        assert_eq!(error.error_code(), "config");
        assert!(error.to_string().contains("request_timeout_secs"));
    }
}
