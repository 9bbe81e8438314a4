use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::config::helpers::{optional_env, parse_optional_env, validate_http_url};
use crate::error::ConfigError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Template value shipped in sample `.env` files; treated as "no key".
const PLACEHOLDER_KEY: &str = "sk-xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

/// Completion backend settings for the agent persona generator.
#[derive(Debug, Clone)]
pub struct PersonaConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

impl PersonaConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_key = optional_env("OPENAI_API_KEY")?
            .filter(|key| key.as_str() != PLACEHOLDER_KEY)
            .map(SecretString::from);

        let base_url = optional_env("OPENAI_BASE_URL")?
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        validate_http_url("OPENAI_BASE_URL", &base_url)?;

        let model = optional_env("OPENAI_MODEL")?.unwrap_or(defaults.model);

        let timeout_secs = parse_optional_env::<u64>("OPENAI_TIMEOUT_SECS", "a positive integer")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "OPENAI_TIMEOUT_SECS".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        Ok(Self {
            api_key,
            base_url,
            model,
            timeout: Duration::from_secs(timeout_secs),
            ..defaults
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_MUTEX;

    fn clear_persona_env() {
        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
            std::env::remove_var("OPENAI_BASE_URL");
            std::env::remove_var("OPENAI_MODEL");
            std::env::remove_var("OPENAI_TIMEOUT_SECS");
        }
    }

    #[test]
    fn placeholder_key_counts_as_missing() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_persona_env();

        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("OPENAI_API_KEY", PLACEHOLDER_KEY);
        }
        let cfg = PersonaConfig::resolve().expect("resolve");
        assert!(!cfg.has_api_key());
        assert_eq!(cfg.model, "gpt-3.5-turbo");

        clear_persona_env();
    }

    #[test]
    fn base_url_is_trimmed_and_validated() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_persona_env();

        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("OPENAI_API_KEY", "sk-live-test");
            std::env::set_var("OPENAI_BASE_URL", "http://localhost:11434/v1/");
        }
        let cfg = PersonaConfig::resolve().expect("resolve");
        assert!(cfg.has_api_key());
        assert_eq!(cfg.base_url, "http://localhost:11434/v1");

        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("OPENAI_TIMEOUT_SECS", "0");
        }
        assert!(PersonaConfig::resolve().is_err());

        clear_persona_env();
    }
}
