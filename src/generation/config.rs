//! Configuration for the chat-completion collaborator.

use std::time::Duration;

use tracing::debug;

use crate::error::{StepError, StepResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.4;

/// Upper bound on one generation request, including reading the body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for reaching the generation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub api_key: String,
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl GeneratorConfig {
    /// Creates a configuration with default endpoint settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads configuration from the environment.
    ///
    /// `STEPGEN_API_KEY` (or `OPENAI_API_KEY`) is required; `STEPGEN_BASE_URL`,
    /// `STEPGEN_MODEL` and `STEPGEN_TIMEOUT_SECS` override the defaults.
    pub fn from_env() -> StepResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> StepResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("STEPGEN_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .ok_or_else(|| StepError::config("STEPGEN_API_KEY or OPENAI_API_KEY must be set"))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("STEPGEN_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = lookup("STEPGEN_MODEL") {
            config = config.with_model(model);
        }
        if let Some(secs) = lookup("STEPGEN_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| StepError::config(format!("invalid STEPGEN_TIMEOUT_SECS: {}", secs)))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        debug!(
            "Loaded generator config: model={}, base_url={}, timeout={}s",
            config.model,
            config.base_url,
            config.timeout.as_secs()
        );
        config.validate()?;
        Ok(config)
    }

    /// Builder: Set base URL. A trailing slash is dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: Set model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder: Set max output tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Builder: Set sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Builder: Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks that the configuration can be used to issue requests.
    pub fn validate(&self) -> StepResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(StepError::config("API key is empty"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(StepError::config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.model.trim().is_empty() {
            return Err(StepError::config("model is empty"));
        }
        if self.max_tokens == 0 {
            return Err(StepError::config("max_tokens must be positive"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(StepError::config("temperature must be within 0.0..=2.0"));
        }
        if self.timeout.is_zero() {
            return Err(StepError::config("timeout must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::new("sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = GeneratorConfig::from_lookup(lookup_from(&[
            ("STEPGEN_API_KEY", "sk-primary"),
            ("OPENAI_API_KEY", "sk-fallback"),
            ("STEPGEN_BASE_URL", "http://localhost:8080/v1/"),
            ("STEPGEN_MODEL", "local-model"),
            ("STEPGEN_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "sk-primary");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "local-model");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup_falls_back_to_openai_key() {
        let config =
            GeneratorConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-fallback")])).unwrap();
        assert_eq!(config.api_key, "sk-fallback");
    }

    #[test]
    fn test_from_lookup_errors() {
        assert!(matches!(
            GeneratorConfig::from_lookup(lookup_from(&[])),
            Err(StepError::Config(_))
        ));
        assert!(matches!(
            GeneratorConfig::from_lookup(lookup_from(&[
                ("STEPGEN_API_KEY", "sk"),
                ("STEPGEN_TIMEOUT_SECS", "soon"),
            ])),
            Err(StepError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(GeneratorConfig::new("  ").validate().is_err());
        assert!(GeneratorConfig::new("sk").with_base_url("ftp://x").validate().is_err());
        assert!(GeneratorConfig::new("sk").with_temperature(3.5).validate().is_err());
        assert!(GeneratorConfig::new("sk")
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
