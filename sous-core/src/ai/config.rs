//! AI configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default OpenAI-compatible base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Gemini REST base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for precise requests.
pub const DEFAULT_CHEAP_MODEL: &str = "gpt-4o-mini";

/// Default model for vague requests that need more creative latitude.
pub const DEFAULT_PREMIUM_MODEL: &str = "gpt-4o";

/// Default model for the classifier fallback.
pub const DEFAULT_CLASSIFIER_MODEL: &str = "gpt-4o-mini";

/// Gemini defaults, used when the provider is Gemini.
pub const DEFAULT_GEMINI_CHEAP_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_PREMIUM_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_GEMINI_CLASSIFIER_MODEL: &str = "gemini-2.0-flash";

/// Default image model.
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Default rate limit between requests in milliseconds.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 0;

/// Default per-attempt timeout for provider calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Default number of retries after a transient failure.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Bounds for `SOUS_AI_MAX_RETRIES`.
pub const MIN_RETRIES: u32 = 1;
pub const MAX_RETRIES: u32 = 2;

#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),
}

/// Which chat provider to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Fake,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "fake" => Ok(Self::Fake),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Model ids for the two generation tiers plus the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    pub cheap: String,
    pub premium: String,
    pub classifier: String,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            cheap: DEFAULT_CHEAP_MODEL.to_string(),
            premium: DEFAULT_PREMIUM_MODEL.to_string(),
            classifier: DEFAULT_CLASSIFIER_MODEL.to_string(),
        }
    }
}

impl ModelCatalog {
    /// Default model ids for `provider`.
    pub fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::Gemini => Self {
                cheap: DEFAULT_GEMINI_CHEAP_MODEL.to_string(),
                premium: DEFAULT_GEMINI_PREMIUM_MODEL.to_string(),
                classifier: DEFAULT_GEMINI_CLASSIFIER_MODEL.to_string(),
            },
            ProviderKind::OpenAi | ProviderKind::Fake => Self::default(),
        }
    }
}

/// AI client configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: ProviderKind,
    /// API key for the selected provider. Empty for the fake provider.
    pub api_key: String,
    /// Base URL for the API.
    pub base_url: String,
    pub models: ModelCatalog,
    /// Directory for caching responses. Caching is off when unset.
    pub cache_dir: Option<PathBuf>,
    /// If true, only use cache, error if not cached.
    pub offline: bool,
    /// Milliseconds to wait between requests.
    pub rate_limit_ms: u64,
    /// Timeout applied to each provider attempt.
    pub timeout: Duration,
    /// Retries after a transient failure.
    pub max_retries: u32,
    /// Whether recipe photos are generated.
    pub images_enabled: bool,
    pub image_model: String,
}

impl AiConfig {
    /// Configuration with defaults for everything but the key.
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        let base_url = match provider {
            ProviderKind::Gemini => DEFAULT_GEMINI_BASE_URL,
            _ => DEFAULT_BASE_URL,
        };
        Self {
            provider,
            api_key: api_key.into(),
            base_url: base_url.to_string(),
            models: ModelCatalog::for_provider(provider),
            cache_dir: None,
            offline: false,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            images_enabled: provider == ProviderKind::OpenAi,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `SOUS_AI_PROVIDER`: "openai" (default), "gemini" or "fake"
    /// - `OPENAI_API_KEY` / `GEMINI_API_KEY`: required for the matching provider
    /// - `SOUS_AI_BASE_URL`: API base URL
    /// - `SOUS_AI_MODEL_CHEAP`, `SOUS_AI_MODEL_PREMIUM`, `SOUS_AI_MODEL_CLASSIFIER`
    /// - `SOUS_AI_CACHE_DIR`: enables the disk cache ("default" uses ~/.sous/ai-cache)
    /// - `SOUS_AI_OFFLINE`: use cache only
    /// - `SOUS_AI_RATE_LIMIT_MS`, `SOUS_AI_TIMEOUT_SECS`, `SOUS_AI_MAX_RETRIES`
    /// - `SOUS_IMAGES`: "off" disables recipe photos
    /// - `SOUS_IMAGE_MODEL`
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = ProviderKind::parse(
            &env::var("SOUS_AI_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
        )?;

        let api_key = match provider {
            ProviderKind::OpenAi => required("OPENAI_API_KEY")?,
            ProviderKind::Gemini => required("GEMINI_API_KEY")?,
            ProviderKind::Fake => String::new(),
        };

        let mut config = Self::new(provider, api_key);

        if let Ok(base_url) = env::var("SOUS_AI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = env::var("SOUS_AI_MODEL_CHEAP") {
            config.models.cheap = model;
        }
        if let Ok(model) = env::var("SOUS_AI_MODEL_PREMIUM") {
            config.models.premium = model;
        }
        if let Ok(model) = env::var("SOUS_AI_MODEL_CLASSIFIER") {
            config.models.classifier = model;
        }

        config.cache_dir = env::var("SOUS_AI_CACHE_DIR").ok().map(|v| {
            if v == "default" {
                Self::default_cache_dir()
            } else {
                PathBuf::from(v)
            }
        });

        config.offline = env::var("SOUS_AI_OFFLINE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        config.rate_limit_ms = parsed("SOUS_AI_RATE_LIMIT_MS").unwrap_or(DEFAULT_RATE_LIMIT_MS);
        config.timeout =
            Duration::from_secs(parsed("SOUS_AI_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS));
        config.max_retries =
            clamp_retries(parsed("SOUS_AI_MAX_RETRIES").unwrap_or(DEFAULT_MAX_RETRIES));

        if let Ok(v) = env::var("SOUS_IMAGES") {
            config.images_enabled = v != "off" && v != "false" && v != "0";
        }
        if let Ok(model) = env::var("SOUS_IMAGE_MODEL") {
            config.image_model = model;
        }

        Ok(config)
    }

    /// Get the default cache directory: ~/.sous/ai-cache
    pub fn default_cache_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".sous").join("ai-cache"))
            .unwrap_or_else(|| PathBuf::from("data/ai-cache"))
    }
}

fn clamp_retries(value: u32) -> u32 {
    let clamped = value.clamp(MIN_RETRIES, MAX_RETRIES);
    if clamped != value {
        tracing::warn!(
            requested = value,
            using = clamped,
            "SOUS_AI_MAX_RETRIES out of range"
        );
    }
    clamped
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!(ProviderKind::parse("OpenAI").unwrap(), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::parse(" gemini ").unwrap(), ProviderKind::Gemini);
        assert!(ProviderKind::parse("claude").is_err());
    }

    #[test]
    fn test_gemini_defaults() {
        let config = AiConfig::new(ProviderKind::Gemini, "key");
        assert_eq!(config.base_url, DEFAULT_GEMINI_BASE_URL);
        assert!(!config.images_enabled);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.models.cheap, "gemini-2.0-flash");
        assert_eq!(config.models.premium, "gemini-1.5-pro");
        assert_eq!(config.models.classifier, "gemini-2.0-flash");
    }

    #[test]
    fn test_openai_defaults() {
        let config = AiConfig::new(ProviderKind::OpenAi, "key");
        assert_eq!(config.models, ModelCatalog::default());
        assert_eq!(config.models.cheap, DEFAULT_CHEAP_MODEL);
    }

    #[test]
    fn test_retries_clamped() {
        assert_eq!(clamp_retries(0), 1);
        assert_eq!(clamp_retries(1), 1);
        assert_eq!(clamp_retries(2), 2);
        assert_eq!(clamp_retries(10), 2);
    }
}
