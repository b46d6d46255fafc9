//! AI client trait and the OpenAI-compatible implementation.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::cache::{AiCache, CacheKey};
use super::config::{AiConfig, ConfigError};
use super::types::{ChatMessage, ChatRequest, ChatResponse, Role, Usage};

#[derive(Error, Debug, Clone)]
pub enum AiError {
    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("Response not in cache and offline mode is enabled")]
    OfflineNotCached,

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AiError {
    /// Whether retrying the same request could succeed.
    ///
    /// Rate limits and quota errors are not retried here: the provider has
    /// told us to back off and a tight retry loop only burns budget.
    pub fn is_transient(&self) -> bool {
        match self {
            AiError::Timeout | AiError::Transport(_) => true,
            AiError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Map a provider error message onto the taxonomy.
    pub fn from_provider_message(status: Option<u16>, message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("insufficient_quota")
            || lower.contains("quota")
            || lower.contains("billing")
        {
            AiError::QuotaExceeded(message.to_string())
        } else if status == Some(429) || lower.contains("rate limit") {
            AiError::RateLimited {
                retry_after_secs: None,
            }
        } else if lower.contains("timed out") || lower.contains("timeout") {
            AiError::Timeout
        } else {
            AiError::Api {
                status: status.unwrap_or(500),
                message: message.to_string(),
            }
        }
    }
}

/// Trait for AI chat clients.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Complete a chat request.
    ///
    /// The `prompt_name` labels the call in logs and organizes the cache.
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError>;

    /// Provider name (e.g., "openai", "gemini", "fake").
    fn provider_name(&self) -> &'static str;
}

/// OpenAI-compatible client with optional caching and rate limiting.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    cache: Option<AiCache>,
    config: AiConfig,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl OpenAiClient {
    pub fn new(config: AiConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        // No retries inside the SDK; `GenerationDispatcher` owns the retry budget.
        let no_retry = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..Default::default()
        };

        Self {
            client: Client::with_config(openai_config).with_backoff(no_retry),
            cache: config.cache_dir.clone().map(AiCache::new),
            config,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    async fn rate_limit(&self) {
        if self.config.rate_limit_ms == 0 {
            return;
        }

        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            let min_interval = Duration::from_millis(self.config.rate_limit_ms);

            if elapsed < min_interval {
                tokio::time::sleep(min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }

    fn to_openai_message(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage, AiError> {
        let built = match msg.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(msg.content.clone())
                .build()
                .map(Into::into),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(msg.content.clone())
                .build()
                .map(Into::into),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(msg.content.clone())
                .build()
                .map(Into::into),
        };
        built.map_err(|e| {
            AiError::ParseError(format!("Failed to build {} message: {}", msg.role.as_str(), e))
        })
    }

    fn map_error(error: OpenAIError) -> AiError {
        match error {
            OpenAIError::Reqwest(e) if e.is_timeout() => AiError::Timeout,
            OpenAIError::Reqwest(e) => match e.status() {
                Some(status) => AiError::from_provider_message(Some(status.as_u16()), &e.to_string()),
                None => AiError::Transport(e.to_string()),
            },
            OpenAIError::ApiError(api) => {
                let detail = [api.code.as_deref(), api.r#type.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                // The SDK drops the HTTP status; recover it from the error code and type.
                let status = if detail.contains("rate_limit") {
                    Some(429)
                } else if detail.contains("invalid_request") {
                    Some(400)
                } else {
                    None
                };
                AiError::from_provider_message(status, &format!("{} {}", api.message, detail))
            }
            other => AiError::from_provider_message(None, &other.to_string()),
        }
    }
}

#[async_trait]
impl AiClient for OpenAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.models.cheap.clone());

        let cache_key = CacheKey::new(prompt_name, &model, &request);
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&cache_key)) {
            tracing::debug!(prompt_name, model = %model, "AI response found in cache");
            return Ok(cached.into());
        }

        if self.config.offline {
            return Err(AiError::OfflineNotCached);
        }

        self.rate_limit().await;

        let messages: Vec<ChatCompletionRequestMessage> = request
            .messages
            .iter()
            .map(Self::to_openai_message)
            .collect::<Result<Vec<_>, _>>()?;

        let mut req_builder = CreateChatCompletionRequestArgs::default();
        req_builder.model(&model).messages(messages);

        if let Some(max_tokens) = request.max_tokens {
            req_builder.max_completion_tokens(max_tokens);
        }

        if let Some(temperature) = request.temperature {
            req_builder.temperature(temperature);
        }

        if request.json_response {
            req_builder.response_format(ResponseFormat::JsonObject);
        }

        let openai_request = req_builder
            .build()
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        tracing::debug!(prompt_name, model = %model, "Calling OpenAI-compatible API");

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(Self::map_error)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        let usage = response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        let chat_response = ChatResponse {
            content,
            model,
            usage,
            cached: false,
        };

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&cache_key, &chat_response) {
                tracing::warn!(error = %e, "Failed to cache AI response");
            }
        }

        Ok(chat_response)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
