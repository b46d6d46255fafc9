//! AI client module for LLM and image provider integration.
//!
//! This module provides:
//! - `AiClient` trait for abstracting chat providers
//! - `OpenAiClient` (OpenAI-compatible APIs, optional disk cache) and `GeminiClient`
//! - `ImageGenerator` trait for recipe photos
//! - Fakes for tests
//!
//! # Configuration
//!
//! See [`AiConfig::from_env`] for the environment variables read at startup.

mod cache;
mod client;
mod config;
mod fake;
mod gemini;
mod image;
mod types;

use std::sync::Arc;

pub use cache::{AiCache, CacheKey, CachedAiResponse};
pub use client::{AiClient, AiError, OpenAiClient};
pub use config::{
    AiConfig, ConfigError, ModelCatalog, ProviderKind, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS,
};
pub use fake::FakeAiClient;
pub use gemini::GeminiClient;
pub use image::{FakeImageGenerator, ImageGenerator, OpenAiImageGenerator};
pub use types::{estimate_cost_usd, ChatMessage, ChatRequest, ChatResponse, Role, Usage};

/// Build the chat client selected by `config.provider`.
///
/// The fake provider answers every prompt with `{}`, which exercises the
/// classifier defaults and the dispatcher's fallback path.
pub fn create_client(config: &AiConfig) -> Arc<dyn AiClient> {
    match config.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiClient::new(config.clone())),
        ProviderKind::Gemini => Arc::new(GeminiClient::new(config)),
        ProviderKind::Fake => Arc::new(FakeAiClient::new().with_default_response("{}")),
    }
}

/// Build the image generator, if photos are enabled for this provider.
pub fn create_image_generator(config: &AiConfig) -> Option<Arc<dyn ImageGenerator>> {
    match config.provider {
        ProviderKind::OpenAi if config.images_enabled => {
            Some(Arc::new(OpenAiImageGenerator::new(config)))
        }
        _ => None,
    }
}
