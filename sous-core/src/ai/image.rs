//! Image generation for recipe photos.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::client::AiError;
use super::config::AiConfig;

/// Trait for image generation providers.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image and return its URL.
    async fn generate(&self, prompt: &str, size: &str) -> Result<String, AiError>;
}

/// OpenAI images endpoint client.
pub struct OpenAiImageGenerator {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiImageGenerator {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.image_model.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str, size: &str) -> Result<String, AiError> {
        let request = ImageRequest {
            model: &self.model,
            prompt,
            size,
            n: 1,
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        if status != 200 {
            return Err(AiError::from_provider_message(Some(status), &body));
        }

        let parsed: ImageResponse =
            serde_json::from_str(&body).map_err(|e| AiError::ParseError(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| AiError::ParseError("No image URL in response".to_string()))
    }
}

/// Image generator returning a fixed URL, or failing when none is set.
#[derive(Debug, Default)]
pub struct FakeImageGenerator {
    url: Option<String>,
    calls: AtomicUsize,
}

impl FakeImageGenerator {
    pub fn with_url(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FakeImageGenerator {
    async fn generate(&self, _prompt: &str, _size: &str) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.url.clone().ok_or(AiError::Api {
            status: 500,
            message: "FakeImageGenerator: no url configured".to_string(),
        })
    }
}
