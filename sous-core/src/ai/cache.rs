//! Disk-based AI response cache.
//!
//! Only used when `SOUS_AI_CACHE_DIR` is set. Identical prompt plans return
//! identical responses, which keeps local development and demos cheap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

use super::types::{ChatRequest, ChatResponse, Usage};

/// Disk-based AI response cache.
pub struct AiCache {
    cache_dir: PathBuf,
}

/// A cached response with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAiResponse {
    pub content: String,
    pub usage: Usage,
    pub cached_at: DateTime<Utc>,
    pub model: String,
}

impl From<CachedAiResponse> for ChatResponse {
    fn from(cached: CachedAiResponse) -> Self {
        Self {
            content: cached.content,
            model: cached.model,
            usage: cached.usage,
            cached: true,
        }
    }
}

/// Cache key components.
#[derive(Debug, Clone)]
pub struct CacheKey {
    pub prompt_name: String,
    pub model: String,
    pub input_hash: String,
}

impl CacheKey {
    /// Key a request by its messages and sampling parameters.
    pub fn new(prompt_name: &str, model: &str, request: &ChatRequest) -> Self {
        let input_json = serde_json::to_string(request).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(input_json.as_bytes());
        hasher.update([request.json_response as u8]);

        Self {
            prompt_name: prompt_name.to_string(),
            model: model.to_string(),
            input_hash: hex::encode(hasher.finalize()),
        }
    }

    /// Format: {prompt_name}/{model_safe}/{hash[0:2]}/{hash}.json
    pub fn to_path(&self) -> PathBuf {
        let model_safe = self.model.replace(['/', ':'], "--");

        PathBuf::new()
            .join(&self.prompt_name)
            .join(model_safe)
            .join(&self.input_hash[..2])
            .join(format!("{}.json", self.input_hash))
    }
}

impl AiCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedAiResponse> {
        let path = self.cache_dir.join(key.to_path());
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn put(&self, key: &CacheKey, response: &ChatResponse) -> std::io::Result<()> {
        let path = self.cache_dir.join(key.to_path());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let cached = CachedAiResponse {
            content: response.content.clone(),
            usage: response.usage.clone(),
            cached_at: Utc::now(),
            model: response.model.clone(),
        };

        let json = serde_json::to_string_pretty(&cached)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(&path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ChatMessage;
    use tempfile::TempDir;

    fn request(text: &str, temperature: f32) -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::user(text)],
            temperature: Some(temperature),
            ..Default::default()
        }
    }

    #[test]
    fn test_cache_key_path() {
        let key = CacheKey::new("recipe", "openai/gpt-4o-mini", &request("test", 0.5));
        let path = key.to_path();
        assert!(path.starts_with("recipe/openai--gpt-4o-mini/"));
        assert!(path.to_string_lossy().ends_with(".json"));
    }

    #[test]
    fn test_sampling_parameters_change_key() {
        let a = CacheKey::new("recipe", "m", &request("same", 0.5));
        let b = CacheKey::new("recipe", "m", &request("same", 0.9));
        assert_ne!(a.input_hash, b.input_hash);
    }

    #[test]
    fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = AiCache::new(dir.path().join("cache"));
        let key = CacheKey::new("recipe", "m", &request("hello", 0.5));
        assert!(cache.get(&key).is_none());

        let response = ChatResponse {
            content: "{}".to_string(),
            model: "m".to_string(),
            usage: Usage::default(),
            cached: false,
        };
        cache.put(&key, &response).unwrap();

        let hit: ChatResponse = cache.get(&key).unwrap().into();
        assert!(hit.cached);
        assert_eq!(hit.content, "{}");

        let other = CacheKey::new("recipe", "m", &request("goodbye", 0.5));
        assert!(cache.get(&other).is_none());
    }
}
