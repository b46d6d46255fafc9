//! Fake AI client for testing.
//!
//! Returns deterministic responses so tests run without network access or
//! API costs. Scripted results are consumed first, in order; after that the
//! first registered substring found in the request wins; otherwise the
//! default response (if any) is returned.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use super::client::{AiClient, AiError};
use super::types::{ChatRequest, ChatResponse, Usage};

#[derive(Debug, Default)]
pub struct FakeAiClient {
    /// Results handed out one per call before any matching happens.
    script: Mutex<VecDeque<Result<String, AiError>>>,
    /// Substring -> response, checked in insertion order.
    responses: RwLock<Vec<(String, String)>>,
    default_response: Option<String>,
    calls: AtomicUsize,
    prompt_names: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeAiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `response` whenever the request contains `prompt_contains`.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let client = Self::new();
        client.add_response(prompt_contains, response);
        client
    }

    pub fn add_response(&self, prompt_contains: &str, response: &str) {
        self.responses
            .write()
            .unwrap()
            .push((prompt_contains.to_lowercase(), response.to_string()));
    }

    /// Queue a result for the next unanswered call.
    pub fn push_result(&self, result: Result<String, AiError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt names of every call, in order.
    pub fn prompt_names(&self) -> Vec<String> {
        self.prompt_names.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiClient for FakeAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompt_names
            .lock()
            .unwrap()
            .push(prompt_name.to_string());

        let model = request.model.clone().unwrap_or_else(|| "fake-model".to_string());
        let respond = |content: String| ChatResponse {
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 10,
                total_tokens: 20,
            },
            content,
            model: model.clone(),
            cached: false,
        };

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next.map(respond);
        }

        let prompt_lower = request.joined_content().to_lowercase();
        let matched = self
            .responses
            .read()
            .unwrap()
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern))
            .map(|(_, response)| response.clone());

        if let Some(response) = matched {
            return Ok(respond(response));
        }

        match &self.default_response {
            Some(response) => Ok(respond(response.clone())),
            None => Err(AiError::Api {
                status: 500,
                message: format!(
                    "FakeAiClient: no response configured for prompt {}",
                    prompt_name
                ),
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ChatMessage;

    fn request(text: &str) -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::user(text)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_matching_is_case_insensitive() {
        let client = FakeAiClient::with_response("HELLO", "world");
        let result = client.complete("t", request("hello there")).await.unwrap();
        assert_eq!(result.content, "world");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_script_consumed_before_matching() {
        let client = FakeAiClient::with_response("hello", "matched");
        client.push_result(Err(AiError::Timeout));
        client.push_result(Ok("scripted".to_string()));

        assert!(matches!(
            client.complete("t", request("hello")).await,
            Err(AiError::Timeout)
        ));
        assert_eq!(
            client.complete("t", request("hello")).await.unwrap().content,
            "scripted"
        );
        assert_eq!(
            client.complete("t", request("hello")).await.unwrap().content,
            "matched"
        );
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_no_match_without_default_errors() {
        let client = FakeAiClient::new();
        assert!(client.complete("t", request("random")).await.is_err());

        let client = FakeAiClient::new().with_default_response("default");
        let result = client.complete("t", request("random")).await.unwrap();
        assert_eq!(result.content, "default");
    }
}
