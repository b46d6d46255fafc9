//! Generation dispatcher: provider calls with timeout and retry, JSON
//! repair and parsing.

mod fallback;
pub mod repair;

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::ai::{estimate_cost_usd, AiClient, AiConfig, AiError, ChatResponse, ImageGenerator};
use crate::prompts::schema::{REPLY_MAX_CHARS, TITLE_MAX_CHARS};
use crate::prompts::PromptPlan;
use crate::types::{truncate_chars, ChatReply, Generated, GeneratedRecipe, GenerationMeta};

pub use fallback::{
    fallback_chat_reply, fallback_recipe, CHAT_RETRY_MESSAGE, RETRY_MESSAGE,
};
pub use repair::sanitize_json;

pub const IMAGE_SIZE: &str = "1024x1024";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Provider call failed after {attempts} attempt(s): {source}")]
    Provider {
        attempts: u32,
        #[source]
        source: AiError,
    },

    #[error("Model output could not be parsed: {0}")]
    Unparsable(String),
}

/// Timeout and retry budget for one logical call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Bound on each attempt.
    pub timeout: Duration,
    /// Extra attempts after the first, for transient failures only.
    pub max_retries: u32,
    /// Delay before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::ai::DEFAULT_TIMEOUT_SECS),
            max_retries: crate::ai::DEFAULT_MAX_RETRIES,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            timeout: config.timeout,
            max_retries: config.max_retries,
            ..Self::default()
        }
    }
}

pub struct GenerationDispatcher {
    client: Arc<dyn AiClient>,
    images: Option<Arc<dyn ImageGenerator>>,
    policy: RetryPolicy,
}

impl GenerationDispatcher {
    pub fn new(client: Arc<dyn AiClient>, policy: RetryPolicy) -> Self {
        Self {
            client,
            images: None,
            policy,
        }
    }

    pub fn with_images(mut self, images: Option<Arc<dyn ImageGenerator>>) -> Self {
        self.images = images;
        self
    }

    /// Run one plan through the provider, retrying transient failures.
    async fn call(&self, plan: &PromptPlan) -> Result<ChatResponse, GenerationError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = tokio::time::timeout(
                self.policy.timeout,
                self.client.complete(plan.prompt_name, plan.to_request()),
            )
            .await
            .unwrap_or(Err(AiError::Timeout));

            match result {
                Ok(response) => {
                    tracing::debug!(
                        prompt_name = plan.prompt_name,
                        model = %response.model,
                        attempt,
                        cached = response.cached,
                        tokens = response.usage.total_tokens,
                        "Provider call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt <= self.policy.max_retries => {
                    tracing::warn!(
                        prompt_name = plan.prompt_name,
                        model = %plan.model_id,
                        attempt,
                        error = %e,
                        "Transient provider failure, retrying"
                    );
                    tokio::time::sleep(self.policy.backoff * attempt).await;
                }
                Err(e) => {
                    tracing::warn!(
                        prompt_name = plan.prompt_name,
                        model = %plan.model_id,
                        attempt,
                        error = %e,
                        "Provider call failed"
                    );
                    return Err(GenerationError::Provider {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    fn meta(response: &ChatResponse) -> GenerationMeta {
        GenerationMeta {
            model: response.model.clone(),
            usage: response.usage.clone(),
            estimated_cost_usd: estimate_cost_usd(&response.model, &response.usage),
            fallback: false,
        }
    }

    pub async fn generate_recipe(
        &self,
        plan: &PromptPlan,
    ) -> Result<Generated<GeneratedRecipe>, GenerationError> {
        let response = self.call(plan).await?;
        let recipe = parse_recipe(&response.content)?;
        Ok(Generated {
            artifact: recipe,
            meta: Self::meta(&response),
        })
    }

    pub async fn generate_chat_reply(
        &self,
        plan: &PromptPlan,
    ) -> Result<Generated<ChatReply>, GenerationError> {
        let response = self.call(plan).await?;
        let mut reply: ChatReply = parse_json(&response.content)?;

        reply.reply = truncate_chars(reply.reply.trim(), REPLY_MAX_CHARS);
        if reply.reply.is_empty() {
            return Err(GenerationError::Unparsable("empty reply".to_string()));
        }
        reply.updated_recipe = reply
            .updated_recipe
            .map(GeneratedRecipe::enforce_limits)
            .filter(is_complete);

        Ok(Generated {
            artifact: reply,
            meta: Self::meta(&response),
        })
    }

    async fn generate_title(&self, plan: &PromptPlan) -> Result<String, GenerationError> {
        let response = self.call(plan).await?;
        let content = sanitize_json(&response.content);
        let title = match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(value) => value
                .get("title")
                .and_then(|t| t.as_str())
                .map(str::to_string)
                .ok_or_else(|| GenerationError::Unparsable("missing title".to_string()))?,
            Err(e) => return Err(GenerationError::Unparsable(e.to_string())),
        };
        let title = truncate_chars(title.trim(), TITLE_MAX_CHARS);
        if title.is_empty() {
            return Err(GenerationError::Unparsable("empty title".to_string()));
        }
        Ok(title)
    }

    /// Run every plan concurrently and keep the titles that succeeded,
    /// dropping case-insensitive duplicates.
    pub async fn generate_titles(&self, plans: &[PromptPlan]) -> Vec<String> {
        let results = join_all(plans.iter().map(|plan| self.generate_title(plan))).await;

        let mut titles: Vec<String> = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(title) => {
                    if !titles.iter().any(|t| t.eq_ignore_ascii_case(&title)) {
                        titles.push(title);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Dropping failed title idea"),
            }
        }
        titles
    }

    /// Photo URL for `recipe`, or `None` if images are off or the call fails.
    pub async fn generate_image(&self, recipe: &GeneratedRecipe) -> Option<String> {
        let images = self.images.as_ref()?;
        let prompt = format!(
            "Appetising overhead food photograph of {}. {} Natural light, home kitchen styling.",
            recipe.title, recipe.description
        );

        match tokio::time::timeout(self.policy.timeout, images.generate(&prompt, IMAGE_SIZE)).await
        {
            Ok(Ok(url)) => Some(url),
            Ok(Err(e)) => {
                tracing::warn!(title = %recipe.title, error = %e, "Image generation failed");
                None
            }
            Err(_) => {
                tracing::warn!(title = %recipe.title, "Image generation timed out");
                None
            }
        }
    }
}

fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, GenerationError> {
    serde_json::from_str(&sanitize_json(content))
        .map_err(|e| GenerationError::Unparsable(e.to_string()))
}

fn is_complete(recipe: &GeneratedRecipe) -> bool {
    !recipe.title.is_empty() && !recipe.ingredients.is_empty() && !recipe.instructions.is_empty()
}

/// Repair, parse and clamp a recipe.
pub fn parse_recipe(content: &str) -> Result<GeneratedRecipe, GenerationError> {
    let recipe = parse_json::<GeneratedRecipe>(content)?.enforce_limits();
    if !is_complete(&recipe) {
        return Err(GenerationError::Unparsable(
            "recipe is missing a title, ingredients or instructions".to_string(),
        ));
    }
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ChatRequest, FakeAiClient, FakeImageGenerator};
    use async_trait::async_trait;

    const RECIPE_JSON: &str = r#"{"title": "Sea Bass with Lemon Butter", "servings": 2,
        "ingredients": [{"item": "sea bass fillets", "amount": "2"}],
        "instructions": ["Sear skin-side down.", "Baste with lemon butter."]}"#;

    fn plan() -> PromptPlan {
        PromptPlan {
            prompt_name: "generate_recipe",
            system_message: "system".into(),
            user_message: "user".into(),
            model_id: "cheap-model".into(),
            max_tokens: 1200,
            temperature: 0.5,
            json_response: true,
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(45),
            max_retries: 2,
            backoff: Duration::ZERO,
        }
    }

    fn dispatcher(client: &Arc<FakeAiClient>) -> GenerationDispatcher {
        GenerationDispatcher::new(client.clone(), policy())
    }

    #[tokio::test]
    async fn test_repairs_fenced_output_with_trailing_comma() {
        let client = Arc::new(FakeAiClient::new());
        client.push_result(Ok(format!("```json\n{}\n```", RECIPE_JSON.replace("\"]}", "\"],}"))));

        let generated = dispatcher(&client).generate_recipe(&plan()).await.unwrap();
        assert_eq!(generated.artifact.title, "Sea Bass with Lemon Butter");
        assert_eq!(generated.artifact.instructions.len(), 2);
        assert_eq!(generated.meta.model, "cheap-model");
        assert!(!generated.meta.fallback);
    }

    #[tokio::test]
    async fn test_two_timeouts_then_success() {
        let client = Arc::new(FakeAiClient::new());
        client.push_result(Err(AiError::Timeout));
        client.push_result(Err(AiError::Timeout));
        client.push_result(Ok(RECIPE_JSON.to_string()));

        let generated = dispatcher(&client).generate_recipe(&plan()).await.unwrap();
        assert_eq!(generated.artifact.servings, 2);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_budget() {
        let client = Arc::new(FakeAiClient::new());
        for _ in 0..3 {
            client.push_result(Err(AiError::Api {
                status: 503,
                message: "overloaded".into(),
            }));
        }
        client.push_result(Ok(RECIPE_JSON.to_string()));

        let err = dispatcher(&client).generate_recipe(&plan()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Provider { attempts: 3, .. }));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_rate_limit_or_quota() {
        for error in [
            AiError::RateLimited {
                retry_after_secs: Some(10),
            },
            AiError::QuotaExceeded("insufficient_quota".into()),
            AiError::Api {
                status: 400,
                message: "bad request".into(),
            },
        ] {
            let client = Arc::new(FakeAiClient::new().with_default_response(RECIPE_JSON));
            client.push_result(Err(error));
            assert!(dispatcher(&client).generate_recipe(&plan()).await.is_err());
            assert_eq!(client.call_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_no_retry_on_unparsable_payload() {
        let client = Arc::new(FakeAiClient::new().with_default_response(RECIPE_JSON));
        client.push_result(Ok("I'd love to help! Here's a recipe idea...".to_string()));

        let err = dispatcher(&client).generate_recipe(&plan()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Unparsable(_)));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_incomplete_recipe_is_rejected() {
        let client = Arc::new(FakeAiClient::new());
        client.push_result(Ok(r#"{"title": "Nothing", "ingredients": [], "instructions": []}"#.into()));
        assert!(matches!(
            dispatcher(&client).generate_recipe(&plan()).await,
            Err(GenerationError::Unparsable(_))
        ));
    }

    struct StallingClient;

    #[async_trait]
    impl AiClient for StallingClient {
        async fn complete(&self, _: &str, _: ChatRequest) -> Result<ChatResponse, AiError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(AiError::Transport("unreachable".into()))
        }

        fn provider_name(&self) -> &'static str {
            "stalling"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_counts_as_transient() {
        let dispatcher = GenerationDispatcher::new(Arc::new(StallingClient), policy());
        let err = dispatcher.generate_recipe(&plan()).await.unwrap_err();
        match err {
            GenerationError::Provider { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(source, AiError::Timeout));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_chat_reply_clamped_and_recipe_validated() {
        let client = Arc::new(FakeAiClient::new());
        let long_reply = "a".repeat(900);
        client.push_result(Ok(format!(
            r#"{{"reply": "{long_reply}", "updated_recipe": {{"title": "Half", "ingredients": [], "instructions": []}}}}"#
        )));

        let generated = dispatcher(&client)
            .generate_chat_reply(&plan())
            .await
            .unwrap();
        assert_eq!(generated.artifact.reply.chars().count(), REPLY_MAX_CHARS);
        assert_eq!(generated.artifact.updated_recipe, None);
    }

    #[tokio::test]
    async fn test_titles_drop_failures_and_duplicates() {
        let client = Arc::new(FakeAiClient::new());
        client.push_result(Ok(r#"{"title": "Smoky Black Bean Tacos"}"#.into()));
        client.push_result(Err(AiError::QuotaExceeded("quota".into())));
        client.push_result(Ok("not json".into()));
        client.push_result(Ok(r#"{"title": "smoky black bean tacos"}"#.into()));
        client.push_result(Ok(r#"{"title": "Miso Glazed Aubergine"}"#.into()));

        let plans = vec![plan(); 5];
        let titles = dispatcher(&client).generate_titles(&plans).await;
        assert_eq!(client.call_count(), 5);
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"Miso Glazed Aubergine".to_string()));
    }

    #[tokio::test]
    async fn test_image_failures_are_swallowed() {
        let recipe = fallback_recipe();
        let client = Arc::new(FakeAiClient::new());

        let none = dispatcher(&client);
        assert_eq!(none.generate_image(&recipe).await, None);

        let failing = dispatcher(&client).with_images(Some(Arc::new(FakeImageGenerator::failing())));
        assert_eq!(failing.generate_image(&recipe).await, None);

        let working = dispatcher(&client)
            .with_images(Some(Arc::new(FakeImageGenerator::with_url("https://img/1.png"))));
        assert_eq!(
            working.generate_image(&recipe).await.as_deref(),
            Some("https://img/1.png")
        );
    }
}
