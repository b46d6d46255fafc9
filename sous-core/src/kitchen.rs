//! The request pipeline.
//!
//! [`Kitchen`] runs each request through the stages in a fixed order:
//! validate, classify, read variety memory, assemble the prompt, dispatch,
//! record variety (successful generations only), persist, respond.
//! Provider failures never escape: they become a placeholder recipe or a
//! polite retry message.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::ai::{create_client, create_image_generator, AiClient, AiConfig, ImageGenerator, ModelCatalog};
use crate::classify::{ClassificationResult, Classifier, ClassifyContext, RecipeRef};
use crate::error::{KitchenError, ValidationError};
use crate::generate::{
    fallback_chat_reply, fallback_recipe, GenerationDispatcher, RetryPolicy, RETRY_MESSAGE,
};
use crate::prompts::{PromptAssembler, HISTORY_TURNS};
use crate::store::{RecipeId, RecipeStore, StoredRecipe};
use crate::types::{ChatTurn, GenerationMeta, UserPreferences};
use crate::variety::VarietyTracker;

pub const MAX_REQUEST_CHARS: usize = 500;
pub const MAX_MESSAGE_CHARS: usize = 1000;
pub const MAX_LIST_ENTRIES: usize = 10;
pub const MAX_TITLE_IDEAS: u32 = 6;

/// Shown when a recipe chat message arrives without a recipe.
pub const NEEDS_RECIPE_MESSAGE: &str =
    "I can help with that once you've picked a recipe. Open one of your recipes and ask again.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeRequest {
    /// Free-text description of what to cook. May be empty.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub preferences: UserPreferences,
    /// Extra words, cuisines or techniques to steer away from.
    #[serde(default)]
    pub avoid: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageRequest {
    #[serde(default)]
    pub recipe_id: Option<RecipeId>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleIdeasRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default = "default_title_count")]
    pub count: u32,
}

fn default_title_count() -> u32 {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeOutcome {
    pub recipe: StoredRecipe,
    pub classification: ClassificationResult,
    /// Set when the recipe is the placeholder.
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatOutcome {
    pub reply: String,
    /// The recipe after this turn's change, if it changed.
    pub updated_recipe: Option<StoredRecipe>,
    pub classification: ClassificationResult,
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleIdeas {
    pub titles: Vec<String>,
    pub classification: ClassificationResult,
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn check_range(field: &'static str, value: Option<u32>, min: u32, max: u32) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < min || v > max => Err(ValidationError::OutOfRange { field, min, max }),
        _ => Ok(()),
    }
}

fn check_list(field: &'static str, values: &[String]) -> Result<(), ValidationError> {
    if values.len() > MAX_LIST_ENTRIES {
        return Err(ValidationError::TooMany {
            field,
            max: MAX_LIST_ENTRIES,
        });
    }
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ValidationError::Empty(field));
    }
    values.iter().try_for_each(|v| check_len(field, v, 60))
}

impl UserPreferences {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("servings", self.servings, 1, 24)?;
        check_range("time_budget_minutes", self.time_budget_minutes, 5, 1440)?;
        check_list("dietary", &self.dietary)?;
        check_list("equipment", &self.equipment)?;
        Ok(())
    }
}

impl RecipeRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_len("text", &self.text, MAX_REQUEST_CHARS)?;
        check_list("avoid", &self.avoid)?;
        self.preferences.validate()
    }
}

impl ChatMessageRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.message.trim().is_empty() {
            return Err(ValidationError::Empty("message"));
        }
        check_len("message", &self.message, MAX_MESSAGE_CHARS)
    }
}

impl TitleIdeasRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_len("text", &self.text, MAX_REQUEST_CHARS)?;
        check_range("count", Some(self.count), 1, MAX_TITLE_IDEAS)?;
        self.preferences.validate()
    }
}

pub struct Kitchen {
    generation_classifier: Classifier,
    chat_classifier: Classifier,
    variety: Arc<VarietyTracker>,
    assembler: PromptAssembler,
    dispatcher: GenerationDispatcher,
    store: Arc<dyn RecipeStore>,
}

impl Kitchen {
    pub fn new(
        client: Arc<dyn AiClient>,
        models: ModelCatalog,
        policy: RetryPolicy,
        store: Arc<dyn RecipeStore>,
        variety: Arc<VarietyTracker>,
    ) -> Self {
        Self {
            generation_classifier: Classifier::for_generation(client.clone(), &models.classifier)
                .with_timeout(policy.timeout),
            chat_classifier: Classifier::for_recipe_chat(client.clone(), &models.classifier)
                .with_timeout(policy.timeout),
            variety,
            assembler: PromptAssembler::new(models),
            dispatcher: GenerationDispatcher::new(client, policy),
            store,
        }
    }

    /// Wire every stage from configuration.
    pub fn from_config(config: &AiConfig, store: Arc<dyn RecipeStore>) -> Self {
        tracing::info!(
            provider = ?config.provider,
            cheap = %config.models.cheap,
            premium = %config.models.premium,
            images = config.images_enabled,
            "Building kitchen"
        );
        Self::new(
            create_client(config),
            config.models.clone(),
            RetryPolicy::from_config(config),
            store,
            Arc::new(VarietyTracker::new()),
        )
        .with_images(create_image_generator(config))
    }

    pub fn with_images(mut self, images: Option<Arc<dyn ImageGenerator>>) -> Self {
        self.dispatcher = self.dispatcher.with_images(images);
        self
    }

    pub fn variety(&self) -> &VarietyTracker {
        &self.variety
    }

    pub async fn handle_recipe_request(
        &self,
        owner: Uuid,
        request: RecipeRequest,
    ) -> Result<RecipeOutcome, KitchenError> {
        request.validate()?;

        let classification = self
            .generation_classifier
            .classify(&request.text, &ClassifyContext::without_recipe())
            .await;

        let client_id = owner.to_string();
        let avoid: HashSet<String> = request.avoid.iter().cloned().collect();
        let guidance = self.variety.variety_guidance(&client_id, &avoid);

        let plan = self.assembler.build_prompt(
            &request.text,
            &classification,
            &request.preferences,
            &guidance,
        );

        let (recipe, meta, message) = match self.dispatcher.generate_recipe(&plan).await {
            Ok(generated) => {
                let mut recipe = generated.artifact;
                recipe.image_url = self.dispatcher.generate_image(&recipe).await;
                self.variety.record_title(&client_id, &recipe.title);
                (recipe, generated.meta, None)
            }
            Err(e) => {
                tracing::warn!(%owner, error = %e, "Recipe generation failed, serving fallback");
                let meta = GenerationMeta {
                    model: plan.model_id.clone(),
                    fallback: true,
                    ..Default::default()
                };
                (fallback_recipe(), meta, Some(RETRY_MESSAGE.to_string()))
            }
        };

        let id = self.store.save(owner, &recipe, &meta).await?;
        let stored = self.store.get(owner, id).await?;

        tracing::info!(
            %owner,
            recipe_id = id,
            intent = classification.intent.as_str(),
            tier = classification.specificity_tier.as_str(),
            model = %meta.model,
            cost_usd = meta.estimated_cost_usd + classification.estimated_cost_usd,
            fallback = meta.fallback,
            "Recipe request handled"
        );

        Ok(RecipeOutcome {
            recipe: stored,
            classification,
            message,
        })
    }

    pub async fn handle_chat_message(
        &self,
        owner: Uuid,
        request: ChatMessageRequest,
    ) -> Result<ChatOutcome, KitchenError> {
        request.validate()?;

        let current = match request.recipe_id {
            Some(id) => Some(self.store.get(owner, id).await?),
            None => None,
        };
        let history = match &current {
            Some(stored) => {
                self.store
                    .recent_messages(owner, stored.id, HISTORY_TURNS)
                    .await?
            }
            None => Vec::new(),
        };
        let context = match &current {
            Some(stored) => ClassifyContext::with_recipe(RecipeRef {
                title: stored.recipe.title.clone(),
                ingredients: stored.recipe.ingredients.iter().map(|i| i.item.clone()).collect(),
            }),
            None => ClassifyContext::without_recipe(),
        }
        .history(history.clone());

        let classification = self
            .chat_classifier
            .classify(&request.message, &context)
            .await;

        let Some(stored) = current.filter(|_| !classification.requires_context) else {
            return Ok(ChatOutcome {
                reply: NEEDS_RECIPE_MESSAGE.to_string(),
                updated_recipe: None,
                classification,
                fallback: false,
            });
        };

        let plan = self.assembler.build_chat_prompt(
            &classification,
            &stored.recipe,
            &history,
            &request.message,
        );

        let (reply, fallback) = match self.dispatcher.generate_chat_reply(&plan).await {
            Ok(generated) => (generated.artifact, false),
            Err(e) => {
                tracing::warn!(%owner, recipe_id = stored.id, error = %e, "Chat reply failed");
                (fallback_chat_reply(), true)
            }
        };

        let updated_recipe = match reply.updated_recipe {
            Some(mut recipe) if classification.intent.changes_recipe() => {
                if recipe.image_url.is_none() {
                    recipe.image_url = stored.recipe.image_url.clone();
                }
                self.variety.record_title(&owner.to_string(), &recipe.title);
                Some(self.store.update(owner, stored.id, &recipe).await?)
            }
            _ => None,
        };

        self.store
            .append_message(owner, stored.id, &ChatTurn::user(request.message.trim()))
            .await?;
        self.store
            .append_message(owner, stored.id, &ChatTurn::assistant(&reply.reply))
            .await?;

        tracing::info!(
            %owner,
            recipe_id = stored.id,
            intent = classification.intent.as_str(),
            updated = updated_recipe.is_some(),
            fallback,
            "Chat message handled"
        );

        Ok(ChatOutcome {
            reply: reply.reply,
            updated_recipe,
            classification,
            fallback,
        })
    }

    pub async fn suggest_titles(
        &self,
        owner: Uuid,
        request: TitleIdeasRequest,
    ) -> Result<TitleIdeas, KitchenError> {
        request.validate()?;

        let classification = self
            .generation_classifier
            .classify(&request.text, &ClassifyContext::without_recipe())
            .await;
        let guidance = self
            .variety
            .variety_guidance(&owner.to_string(), &HashSet::new());

        let count = request.count as usize;
        let plans: Vec<_> = (0..count)
            .map(|slot| {
                self.assembler.build_title_prompt(
                    &request.text,
                    &classification,
                    &request.preferences,
                    &guidance,
                    slot,
                    count,
                )
            })
            .collect();

        let titles = self.dispatcher.generate_titles(&plans).await;
        tracing::info!(%owner, requested = count, returned = titles.len(), "Title ideas generated");

        Ok(TitleIdeas {
            titles,
            classification,
        })
    }

    pub async fn list_recipes(&self, owner: Uuid) -> Result<Vec<StoredRecipe>, KitchenError> {
        Ok(self.store.list(owner).await?)
    }

    pub async fn get_recipe(&self, owner: Uuid, id: RecipeId) -> Result<StoredRecipe, KitchenError> {
        Ok(self.store.get(owner, id).await?)
    }

    pub async fn delete_recipe(&self, owner: Uuid, id: RecipeId) -> Result<(), KitchenError> {
        self.store.delete(owner, id).await?;
        tracing::info!(%owner, recipe_id = id, "Recipe deleted");
        Ok(())
    }

    pub async fn chat_history(&self, owner: Uuid, id: RecipeId) -> Result<Vec<ChatTurn>, KitchenError> {
        Ok(self.store.chat_history(owner, id).await?)
    }
}
