//! Input classification.
//!
//! [`Classifier::classify`] buckets free-text input by intent and by how
//! precisely it names a dish. Cheap string rules run first (see [`rules`]);
//! only when none match does the classifier spend one call on a small model.
//! Classification never fails: errors degrade to a fixed safe default.

pub mod extract;
mod fallback;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::ai::AiClient;
use crate::types::ChatTurn;

pub use extract::ExtractedElements;
pub use fallback::ClassificationError;

/// What the user is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Intent {
    NewRecipe,
    RecipeModification,
    IngredientSubstitution,
    CookingTechnique,
    Conversational,
}

impl Intent {
    pub const ALL: &'static [Intent] = &[
        Intent::NewRecipe,
        Intent::RecipeModification,
        Intent::IngredientSubstitution,
        Intent::CookingTechnique,
        Intent::Conversational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::NewRecipe => "new_recipe",
            Intent::RecipeModification => "recipe_modification",
            Intent::IngredientSubstitution => "ingredient_substitution",
            Intent::CookingTechnique => "cooking_technique",
            Intent::Conversational => "conversational",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == value.trim().to_lowercase())
    }

    /// Whether answering may rewrite the current recipe.
    pub fn changes_recipe(&self) -> bool {
        matches!(
            self,
            Intent::RecipeModification | Intent::IngredientSubstitution
        )
    }
}

/// How precisely a request identifies a dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SpecificityTier {
    CrystalClear,
    ModeratelyClear,
    SomewhatVague,
    VeryVague,
}

impl SpecificityTier {
    pub const ALL: &'static [SpecificityTier] = &[
        SpecificityTier::CrystalClear,
        SpecificityTier::ModeratelyClear,
        SpecificityTier::SomewhatVague,
        SpecificityTier::VeryVague,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecificityTier::CrystalClear => "crystal_clear",
            SpecificityTier::ModeratelyClear => "moderately_clear",
            SpecificityTier::SomewhatVague => "somewhat_vague",
            SpecificityTier::VeryVague => "very_vague",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == value.trim().to_lowercase())
    }

    /// Vague requests get the stronger model; precise ones do not need it.
    pub fn model_tier(&self) -> ModelTier {
        match self {
            SpecificityTier::VeryVague => ModelTier::Premium,
            _ => ModelTier::Cheap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ModelTier {
    Cheap,
    Premium,
}

/// Which path produced a classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ClassificationSource {
    Rule(&'static str),
    Model,
    SafeDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub intent: Intent,
    /// Always within [0, 1].
    pub confidence: f32,
    pub specificity_tier: SpecificityTier,
    pub model_tier_hint: ModelTier,
    pub estimated_cost_usd: f64,
    /// Set when the request only makes sense against a current recipe and
    /// none was supplied.
    pub requires_context: bool,
    pub extracted: ExtractedElements,
    pub source: ClassificationSource,
}

impl ClassificationResult {
    pub fn new(intent: Intent, confidence: f32, tier: SpecificityTier) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            intent,
            confidence,
            specificity_tier: tier,
            model_tier_hint: tier.model_tier(),
            estimated_cost_usd: 0.0,
            requires_context: false,
            extracted: ExtractedElements::default(),
            source: ClassificationSource::SafeDefault,
        }
    }
}

/// Minimal view of the recipe a conversation is about.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRef {
    pub title: String,
    pub ingredients: Vec<String>,
}

impl RecipeRef {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ingredients: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurrentRecipe {
    Present(RecipeRef),
    Absent,
}

impl CurrentRecipe {
    pub fn as_ref(&self) -> Option<&RecipeRef> {
        match self {
            CurrentRecipe::Present(recipe) => Some(recipe),
            CurrentRecipe::Absent => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyContext {
    pub current_recipe: CurrentRecipe,
    pub history: Vec<ChatTurn>,
}

impl ClassifyContext {
    pub fn without_recipe() -> Self {
        Self {
            current_recipe: CurrentRecipe::Absent,
            history: Vec::new(),
        }
    }

    pub fn with_recipe(recipe: RecipeRef) -> Self {
        Self {
            current_recipe: CurrentRecipe::Present(recipe),
            history: Vec::new(),
        }
    }

    pub fn history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}

/// Deployment variant of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierVariant {
    /// New-recipe requests. No current recipe needed.
    Generation,
    /// Chat about a specific recipe. Input without one is rejected.
    RecipeChat,
}

impl ClassifierVariant {
    pub fn default_intent(&self) -> Intent {
        match self {
            ClassifierVariant::Generation => Intent::Conversational,
            ClassifierVariant::RecipeChat => Intent::RecipeModification,
        }
    }

    pub fn requires_recipe(&self) -> bool {
        matches!(self, ClassifierVariant::RecipeChat)
    }
}

/// Rule-first classifier with a single model fallback.
#[derive(Clone)]
pub struct Classifier {
    client: Arc<dyn AiClient>,
    model: String,
    variant: ClassifierVariant,
    timeout: Duration,
}

impl Classifier {
    pub fn new(
        client: Arc<dyn AiClient>,
        model: impl Into<String>,
        variant: ClassifierVariant,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            variant,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn for_generation(client: Arc<dyn AiClient>, model: impl Into<String>) -> Self {
        Self::new(client, model, ClassifierVariant::Generation)
    }

    pub fn for_recipe_chat(client: Arc<dyn AiClient>, model: impl Into<String>) -> Self {
        Self::new(client, model, ClassifierVariant::RecipeChat)
    }

    /// Bound on the fallback model call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Classify `text` in `context`. Never fails.
    pub async fn classify(&self, text: &str, context: &ClassifyContext) -> ClassificationResult {
        let original = text.trim();
        let lower = original.to_lowercase();
        let extracted = extract::extract_elements(original, &lower);

        let input = rules::RuleInput {
            original,
            lower: &lower,
            has_recipe: context.current_recipe.as_ref().is_some(),
            requires_recipe: self.variant.requires_recipe(),
            extracted: &extracted,
        };

        if let Some((rule, verdict)) = rules::first_match(&input) {
            tracing::debug!(
                rule,
                tier = verdict.tier.as_str(),
                confidence = verdict.confidence,
                "Classified by quick rule"
            );
            let intent = verdict.intent.unwrap_or(self.variant.default_intent());
            let mut result = ClassificationResult::new(intent, verdict.confidence, verdict.tier);
            result.requires_context = verdict.requires_context;
            result.extracted = extracted;
            if result.extracted.named_dish.is_none() {
                result.extracted.named_dish = verdict.named_dish;
            }
            result.source = ClassificationSource::Rule(rule);
            return result;
        }

        match self.classify_with_model(original, context).await {
            Ok(mut result) => {
                let from_model = std::mem::take(&mut result.extracted);
                result.extracted = extracted;
                result.extracted.merge(from_model);
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "Classifier fallback failed, using safe default");
                let mut result = self.safe_default();
                result.extracted = extracted;
                result
            }
        }
    }

    /// Result used when the fallback model cannot be consulted.
    pub fn safe_default(&self) -> ClassificationResult {
        ClassificationResult::new(
            self.variant.default_intent(),
            0.3,
            SpecificityTier::SomewhatVague,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiError, FakeAiClient};

    fn classifier(client: &Arc<FakeAiClient>, variant: ClassifierVariant) -> Classifier {
        Classifier::new(client.clone(), "classifier-model", variant)
    }

    #[tokio::test]
    async fn test_rule_match_makes_no_model_call() {
        let client = Arc::new(FakeAiClient::new());
        let c = classifier(&client, ClassifierVariant::Generation);

        for text in [
            "Rick Stein's pan-seared sea bass with lemon butter",
            "quick recipe for: egg fried rice",
            "beef wellington for six",
            "how long do I rest a steak",
            "surprise me",
            "",
        ] {
            let result = c.classify(text, &ClassifyContext::without_recipe()).await;
            assert!(matches!(result.source, ClassificationSource::Rule(_)), "{text}");
            assert_eq!(result.estimated_cost_usd, 0.0);
        }
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_recipe_chat_without_recipe_requires_context() {
        let client = Arc::new(FakeAiClient::new());
        let c = classifier(&client, ClassifierVariant::RecipeChat);

        for text in ["make it spicier", "what wine goes with this?", ""] {
            let result = c.classify(text, &ClassifyContext::without_recipe()).await;
            assert!(result.requires_context);
            assert_eq!(result.confidence, 0.0);
        }
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_parses_model_json() {
        let client = Arc::new(FakeAiClient::new());
        client.push_result(Ok(r#"```json
{"intent": "new_recipe", "confidence": 0.72, "specificity": "moderately_clear",
 "elements": {"cuisine": ["Korean"], "mood": ["cosy"],}}
```"#
            .to_string()));
        let c = classifier(&client, ClassifierVariant::Generation);

        let result = c
            .classify("a warm bowl for a rainy evening", &ClassifyContext::without_recipe())
            .await;

        assert_eq!(client.call_count(), 1);
        assert_eq!(result.source, ClassificationSource::Model);
        assert_eq!(result.intent, Intent::NewRecipe);
        assert_eq!(result.specificity_tier, SpecificityTier::ModeratelyClear);
        assert!((result.confidence - 0.72).abs() < 1e-6);
        assert_eq!(result.extracted.cuisine, vec!["korean"]);
        assert!(result.estimated_cost_usd > 0.0);
    }

    #[tokio::test]
    async fn test_fallback_defaults_missing_fields() {
        let client = Arc::new(FakeAiClient::new());
        client.push_result(Ok(r#"{"intent": "banana"}"#.to_string()));
        let c = classifier(&client, ClassifierVariant::RecipeChat);

        let result = c
            .classify(
                "what wine goes with this?",
                &ClassifyContext::with_recipe(RecipeRef::titled("Chicken Curry")),
            )
            .await;

        assert_eq!(result.intent, Intent::RecipeModification);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.specificity_tier, SpecificityTier::SomewhatVague);
    }

    #[tokio::test]
    async fn test_fallback_failure_returns_safe_default() {
        let client = Arc::new(FakeAiClient::new());
        client.push_result(Err(AiError::Timeout));
        client.push_result(Ok("I think it's a recipe request".to_string()));
        let c = classifier(&client, ClassifierVariant::Generation);

        for _ in 0..2 {
            let result = c
                .classify("a warm bowl for a rainy evening", &ClassifyContext::without_recipe())
                .await;
            assert_eq!(result.source, ClassificationSource::SafeDefault);
            assert_eq!(result.confidence, 0.3);
            assert_eq!(result.intent, Intent::Conversational);
        }
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(
            ClassificationResult::new(Intent::NewRecipe, 1.7, SpecificityTier::VeryVague).confidence,
            1.0
        );
        assert_eq!(
            ClassificationResult::new(Intent::NewRecipe, f32::NAN, SpecificityTier::VeryVague)
                .confidence,
            0.0
        );
    }
}
