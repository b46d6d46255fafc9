//! Prompt assembly.
//!
//! [`PromptAssembler`] turns a classification, the user's preferences and
//! the variety guidance into a [`PromptPlan`]: the messages plus the model,
//! token budget and temperature chosen from the specificity tier.

pub mod chat;
pub mod classify;
pub mod recipe;
pub mod schema;
pub mod titles;

use crate::ai::{ChatMessage, ChatRequest, ModelCatalog};
use crate::classify::{ClassificationResult, ModelTier, SpecificityTier};
use crate::types::{ChatTurn, GeneratedRecipe, UserPreferences};
use crate::variety::VarietyGuidance;

pub use chat::{CHAT_PROMPT_NAME, HISTORY_TURNS};
pub use classify::CLASSIFY_PROMPT_NAME;
pub use recipe::{BASE_BLOCK, FRAGMENT_HEADINGS, RECIPE_PROMPT_NAME};
pub use titles::TITLE_PROMPT_NAME;

/// Everything needed for one provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPlan {
    pub prompt_name: &'static str,
    pub system_message: String,
    pub user_message: String,
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub json_response: bool,
}

impl PromptPlan {
    pub fn to_request(&self) -> ChatRequest {
        ChatRequest {
            messages: vec![
                ChatMessage::system(self.system_message.clone()),
                ChatMessage::user(self.user_message.clone()),
            ],
            model: Some(self.model_id.clone()),
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            json_response: self.json_response,
        }
    }
}

/// Generation parameters for one specificity tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierSettings {
    pub model: ModelTier,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Vaguer requests get more room, more creative freedom and, at the
/// bottom, the premium model.
pub fn tier_settings(tier: SpecificityTier) -> TierSettings {
    let (max_tokens, temperature) = match tier {
        SpecificityTier::CrystalClear => (1200, 0.5),
        SpecificityTier::ModeratelyClear => (1600, 0.7),
        SpecificityTier::SomewhatVague => (2000, 0.8),
        SpecificityTier::VeryVague => (2500, 0.9),
    };
    TierSettings {
        model: tier.model_tier(),
        max_tokens,
        temperature,
    }
}

const CHAT_MAX_TOKENS_WITH_RECIPE: u32 = 2000;
const CHAT_MAX_TOKENS_REPLY_ONLY: u32 = 400;
const CHAT_TEMPERATURE: f32 = 0.6;
const TITLE_MAX_TOKENS: u32 = 60;
const TITLE_TEMPERATURE: f32 = 0.95;

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    models: ModelCatalog,
}

impl PromptAssembler {
    pub fn new(models: ModelCatalog) -> Self {
        Self { models }
    }

    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Cheap => &self.models.cheap,
            ModelTier::Premium => &self.models.premium,
        }
    }

    /// Plan for generating a new recipe from `request`.
    pub fn build_prompt(
        &self,
        request: &str,
        classification: &ClassificationResult,
        preferences: &UserPreferences,
        guidance: &VarietyGuidance,
    ) -> PromptPlan {
        let tier = classification.specificity_tier;
        let settings = tier_settings(tier);
        PromptPlan {
            prompt_name: RECIPE_PROMPT_NAME,
            system_message: recipe::render_recipe_system_prompt(&classification.extracted),
            user_message: recipe::render_recipe_user_prompt(
                request,
                &classification.extracted,
                tier,
                preferences,
                guidance,
            ),
            model_id: self.model_for(settings.model).to_string(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            json_response: true,
        }
    }

    /// Plan for answering a chat message about `recipe`.
    pub fn build_chat_prompt(
        &self,
        classification: &ClassificationResult,
        recipe: &GeneratedRecipe,
        history: &[ChatTurn],
        message: &str,
    ) -> PromptPlan {
        let max_tokens = if classification.intent.changes_recipe() {
            CHAT_MAX_TOKENS_WITH_RECIPE
        } else {
            CHAT_MAX_TOKENS_REPLY_ONLY
        };
        PromptPlan {
            prompt_name: CHAT_PROMPT_NAME,
            system_message: chat::render_chat_system_prompt(classification.intent),
            user_message: chat::render_chat_user_prompt(recipe, history, message),
            model_id: self.models.cheap.clone(),
            max_tokens,
            temperature: CHAT_TEMPERATURE,
            json_response: true,
        }
    }

    /// Plan for title idea `slot` of `count`.
    pub fn build_title_prompt(
        &self,
        request: &str,
        classification: &ClassificationResult,
        preferences: &UserPreferences,
        guidance: &VarietyGuidance,
        slot: usize,
        count: usize,
    ) -> PromptPlan {
        PromptPlan {
            prompt_name: TITLE_PROMPT_NAME,
            system_message: titles::render_title_system_prompt(),
            user_message: titles::render_title_user_prompt(
                request,
                &classification.extracted,
                classification.specificity_tier,
                preferences,
                guidance,
                slot,
                count,
            ),
            model_id: self.models.cheap.clone(),
            max_tokens: TITLE_MAX_TOKENS,
            temperature: TITLE_TEMPERATURE,
            json_response: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ExtractedElements, Intent};

    fn assembler() -> PromptAssembler {
        PromptAssembler::new(ModelCatalog {
            cheap: "cheap-model".into(),
            premium: "premium-model".into(),
            classifier: "classifier-model".into(),
        })
    }

    fn classification(tier: SpecificityTier, extracted: ExtractedElements) -> ClassificationResult {
        let mut c = ClassificationResult::new(Intent::NewRecipe, 0.9, tier);
        c.extracted = extracted;
        c
    }

    fn full_text(plan: &PromptPlan) -> String {
        format!("{}\n{}", plan.system_message, plan.user_message)
    }

    #[test]
    fn test_tier_table() {
        let a = assembler();
        let cases = [
            (SpecificityTier::CrystalClear, "cheap-model", 1200, 0.5),
            (SpecificityTier::ModeratelyClear, "cheap-model", 1600, 0.7),
            (SpecificityTier::SomewhatVague, "cheap-model", 2000, 0.8),
            (SpecificityTier::VeryVague, "premium-model", 2500, 0.9),
        ];
        for (tier, model, tokens, temperature) in cases {
            let plan = a.build_prompt(
                "x",
                &classification(tier, ExtractedElements::default()),
                &UserPreferences::default(),
                &VarietyGuidance::default(),
            );
            assert_eq!(plan.model_id, model);
            assert_eq!(plan.max_tokens, tokens);
            assert_eq!(plan.temperature, temperature);
            assert!(plan.json_response);
        }
    }

    #[test]
    fn test_empty_elements_have_base_block_and_no_fragments() {
        let plan = assembler().build_prompt(
            "surprise me",
            &classification(SpecificityTier::VeryVague, ExtractedElements::default()),
            &UserPreferences::default(),
            &VarietyGuidance::default(),
        );
        let text = full_text(&plan);
        assert!(text.contains(BASE_BLOCK));
        for heading in FRAGMENT_HEADINGS {
            assert!(!text.contains(heading), "{heading} present");
        }
    }

    #[test]
    fn test_each_fragment_iff_field_set() {
        let single: Vec<(&str, ExtractedElements)> = vec![
            ("AUTHENTICITY:", ExtractedElements { named_dish: Some("paella".into()), ..Default::default() }),
            ("CHEF STYLE:", ExtractedElements { chef_reference: Some("Nigella".into()), ..Default::default() }),
            ("CUISINE FOCUS:", ExtractedElements { cuisine: vec!["thai".into()], ..Default::default() }),
            ("TECHNIQUE FOCUS:", ExtractedElements { technique: vec!["braising".into()], ..Default::default() }),
            ("STAR INGREDIENTS:", ExtractedElements { main_ingredients: vec!["leeks".into()], ..Default::default() }),
            ("FLAVOUR PROFILE:", ExtractedElements { flavor_profile: vec!["smoky".into()], ..Default::default() }),
            ("OCCASION:", ExtractedElements { occasion: vec!["picnic".into()], ..Default::default() }),
            ("MOOD:", ExtractedElements { mood: vec!["cosy".into()], ..Default::default() }),
        ];
        for (expected, elements) in single {
            let plan = assembler().build_prompt(
                "x",
                &classification(SpecificityTier::ModeratelyClear, elements),
                &UserPreferences::default(),
                &VarietyGuidance::default(),
            );
            let text = full_text(&plan);
            for heading in FRAGMENT_HEADINGS {
                assert_eq!(text.contains(heading), heading == expected, "{heading} with {expected}");
            }
        }
    }

    #[test]
    fn test_chat_prompt_budget_depends_on_intent() {
        let recipe = crate::generate::fallback_recipe();
        let mut c = classification(SpecificityTier::CrystalClear, ExtractedElements::default());
        c.intent = Intent::RecipeModification;
        let modify = assembler().build_chat_prompt(&c, &recipe, &[], "make it spicier");
        c.intent = Intent::CookingTechnique;
        let answer = assembler().build_chat_prompt(&c, &recipe, &[], "how do I know it's done?");
        assert!(modify.max_tokens > answer.max_tokens);
        assert_eq!(modify.prompt_name, CHAT_PROMPT_NAME);
    }

    #[test]
    fn test_plan_to_request() {
        let plan = assembler().build_title_prompt(
            "pasta",
            &classification(SpecificityTier::SomewhatVague, ExtractedElements::default()),
            &UserPreferences::default(),
            &VarietyGuidance::default(),
            0,
            1,
        );
        let request = plan.to_request();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.model.as_deref(), Some("cheap-model"));
        assert_eq!(request.max_tokens, Some(60));
        assert!(request.json_response);
    }
}
