pub mod ai;
pub mod classify;
pub mod error;
pub mod generate;
pub mod kitchen;
pub mod prompts;
pub mod store;
pub mod types;
pub mod variety;

pub use classify::{
    ClassificationResult, ClassificationSource, Classifier, ClassifierVariant, ClassifyContext,
    CurrentRecipe, ExtractedElements, Intent, ModelTier, RecipeRef, SpecificityTier,
};
pub use error::{KitchenError, ValidationError};
pub use generate::{
    fallback_recipe, sanitize_json, GenerationDispatcher, GenerationError, RetryPolicy,
};
pub use kitchen::{
    ChatMessageRequest, ChatOutcome, Kitchen, RecipeOutcome, RecipeRequest, TitleIdeas,
    TitleIdeasRequest,
};
pub use prompts::{PromptAssembler, PromptPlan};
pub use store::{MemoryStore, RecipeId, RecipeStore, StoreError, StoredRecipe};
pub use types::{
    Budget, ChatReply, ChatTurn, Generated, GeneratedRecipe, GenerationMeta, Ingredient,
    SkillLevel, TurnRole, UserPreferences,
};
pub use variety::{VarietyGuidance, VarietyTracker};
