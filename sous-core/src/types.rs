use serde::{Deserialize, Serialize};

use crate::ai::Usage;
use crate::prompts::schema;

/// One ingredient line of a generated recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Ingredient {
    pub item: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A recipe as returned by the model, after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRecipe {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub prep_time_minutes: u32,
    #[serde(default)]
    pub cook_time_minutes: u32,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_servings() -> u32 {
    4
}

impl GeneratedRecipe {
    pub fn total_time_minutes(&self) -> u32 {
        self.prep_time_minutes + self.cook_time_minutes
    }

    /// Clamp every field to the limits stated in the recipe schema block.
    pub fn enforce_limits(mut self) -> Self {
        self.title = truncate_chars(self.title.trim(), schema::TITLE_MAX_CHARS);
        self.description = truncate_chars(self.description.trim(), schema::DESCRIPTION_MAX_CHARS);
        self.ingredients.truncate(schema::MAX_INGREDIENTS);
        for ingredient in &mut self.ingredients {
            ingredient.item = truncate_chars(ingredient.item.trim(), schema::INGREDIENT_MAX_CHARS);
            if let Some(note) = ingredient.note.take() {
                ingredient.note = Some(truncate_chars(note.trim(), schema::NOTE_MAX_CHARS))
                    .filter(|n| !n.is_empty());
            }
        }
        self.instructions.truncate(schema::MAX_INSTRUCTIONS);
        self.instructions = self
            .instructions
            .into_iter()
            .map(|step| truncate_chars(step.trim(), schema::INSTRUCTION_MAX_CHARS))
            .filter(|step| !step.is_empty())
            .collect();
        self
    }
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Reply to a chat turn about a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub updated_recipe: Option<GeneratedRecipe>,
}

/// Provenance of a generated artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationMeta {
    pub model: String,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub estimated_cost_usd: f64,
    /// True when the artifact is the static placeholder.
    #[serde(default)]
    pub fallback: bool,
}

/// An artifact together with how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<T> {
    pub artifact: T,
    pub meta: GenerationMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Budget {
    Low,
    Moderate,
    Premium,
}

impl Budget {
    pub fn describe(&self) -> &'static str {
        match self {
            Budget::Low => "low (everyday, inexpensive ingredients)",
            Budget::Moderate => "moderate",
            Budget::Premium => "premium (special-occasion ingredients are fine)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

/// Structured preferences sent alongside the free-text request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserPreferences {
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub time_budget_minutes: Option<u32>,
    /// Hard requirements such as "vegetarian" or "nut-free".
    #[serde(default)]
    pub dietary: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub budget: Option<Budget>,
    #[serde(default)]
    pub skill_level: Option<SkillLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(TurnRole::User),
            "assistant" => Some(TurnRole::Assistant),
            _ => None,
        }
    }
}

/// One message of a recipe conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}
