//! Prompt for a chat turn about the user's current recipe.

use super::schema::{chat_reply_schema_block, REPLY_MAX_CHARS};
use crate::classify::Intent;
use crate::types::{ChatTurn, GeneratedRecipe};

/// Prompt name for cache keys.
pub const CHAT_PROMPT_NAME: &str = "recipe_chat";

/// Only the most recent turns are replayed to the model.
pub const HISTORY_TURNS: usize = 8;

pub fn render_chat_system_prompt(intent: Intent) -> String {
    let task = match intent {
        Intent::RecipeModification => {
            "The user wants to change the recipe. Apply the change, keep everything else as it was, and briefly say what you changed."
        }
        Intent::IngredientSubstitution => {
            "The user wants to replace an ingredient. Pick the best substitute, adjust amounts and method where the swap needs it, and say why it works."
        }
        Intent::CookingTechnique => {
            "The user has a question about technique. Answer it for this recipe specifically. Do not change the recipe."
        }
        Intent::NewRecipe | Intent::Conversational => {
            "Answer the user helpfully and concisely in the context of this recipe. Do not change the recipe."
        }
    };
    let recipe_rule = if intent.changes_recipe() {
        "Include the complete updated recipe in \"updated_recipe\"."
    } else {
        "Set \"updated_recipe\" to null."
    };

    format!(
        "You are a friendly, practical cooking assistant helping a home cook with the recipe below.

{task}

IMPORTANT RULES:
- Keep \"reply\" under {REPLY_MAX_CHARS} characters, warm and to the point.
- {recipe_rule}
- Return ONLY valid JSON. No other text."
    )
}

pub fn render_chat_user_prompt(
    recipe: &GeneratedRecipe,
    history: &[ChatTurn],
    message: &str,
) -> String {
    let recipe_json =
        serde_json::to_string_pretty(recipe).unwrap_or_else(|_| recipe.title.clone());

    let mut prompt = format!("Current recipe:\n\n{recipe_json}");

    let start = history.len().saturating_sub(HISTORY_TURNS);
    if start < history.len() {
        prompt.push_str("\n\nConversation so far:");
        for turn in &history[start..] {
            prompt.push_str(&format!("\n{}: {}", turn.role.as_str(), turn.content));
        }
    }

    prompt.push_str(&format!(
        "\n\nUser message: {}\n\n{}",
        message.trim(),
        chat_reply_schema_block()
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ingredient;

    fn curry() -> GeneratedRecipe {
        GeneratedRecipe {
            title: "Chicken Curry".into(),
            description: "Weeknight curry".into(),
            servings: 4,
            prep_time_minutes: 15,
            cook_time_minutes: 30,
            ingredients: vec![Ingredient {
                item: "chicken thighs".into(),
                amount: Some("600".into()),
                unit: Some("g".into()),
                note: None,
            }],
            instructions: vec!["Brown the chicken.".into()],
            image_url: None,
        }
    }

    #[test]
    fn test_only_modifying_intents_may_update() {
        assert!(render_chat_system_prompt(Intent::RecipeModification).contains("complete updated recipe"));
        assert!(render_chat_system_prompt(Intent::IngredientSubstitution).contains("complete updated recipe"));
        assert!(render_chat_system_prompt(Intent::CookingTechnique).contains("to null"));
        assert!(render_chat_system_prompt(Intent::Conversational).contains("to null"));
    }

    #[test]
    fn test_history_is_truncated_to_recent_turns() {
        let history: Vec<ChatTurn> = (0..12).map(|i| ChatTurn::user(format!("turn-{i:02}"))).collect();
        let prompt = render_chat_user_prompt(&curry(), &history, "make it spicier");
        assert!(!prompt.contains("turn-03"));
        assert!(prompt.contains("turn-04"));
        assert!(prompt.contains("turn-11"));
        assert!(prompt.contains("Chicken Curry"));
        assert!(prompt.contains("User message: make it spicier"));
    }

    #[test]
    fn test_no_history_section_when_empty() {
        let prompt = render_chat_user_prompt(&curry(), &[], "hello");
        assert!(!prompt.contains("Conversation so far"));
    }
}
