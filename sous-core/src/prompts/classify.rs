//! Prompt for the classifier's model fallback.

use crate::classify::{Intent, RecipeRef, SpecificityTier};
use crate::types::ChatTurn;

/// Prompt name for cache keys.
pub const CLASSIFY_PROMPT_NAME: &str = "classify_request";

const CONTEXT_TURNS: usize = 4;

fn choices<T>(values: &[T], name: impl Fn(&T) -> &'static str) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", name(v)))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn render_classify_system_prompt(about_recipe: bool) -> String {
    let setting = if about_recipe {
        "The user is chatting about a recipe they already have."
    } else {
        "The user is asking a recipe app for something to cook."
    };
    format!(
        r#"You classify cooking requests. {setting}

Return ONLY a JSON object, no other text:
{{
  "intent": {intents},
  "confidence": number between 0 and 1,
  "specificity": {tiers},
  "elements": {{
    "named_dish": string or null,
    "cuisine": [string],
    "main_ingredients": [string],
    "mood": [string]
  }}
}}

"specificity" describes how precisely the request names a dish: "crystal_clear" names it outright, "very_vague" gives almost nothing to go on."#,
        intents = choices(Intent::ALL, Intent::as_str),
        tiers = choices(SpecificityTier::ALL, SpecificityTier::as_str),
    )
}

pub fn render_classify_user_prompt(
    text: &str,
    recipe: Option<&RecipeRef>,
    history: &[ChatTurn],
) -> String {
    let mut prompt = String::new();
    if let Some(recipe) = recipe {
        prompt.push_str(&format!("Current recipe: {}\n", recipe.title));
        if !recipe.ingredients.is_empty() {
            prompt.push_str(&format!("Ingredients: {}\n", recipe.ingredients.join(", ")));
        }
    }
    let start = history.len().saturating_sub(CONTEXT_TURNS);
    for turn in &history[start..] {
        prompt.push_str(&format!("{}: {}\n", turn.role.as_str(), turn.content));
    }
    prompt.push_str(&format!("Request to classify: {}", text.trim()));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_lists_enums() {
        let prompt = render_classify_system_prompt(false);
        for intent in Intent::ALL {
            assert!(prompt.contains(intent.as_str()));
        }
        for tier in SpecificityTier::ALL {
            assert!(prompt.contains(tier.as_str()));
        }
    }

    #[test]
    fn test_user_prompt_includes_recipe() {
        let recipe = RecipeRef {
            title: "Chicken Curry".into(),
            ingredients: vec!["chicken".into(), "onion".into()],
        };
        let prompt = render_classify_user_prompt(
            "what wine goes with this?",
            Some(&recipe),
            &[ChatTurn::user("hi"), ChatTurn::assistant("hello")],
        );
        assert!(prompt.contains("Current recipe: Chicken Curry"));
        assert!(prompt.contains("chicken, onion"));
        assert!(prompt.contains("assistant: hello"));
        assert!(prompt.ends_with("Request to classify: what wine goes with this?"));
    }
}
