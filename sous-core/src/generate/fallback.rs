use crate::types::{ChatReply, GeneratedRecipe, Ingredient};

/// Shown alongside the placeholder recipe when generation fails.
pub const RETRY_MESSAGE: &str =
    "Sorry, our kitchen is a little busy right now and we couldn't create that recipe. Here's a simple favourite in the meantime; please try again in a moment.";

/// Chat reply used when the model cannot answer.
pub const CHAT_RETRY_MESSAGE: &str =
    "Sorry, I couldn't work that out just now. Could you try asking again in a moment?";

fn ingredient(item: &str, amount: &str, unit: Option<&str>, note: Option<&str>) -> Ingredient {
    Ingredient {
        item: item.to_string(),
        amount: Some(amount.to_string()),
        unit: unit.map(str::to_string),
        note: note.map(str::to_string),
    }
}

/// Hand-written placeholder returned when generation fails.
pub fn fallback_recipe() -> GeneratedRecipe {
    GeneratedRecipe {
        title: "Simple Tomato Pasta".to_string(),
        description: "A dependable store-cupboard pasta with garlic, tomatoes and basil."
            .to_string(),
        servings: 2,
        prep_time_minutes: 5,
        cook_time_minutes: 15,
        ingredients: vec![
            ingredient("spaghetti", "200", Some("g"), None),
            ingredient("olive oil", "2", Some("tbsp"), None),
            ingredient("garlic", "2", Some("cloves"), Some("thinly sliced")),
            ingredient("chopped tomatoes", "400", Some("g"), Some("1 tin")),
            ingredient("salt", "1", Some("pinch"), None),
            ingredient("basil", "1", Some("handful"), Some("torn")),
        ],
        instructions: vec![
            "Cook the spaghetti in well-salted boiling water until al dente.".to_string(),
            "Meanwhile, warm the olive oil in a pan and gently fry the garlic for 1 minute."
                .to_string(),
            "Add the tomatoes and a pinch of salt; simmer for 10 minutes.".to_string(),
            "Drain the pasta, toss it through the sauce and finish with basil.".to_string(),
        ],
        image_url: None,
    }
}

pub fn fallback_chat_reply() -> ChatReply {
    ChatReply {
        reply: CHAT_RETRY_MESSAGE.to_string(),
        updated_recipe: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_recipe_is_within_limits() {
        let recipe = fallback_recipe();
        assert_eq!(recipe.clone().enforce_limits(), recipe);
        assert!(!recipe.ingredients.is_empty());
        assert!(!recipe.instructions.is_empty());
    }
}
