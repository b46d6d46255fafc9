//! JSON schema blocks shown to the model, and the limits they state.
//!
//! Parsed output is clamped to the same limits by
//! [`crate::types::GeneratedRecipe::enforce_limits`], so a model that ignores
//! the schema still cannot push oversized fields into storage.

pub const TITLE_MAX_CHARS: usize = 60;
pub const DESCRIPTION_MAX_CHARS: usize = 200;
pub const INGREDIENT_MAX_CHARS: usize = 80;
pub const NOTE_MAX_CHARS: usize = 80;
pub const INSTRUCTION_MAX_CHARS: usize = 250;
pub const MAX_INGREDIENTS: usize = 15;
pub const MAX_INSTRUCTIONS: usize = 12;
pub const REPLY_MAX_CHARS: usize = 600;

/// Heading that opens every schema block.
pub const SCHEMA_HEADING: &str = "Respond with ONLY a JSON object matching this schema:";

/// The recipe object, without the heading. Shared by the recipe and chat
/// schemas.
fn recipe_object(indent: &str) -> String {
    format!(
        r#"{{
{i}  "title": "string, max {TITLE_MAX_CHARS} characters",
{i}  "description": "string, max {DESCRIPTION_MAX_CHARS} characters",
{i}  "servings": "integer",
{i}  "prep_time_minutes": "integer",
{i}  "cook_time_minutes": "integer",
{i}  "ingredients": [
{i}    {{
{i}      "item": "string, max {INGREDIENT_MAX_CHARS} characters",
{i}      "amount": "string or null",
{i}      "unit": "string or null",
{i}      "note": "string or null, max {NOTE_MAX_CHARS} characters"
{i}    }}
{i}  ],
{i}  "instructions": ["string, max {INSTRUCTION_MAX_CHARS} characters per step"]
{i}}}"#,
        i = indent
    )
}

pub fn recipe_schema_block() -> String {
    format!(
        "{SCHEMA_HEADING}\n{}\nAt most {MAX_INGREDIENTS} ingredients and {MAX_INSTRUCTIONS} instruction steps.",
        recipe_object("")
    )
}

pub fn chat_reply_schema_block() -> String {
    format!(
        r#"{SCHEMA_HEADING}
{{
  "reply": "string, max {REPLY_MAX_CHARS} characters",
  "updated_recipe": {} or null
}}
Only include "updated_recipe" when the user asked to change the recipe. It must be the COMPLETE recipe, not just the changed parts, with at most {MAX_INGREDIENTS} ingredients and {MAX_INSTRUCTIONS} steps."#,
        recipe_object("  ")
    )
}

pub fn title_schema_block() -> String {
    format!(
        r#"{SCHEMA_HEADING}
{{
  "title": "string, max {TITLE_MAX_CHARS} characters"
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_schema_states_limits() {
        let block = recipe_schema_block();
        assert!(block.starts_with(SCHEMA_HEADING));
        assert!(block.contains("max 60 characters"));
        assert!(block.contains("max 250 characters per step"));
        assert!(block.contains("At most 15 ingredients and 12 instruction steps"));
    }

    #[test]
    fn test_chat_schema_embeds_recipe() {
        let block = chat_reply_schema_block();
        assert!(block.contains("\"reply\": \"string, max 600 characters\""));
        assert!(block.contains("\"instructions\""));
    }
}
