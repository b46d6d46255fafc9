//! Prompt for a single title idea. A batch is several of these sent
//! concurrently, each with its own slot number.

use super::recipe::{element_lines, preference_lines, variety_lines};
use super::schema::{title_schema_block, TITLE_MAX_CHARS};
use crate::classify::{ExtractedElements, SpecificityTier};
use crate::types::UserPreferences;
use crate::variety::VarietyGuidance;

/// Prompt name for cache keys.
pub const TITLE_PROMPT_NAME: &str = "title_idea";

pub fn render_title_system_prompt() -> String {
    format!(
        "You suggest names for dishes a home cook could make tonight. Suggest ONE appealing, specific dish title of at most {TITLE_MAX_CHARS} characters. The title should name a real, cookable dish, not a slogan. Return ONLY valid JSON."
    )
}

pub fn render_title_user_prompt(
    request: &str,
    extracted: &ExtractedElements,
    tier: SpecificityTier,
    preferences: &UserPreferences,
    guidance: &VarietyGuidance,
    slot: usize,
    count: usize,
) -> String {
    let mut lines = vec![format!("Request: {}", request.trim())];
    lines.extend(element_lines(extracted));
    lines.extend(variety_lines(guidance, tier));
    lines.extend(preference_lines(preferences));
    lines.push(format!(
        "This is idea {} of {count}; make it clearly different from the others you might give.",
        slot + 1
    ));
    lines.push(title_schema_block());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_produce_distinct_prompts() {
        let render = |slot| {
            render_title_user_prompt(
                "dinner ideas",
                &ExtractedElements::default(),
                SpecificityTier::VeryVague,
                &UserPreferences::default(),
                &VarietyGuidance::default(),
                slot,
                3,
            )
        };
        assert_ne!(render(0), render(1));
        assert!(render(2).contains("idea 3 of 3"));
    }
}
