//! Recipe generation prompt.
//!
//! The system message is a fixed base block followed by optional
//! fragments, one per [`ExtractedElements`] field, always in the same order.
//! A fragment is present exactly when its field is set.

use super::schema::recipe_schema_block;
use crate::classify::{ExtractedElements, SpecificityTier};
use crate::types::UserPreferences;
use crate::variety::VarietyGuidance;

/// Prompt name for cache keys.
pub const RECIPE_PROMPT_NAME: &str = "generate_recipe";

pub const BASE_BLOCK: &str = "You are an experienced home-cooking recipe developer. Write one complete, reliable recipe that a home cook can follow without guessing.

IMPORTANT RULES:
- Use ingredients available in an ordinary supermarket unless the request names something specific.
- Give every ingredient an amount and unit where it makes sense.
- Keep steps in the order they are performed; one action per step.
- Respect every requirement marked STRICT without exception.
- Return ONLY the JSON object described in the user message. No other text.";

/// Headings of the gated fragments, in the order they are appended.
pub const FRAGMENT_HEADINGS: [&str; 8] = [
    "AUTHENTICITY:",
    "CHEF STYLE:",
    "CUISINE FOCUS:",
    "TECHNIQUE FOCUS:",
    "STAR INGREDIENTS:",
    "FLAVOUR PROFILE:",
    "OCCASION:",
    "MOOD:",
];

fn list(values: &[String]) -> Option<String> {
    (!values.is_empty()).then(|| values.join(", "))
}

/// Fragments in fixed order, `None` where the field is empty.
fn fragments(e: &ExtractedElements) -> [Option<String>; 8] {
    let [authenticity_h, chef_h, cuisine_h, technique_h, ingredients_h, flavour_h, occasion_h, mood_h] =
        FRAGMENT_HEADINGS;
    [
        e.named_dish.as_ref().map(|dish| {
            format!("{authenticity_h} The user asked for {dish}. Keep the defining ingredients and method of the traditional dish; do not reinvent it.")
        }),
        e.chef_reference.as_ref().map(|chef| {
            format!("{chef_h} Write in the spirit of {chef}'s cooking: their typical ingredients, seasoning and level of fuss. Do not claim the recipe is theirs.")
        }),
        list(&e.cuisine).map(|c| {
            format!("{cuisine_h} {c}. Use the pantry, aromatics and balance typical of this cuisine.")
        }),
        list(&e.technique).map(|t| {
            format!("{technique_h} {t}. Make this technique central to the method and explain its key moment (heat, timing, doneness cue).")
        }),
        list(&e.main_ingredients).map(|i| {
            format!("{ingredients_h} {i}. Build the dish around these; they should be the first thing a diner notices.")
        }),
        list(&e.flavor_profile).map(|f| {
            format!("{flavour_h} {f}. Season and finish the dish so these come through clearly.")
        }),
        list(&e.occasion).map(|o| format!("{occasion_h} {o}. Pitch effort, portioning and presentation to suit.")),
        list(&e.mood).map(|m| format!("{mood_h} {m}. Let this shape the overall feel of the dish.")),
    ]
}

/// Base block plus the fragments for the fields that are set.
pub fn render_recipe_system_prompt(extracted: &ExtractedElements) -> String {
    let mut prompt = BASE_BLOCK.to_string();
    for fragment in fragments(extracted).into_iter().flatten() {
        prompt.push_str("\n\n");
        prompt.push_str(&fragment);
    }
    prompt
}

fn success_criteria(tier: SpecificityTier) -> &'static str {
    match tier {
        SpecificityTier::CrystalClear => {
            "Success criteria: the result is unmistakably the dish that was asked for. Accuracy matters more than novelty."
        }
        SpecificityTier::ModeratelyClear => {
            "Success criteria: the result clearly fits the request; small creative choices are welcome where the request is open."
        }
        SpecificityTier::SomewhatVague => {
            "Success criteria: pick one confident direction that fits the hints and commit to it. Prefer something the user has not had recently."
        }
        SpecificityTier::VeryVague => {
            "Success criteria: surprise the user with a satisfying, achievable dish. Use the variety hints to choose a fresh direction."
        }
    }
}

/// Labelled context lines for the extracted elements.
pub(crate) fn element_lines(e: &ExtractedElements) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(dish) = &e.named_dish {
        lines.push(format!("Requested dish: {dish}"));
    }
    if let Some(chef) = &e.chef_reference {
        lines.push(format!("Chef reference: {chef}"));
    }
    let labelled = [
        ("Cuisine", &e.cuisine),
        ("Technique", &e.technique),
        ("Main ingredients", &e.main_ingredients),
        ("Flavours", &e.flavor_profile),
        ("Occasion", &e.occasion),
        ("Mood", &e.mood),
    ];
    for (label, values) in labelled {
        if let Some(joined) = list(values) {
            lines.push(format!("{label}: {joined}"));
        }
    }
    lines
}

/// Variety hints. Suggestions are only offered for vague requests; a
/// precise request is never steered elsewhere.
pub(crate) fn variety_lines(guidance: &VarietyGuidance, tier: SpecificityTier) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(words) = list(&guidance.avoid_words) {
        lines.push(format!("Recently used title words to avoid: {words}"));
    }
    if let Some(cuisines) = list(&guidance.avoid_cuisines) {
        lines.push(format!("Cuisines served recently (pick another unless requested): {cuisines}"));
    }
    if let Some(techniques) = list(&guidance.avoid_techniques) {
        lines.push(format!("Techniques used recently (pick another unless requested): {techniques}"));
    }
    if matches!(tier, SpecificityTier::SomewhatVague | SpecificityTier::VeryVague) {
        if let Some(cuisine) = &guidance.suggest_cuisine {
            lines.push(format!("Consider a {cuisine} direction."));
        }
        if let Some(technique) = &guidance.suggest_technique {
            lines.push(format!("Consider using {technique}."));
        }
    }
    lines
}

pub(crate) fn preference_lines(prefs: &UserPreferences) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(servings) = prefs.servings {
        lines.push(format!("Servings: {servings}"));
    }
    if let Some(minutes) = prefs.time_budget_minutes {
        lines.push(format!("Total time budget: {minutes} minutes (prep plus cooking)"));
    }
    if !prefs.dietary.is_empty() {
        lines.push(format!("Dietary requirements (STRICT): {}", prefs.dietary.join(", ")));
    }
    if !prefs.equipment.is_empty() {
        lines.push(format!("Available equipment: {}", prefs.equipment.join(", ")));
    }
    if let Some(budget) = prefs.budget {
        lines.push(format!("Budget: {}", budget.describe()));
    }
    if let Some(skill) = prefs.skill_level {
        lines.push(format!("Cook's skill level: {}", skill.as_str()));
    }
    lines
}

fn section(out: &mut String, heading: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    out.push_str("\n\n");
    out.push_str(heading);
    for line in lines {
        out.push_str("\n- ");
        out.push_str(line);
    }
}

pub fn render_recipe_user_prompt(
    request: &str,
    extracted: &ExtractedElements,
    tier: SpecificityTier,
    preferences: &UserPreferences,
    guidance: &VarietyGuidance,
) -> String {
    let request = request.trim();
    let mut prompt = if request.is_empty() {
        "Request: (none given, choose something good)".to_string()
    } else {
        format!("Request: {request}")
    };
    section(&mut prompt, "What we understood:", &element_lines(extracted));
    section(&mut prompt, "Variety:", &variety_lines(guidance, tier));
    section(&mut prompt, "Preferences:", &preference_lines(preferences));
    prompt.push_str("\n\n");
    prompt.push_str(success_criteria(tier));
    prompt.push_str("\n\n");
    prompt.push_str(&recipe_schema_block());
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Budget, SkillLevel};

    fn full_elements() -> ExtractedElements {
        ExtractedElements {
            named_dish: Some("bouillabaisse".into()),
            chef_reference: Some("Rick Stein".into()),
            cuisine: vec!["french".into()],
            technique: vec!["poaching".into()],
            main_ingredients: vec!["cod".into(), "mussels".into()],
            flavor_profile: vec!["fresh".into()],
            occasion: vec!["dinner party".into()],
            mood: vec!["impressive".into()],
        }
    }

    #[test]
    fn test_empty_elements_only_base_block() {
        let prompt = render_recipe_system_prompt(&ExtractedElements::default());
        assert_eq!(prompt, BASE_BLOCK);
        for heading in FRAGMENT_HEADINGS {
            assert!(!prompt.contains(heading));
        }
    }

    #[test]
    fn test_fragments_in_fixed_order() {
        let prompt = render_recipe_system_prompt(&full_elements());
        let positions: Vec<usize> = FRAGMENT_HEADINGS
            .iter()
            .map(|h| prompt.find(h).expect(h))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_strict_dietary_and_preferences() {
        let prefs = UserPreferences {
            servings: Some(2),
            time_budget_minutes: Some(30),
            dietary: vec!["vegetarian".into(), "nut-free".into()],
            equipment: vec!["air fryer".into()],
            budget: Some(Budget::Low),
            skill_level: Some(SkillLevel::Beginner),
        };
        let prompt = render_recipe_user_prompt(
            "something quick",
            &ExtractedElements::default(),
            SpecificityTier::SomewhatVague,
            &prefs,
            &VarietyGuidance::default(),
        );
        assert!(prompt.contains("Dietary requirements (STRICT): vegetarian, nut-free"));
        assert!(prompt.contains("Servings: 2"));
        assert!(prompt.contains("30 minutes"));
        assert!(prompt.contains("air fryer"));
        assert!(prompt.contains("Cook's skill level: beginner"));
        assert!(prompt.contains("max 60 characters"));
    }

    #[test]
    fn test_precise_requests_get_no_suggestions() {
        let guidance = VarietyGuidance {
            avoid_words: vec!["chicken".into()],
            suggest_cuisine: Some("korean".into()),
            ..Default::default()
        };
        let precise = render_recipe_user_prompt(
            "beef wellington",
            &ExtractedElements::default(),
            SpecificityTier::CrystalClear,
            &UserPreferences::default(),
            &guidance,
        );
        assert!(precise.contains("chicken"));
        assert!(!precise.contains("korean"));

        let vague = render_recipe_user_prompt(
            "surprise me",
            &ExtractedElements::default(),
            SpecificityTier::VeryVague,
            &UserPreferences::default(),
            &guidance,
        );
        assert!(vague.contains("Consider a korean direction."));
    }
}
