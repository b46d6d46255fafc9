//! Ordered quick-match rules.
//!
//! Rules run top to bottom against the trimmed input and the first match
//! wins. Earlier rules are more specific than later ones, so reordering
//! this list changes classification results.

use regex::Regex;
use std::sync::LazyLock;

use super::extract::{chef_reference, known_dish, ExtractedElements};
use super::{Intent, SpecificityTier};

/// What a rule sees.
pub struct RuleInput<'a> {
    /// Trimmed input with original casing.
    pub original: &'a str,
    /// Trimmed, lower-cased input.
    pub lower: &'a str,
    pub has_recipe: bool,
    pub requires_recipe: bool,
    pub extracted: &'a ExtractedElements,
}

/// A rule's verdict. `intent: None` means the classifier variant's default.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub intent: Option<Intent>,
    pub confidence: f32,
    pub tier: SpecificityTier,
    pub requires_context: bool,
    /// Dish name recovered by the rule, if the extractor missed it.
    pub named_dish: Option<String>,
}

impl RuleMatch {
    fn new(intent: Intent, confidence: f32, tier: SpecificityTier) -> Self {
        Self {
            intent: Some(intent),
            confidence,
            tier,
            requires_context: false,
            named_dish: None,
        }
    }
}

pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&RuleInput<'_>) -> Option<RuleMatch>,
}

static INGREDIENT_SWAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(substitute|substitution|swap|replace|instead of|in place of|alternative to|without|don'?t have|do not have|run out of|ran out of)\b",
    )
    .expect("valid swap regex")
});

static MODIFICATION_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(make (it|this|them)|add|remove|take out|leave out|more|less|extra|double|halve|scale|spicier|milder|hotter|sweeter|saltier|healthier|lighter|richer|creamier|crispier|vegan|vegetarian|gluten[- ]free|dairy[- ]free)\b",
    )
    .expect("valid modification regex")
});

static QUICK_RECIPE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^quick recipe for\s*:\s*").expect("valid prefix regex"));

static TECHNIQUE_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(how (do|can|should|would) (i|you|we)|how to|how long|how much|what temp(erature)?|why (does|do|is|did)|can i freeze|what does|what's the best way to|tips? (for|on))\b",
    )
    .expect("valid technique regex")
});

static OPEN_CRAVING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(surprise me|anything|something|whatever|idk|i don'?t know|dinner ideas?|ideas? for dinner|what should i (cook|make|eat)|i'?m hungry|hungry)\b",
    )
    .expect("valid craving regex")
});

fn requires_recipe_context(input: &RuleInput<'_>) -> Option<RuleMatch> {
    (input.requires_recipe && !input.has_recipe).then(|| RuleMatch {
        intent: None,
        confidence: 0.0,
        tier: SpecificityTier::VeryVague,
        requires_context: true,
        named_dish: None,
    })
}

fn empty_input(input: &RuleInput<'_>) -> Option<RuleMatch> {
    input.lower.is_empty().then(|| RuleMatch {
        intent: None,
        confidence: 0.0,
        tier: SpecificityTier::VeryVague,
        requires_context: false,
        named_dish: None,
    })
}

fn ingredient_swap(input: &RuleInput<'_>) -> Option<RuleMatch> {
    (input.has_recipe && INGREDIENT_SWAP.is_match(input.lower)).then(|| {
        RuleMatch::new(
            Intent::IngredientSubstitution,
            0.95,
            SpecificityTier::CrystalClear,
        )
    })
}

fn modification_verb(input: &RuleInput<'_>) -> Option<RuleMatch> {
    (input.has_recipe && MODIFICATION_VERB.is_match(input.lower)).then(|| {
        RuleMatch::new(
            Intent::RecipeModification,
            0.9,
            SpecificityTier::CrystalClear,
        )
    })
}

fn quick_recipe_prefix(input: &RuleInput<'_>) -> Option<RuleMatch> {
    let prefix = QUICK_RECIPE_PREFIX.find(input.lower)?;
    let dish = input.lower[prefix.end()..].trim();
    let mut result = RuleMatch::new(Intent::NewRecipe, 0.95, SpecificityTier::CrystalClear);
    if !dish.is_empty() {
        result.named_dish = Some(dish.to_string());
    }
    Some(result)
}

fn possessive_chef(input: &RuleInput<'_>) -> Option<RuleMatch> {
    chef_reference(input.original, input.lower)
        .map(|_| RuleMatch::new(Intent::NewRecipe, 0.95, SpecificityTier::CrystalClear))
}

fn named_dish(input: &RuleInput<'_>) -> Option<RuleMatch> {
    known_dish(input.lower)
        .map(|_| RuleMatch::new(Intent::NewRecipe, 0.9, SpecificityTier::CrystalClear))
}

fn technique_question(input: &RuleInput<'_>) -> Option<RuleMatch> {
    TECHNIQUE_QUESTION.is_match(input.lower).then(|| {
        RuleMatch::new(
            Intent::CookingTechnique,
            0.85,
            SpecificityTier::ModeratelyClear,
        )
    })
}

fn open_craving(input: &RuleInput<'_>) -> Option<RuleMatch> {
    (OPEN_CRAVING.is_match(input.lower) && input.extracted.is_empty())
        .then(|| RuleMatch::new(Intent::NewRecipe, 0.8, SpecificityTier::VeryVague))
}

/// Quick-match rules in precedence order. The model fallback runs only when
/// none of these match.
pub static RULES: &[Rule] = &[
    Rule {
        name: "requires_recipe_context",
        apply: requires_recipe_context,
    },
    Rule {
        name: "empty_input",
        apply: empty_input,
    },
    Rule {
        name: "ingredient_swap",
        apply: ingredient_swap,
    },
    Rule {
        name: "modification_verb",
        apply: modification_verb,
    },
    Rule {
        name: "quick_recipe_prefix",
        apply: quick_recipe_prefix,
    },
    Rule {
        name: "possessive_chef",
        apply: possessive_chef,
    },
    Rule {
        name: "named_dish",
        apply: named_dish,
    },
    Rule {
        name: "technique_question",
        apply: technique_question,
    },
    Rule {
        name: "open_craving",
        apply: open_craving,
    },
];

/// First matching rule and its verdict.
pub fn first_match(input: &RuleInput<'_>) -> Option<(&'static str, RuleMatch)> {
    RULES
        .iter()
        .find_map(|rule| (rule.apply)(input).map(|m| (rule.name, m)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::extract::extract_elements;

    fn run(text: &str, has_recipe: bool, requires_recipe: bool) -> Option<(&'static str, RuleMatch)> {
        let original = text.trim();
        let lower = original.to_lowercase();
        let extracted = extract_elements(original, &lower);
        first_match(&RuleInput {
            original,
            lower: &lower,
            has_recipe,
            requires_recipe,
            extracted: &extracted,
        })
    }

    fn rule_name(text: &str, has_recipe: bool) -> Option<&'static str> {
        run(text, has_recipe, false).map(|(name, _)| name)
    }

    #[test]
    fn test_each_rule_fires() {
        assert_eq!(rule_name("   ", false), Some("empty_input"));
        assert_eq!(rule_name("swap the cream for yoghurt", true), Some("ingredient_swap"));
        assert_eq!(rule_name("make it spicier", true), Some("modification_verb"));
        assert_eq!(rule_name("Quick recipe for: fried rice", false), Some("quick_recipe_prefix"));
        assert_eq!(rule_name("Nigel Slater's chicken", false), Some("possessive_chef"));
        assert_eq!(rule_name("a proper carbonara", false), Some("named_dish"));
        assert_eq!(rule_name("how do I temper chocolate", false), Some("technique_question"));
        assert_eq!(rule_name("surprise me", false), Some("open_craving"));
        assert_eq!(rule_name("a warm salad with pears", false), None);
    }

    #[test]
    fn test_modification_rules_need_a_recipe() {
        assert_eq!(rule_name("make it spicier", false), None);
        assert_eq!(rule_name("swap the cream for yoghurt", false), None);
    }

    #[test]
    fn test_precedence_dish_beats_question() {
        // Both "how to" and a known dish match; the dish rule comes first.
        assert_eq!(rule_name("how to make carbonara", false), Some("named_dish"));
    }

    #[test]
    fn test_precedence_swap_beats_modification() {
        assert_eq!(
            rule_name("make it without the chilli", true),
            Some("ingredient_swap")
        );
    }

    #[test]
    fn test_requires_context_comes_first() {
        let (name, verdict) = run("", false, true).unwrap();
        assert_eq!(name, "requires_recipe_context");
        assert!(verdict.requires_context);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_quick_prefix_recovers_dish() {
        let (_, verdict) = run("quick recipe for: lemon drizzle cake", false, false).unwrap();
        assert_eq!(verdict.named_dish.as_deref(), Some("lemon drizzle cake"));
    }

    #[test]
    fn test_anchored_craving_falls_through() {
        assert_eq!(rule_name("something spicy with chicken", false), None);
    }
}
