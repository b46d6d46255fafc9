//! Keyword extraction of dish, chef, cuisine, technique and mood hints.
//!
//! Everything here is advisory. A missing element is always valid; the
//! prompt assembler only adds guidance for elements that were found.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Hints parsed or inferred from the request text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedElements {
    #[serde(default)]
    pub named_dish: Option<String>,
    #[serde(default)]
    pub chef_reference: Option<String>,
    #[serde(default)]
    pub cuisine: Vec<String>,
    #[serde(default)]
    pub technique: Vec<String>,
    #[serde(default)]
    pub main_ingredients: Vec<String>,
    #[serde(default)]
    pub flavor_profile: Vec<String>,
    #[serde(default)]
    pub occasion: Vec<String>,
    #[serde(default)]
    pub mood: Vec<String>,
}

impl ExtractedElements {
    pub fn is_empty(&self) -> bool {
        self.named_dish.is_none()
            && self.chef_reference.is_none()
            && self.cuisine.is_empty()
            && self.technique.is_empty()
            && self.main_ingredients.is_empty()
            && self.flavor_profile.is_empty()
            && self.occasion.is_empty()
            && self.mood.is_empty()
    }

    /// Fill gaps from `other`; values already present win.
    pub fn merge(&mut self, other: ExtractedElements) {
        if self.named_dish.is_none() {
            self.named_dish = other.named_dish;
        }
        if self.chef_reference.is_none() {
            self.chef_reference = other.chef_reference;
        }
        merge_list(&mut self.cuisine, other.cuisine);
        merge_list(&mut self.technique, other.technique);
        merge_list(&mut self.main_ingredients, other.main_ingredients);
        merge_list(&mut self.flavor_profile, other.flavor_profile);
        merge_list(&mut self.occasion, other.occasion);
        merge_list(&mut self.mood, other.mood);
    }
}

fn merge_list(target: &mut Vec<String>, extra: Vec<String>) {
    for value in extra {
        let value = value.trim().to_lowercase();
        if !value.is_empty() && !target.contains(&value) {
            target.push(value);
        }
    }
}

pub const CUISINES: &[&str] = &[
    "italian",
    "french",
    "spanish",
    "greek",
    "moroccan",
    "lebanese",
    "turkish",
    "indian",
    "thai",
    "vietnamese",
    "chinese",
    "japanese",
    "korean",
    "mexican",
    "peruvian",
    "caribbean",
    "ethiopian",
    "middle eastern",
    "mediterranean",
    "british",
    "american",
    "cajun",
    "nordic",
    "german",
];

/// Technique label and the stems that signal it.
pub const TECHNIQUES: &[(&str, &[&str])] = &[
    ("pan-searing", &["pan-sear", "pan sear", "seared"]),
    ("roasting", &["roast"]),
    ("braising", &["brais"]),
    ("grilling", &["grill", "chargrill"]),
    ("poaching", &["poach"]),
    ("steaming", &["steam"]),
    ("stir-frying", &["stir-fr", "stir fr"]),
    ("slow cooking", &["slow-cook", "slow cook"]),
    ("baking", &["bake", "baking"]),
    ("smoking", &["smoked", "smoking", "smoker"]),
    ("sous vide", &["sous vide", "sous-vide"]),
    ("deep-frying", &["deep-fr", "deep fr"]),
    ("air-frying", &["air-fr", "air fr"]),
    ("fermenting", &["ferment"]),
    ("barbecuing", &["barbecue", "bbq"]),
];

pub const KNOWN_CHEFS: &[&str] = &[
    "rick stein",
    "gordon ramsay",
    "jamie oliver",
    "nigella",
    "ottolenghi",
    "julia child",
    "delia smith",
    "mary berry",
    "nigel slater",
    "marcella hazan",
    "jacques pepin",
    "anthony bourdain",
    "madhur jaffrey",
    "samin nosrat",
];

pub const KNOWN_DISHES: &[&str] = &[
    "beef wellington",
    "beef bourguignon",
    "coq au vin",
    "bouillabaisse",
    "ratatouille",
    "cassoulet",
    "carbonara",
    "cacio e pepe",
    "bolognese",
    "lasagne",
    "lasagna",
    "risotto",
    "osso buco",
    "tiramisu",
    "paella",
    "moussaka",
    "shakshuka",
    "tagine",
    "pad thai",
    "tom yum",
    "green curry",
    "massaman curry",
    "pho",
    "ramen",
    "katsu curry",
    "bibimbap",
    "biryani",
    "tikka masala",
    "rogan josh",
    "dal makhani",
    "laksa",
    "jambalaya",
    "gumbo",
    "chili con carne",
    "enchiladas",
    "tacos al pastor",
    "fish and chips",
    "shepherd's pie",
    "cottage pie",
    "eggs benedict",
    "goulash",
    "falafel",
    "pavlova",
    "banana bread",
];

const INGREDIENTS: &[&str] = &[
    "chicken",
    "beef",
    "pork",
    "lamb",
    "duck",
    "turkey",
    "salmon",
    "sea bass",
    "cod",
    "tuna",
    "prawns",
    "shrimp",
    "mussels",
    "squid",
    "tofu",
    "paneer",
    "halloumi",
    "eggs",
    "chickpeas",
    "lentils",
    "beans",
    "mushrooms",
    "aubergine",
    "eggplant",
    "cauliflower",
    "spinach",
    "butternut squash",
    "sweet potato",
    "potatoes",
    "rice",
    "pasta",
    "noodles",
];

const FLAVORS: &[&str] = &[
    "spicy", "fiery", "smoky", "tangy", "sweet", "sour", "savoury", "savory", "zesty", "lemony",
    "citrusy", "garlicky", "herby", "umami", "creamy", "rich", "fresh",
];

const OCCASIONS: &[&str] = &[
    "weeknight",
    "date night",
    "dinner party",
    "party",
    "brunch",
    "breakfast",
    "lunch",
    "lunchbox",
    "picnic",
    "meal prep",
    "christmas",
    "thanksgiving",
    "birthday",
    "holiday",
];

const MOODS: &[&str] = &[
    "cosy",
    "cozy",
    "comforting",
    "comfort food",
    "hearty",
    "light",
    "healthy",
    "indulgent",
    "fancy",
    "impressive",
    "nostalgic",
    "refreshing",
];

/// Two or more capitalised words followed by a possessive, e.g. "Rick Stein's".
pub(crate) static POSSESSIVE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)+)['’]s\b").expect("valid possessive regex")
});

/// Whether `needle` occurs in `haystack` on word boundaries.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric();
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

fn found(lower: &str, vocabulary: &[&str]) -> Vec<String> {
    vocabulary
        .iter()
        .filter(|word| contains_phrase(lower, word))
        .map(|word| word.to_string())
        .collect()
}

/// Technique labels whose stems occur in `lower`.
pub fn techniques_in(lower: &str) -> Vec<String> {
    TECHNIQUES
        .iter()
        .filter(|(_, stems)| stems.iter().any(|stem| lower.contains(stem)))
        .map(|(label, _)| label.to_string())
        .collect()
}

/// Cuisine names that occur in `lower`.
pub fn cuisines_in(lower: &str) -> Vec<String> {
    found(lower, CUISINES)
}

/// Chef reference from a possessive name or a known chef.
pub fn chef_reference(original: &str, lower: &str) -> Option<String> {
    if let Some(caps) = POSSESSIVE_NAME.captures(original) {
        return Some(caps[1].to_string());
    }
    KNOWN_CHEFS
        .iter()
        .find(|chef| contains_phrase(lower, chef))
        .map(|chef| chef.to_string())
}

pub fn known_dish(lower: &str) -> Option<String> {
    KNOWN_DISHES
        .iter()
        .find(|dish| contains_phrase(lower, dish))
        .map(|dish| dish.to_string())
}

/// Extract every element detectable without a model call.
pub fn extract_elements(original: &str, lower: &str) -> ExtractedElements {
    ExtractedElements {
        named_dish: known_dish(lower),
        chef_reference: chef_reference(original, lower),
        cuisine: cuisines_in(lower),
        technique: techniques_in(lower),
        main_ingredients: found(lower, INGREDIENTS),
        flavor_profile: found(lower, FLAVORS),
        occasion: found(lower, OCCASIONS),
        mood: found(lower, MOODS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> ExtractedElements {
        extract_elements(text, &text.to_lowercase())
    }

    #[test]
    fn test_possessive_chef_and_technique() {
        let e = extract("Rick Stein's pan-seared sea bass with lemon butter");
        assert_eq!(e.chef_reference.as_deref(), Some("Rick Stein"));
        assert_eq!(e.technique, vec!["pan-searing"]);
        assert_eq!(e.main_ingredients, vec!["sea bass"]);
    }

    #[test]
    fn test_phrases_respect_word_boundaries() {
        assert!(contains_phrase("a cosy pho night", "pho"));
        assert!(!contains_phrase("phone a friend", "pho"));
        assert!(!contains_phrase("delightful", "light"));
    }

    #[test]
    fn test_plain_text_is_empty() {
        assert!(extract("what should i do").is_empty());
    }

    #[test]
    fn test_merge_keeps_existing_values() {
        let mut e = extract("spicy thai noodles");
        e.merge(ExtractedElements {
            named_dish: Some("drunken noodles".into()),
            cuisine: vec!["Thai".into(), "Chinese".into()],
            ..Default::default()
        });
        assert_eq!(e.named_dish.as_deref(), Some("drunken noodles"));
        assert_eq!(e.cuisine, vec!["thai", "chinese"]);
        assert_eq!(e.flavor_profile, vec!["spicy"]);
    }
}
