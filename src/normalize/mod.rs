//! Field normalizer: reconciles the vocabularies of JSON-LD and model output
//! into a [`CanonicalRecipe`].

mod duration;
mod shapes;

pub use duration::normalize_duration;
pub use shapes::{ListShape, ScalarShape};

use crate::model::{CanonicalRecipe, LooseRecipe};
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;

const NAME_ALIASES: &[&str] = &["name", "title", "recipe_name", "recipe_title"];
const INGREDIENT_ALIASES: &[&str] = &[
    "ingredients",
    "recipeIngredient",
    "ingredient_list",
    "ingredient",
];
const INSTRUCTION_ALIASES: &[&str] = &[
    "instructions",
    "recipeInstructions",
    "steps",
    "directions",
    "method",
    "preparation",
];
const DESCRIPTION_ALIASES: &[&str] = &["description", "summary"];
const IMAGE_ALIASES: &[&str] = &["image", "image_url", "thumbnailUrl"];
const YIELD_ALIASES: &[&str] = &["recipeYield", "yield", "servings"];
const PREP_TIME_ALIASES: &[&str] = &["prepTime", "prep_time"];
const COOK_TIME_ALIASES: &[&str] = &["cookTime", "cook_time"];
const TOTAL_TIME_ALIASES: &[&str] = &["totalTime", "total_time"];
const CATEGORY_ALIASES: &[&str] = &["recipeCategory", "category"];
const CUISINE_ALIASES: &[&str] = &["recipeCuisine", "cuisine"];
const DATE_ALIASES: &[&str] = &["datePublished", "date_published"];

/// Nutrient keys rewritten to their schema.org names; everything else passes through.
const NUTRIENT_ALIASES: &[(&str, &str)] = &[
    ("protein", "proteinContent"),
    ("fat", "fatContent"),
    ("carbs", "carbohydrateContent"),
];

/// Normalize a loosely-shaped recipe.
///
/// Returns `None` unless the result has a name, at least one ingredient and at
/// least one instruction.
pub fn normalize(raw: &LooseRecipe, source_url: &str) -> Option<CanonicalRecipe> {
    let name = lookup(raw, NAME_ALIASES)
        .and_then(|v| ScalarShape::from_value(v).first())
        .unwrap_or_default();
    let ingredients = lookup(raw, INGREDIENT_ALIASES)
        .map(|v| ListShape::from_value(v).into_lines())
        .unwrap_or_default();
    let instructions = lookup(raw, INSTRUCTION_ALIASES)
        .map(|v| ListShape::from_value(v).into_lines())
        .unwrap_or_default();

    if name.is_empty() || ingredients.is_empty() || instructions.is_empty() {
        debug!(
            "Incomplete recipe for {}: name={:?}, {} ingredients, {} instructions",
            source_url,
            name,
            ingredients.len(),
            instructions.len()
        );
        return None;
    }

    Some(CanonicalRecipe {
        name,
        description: lookup(raw, DESCRIPTION_ALIASES)
            .and_then(|v| ScalarShape::from_value(v).first())
            .unwrap_or_default(),
        ingredients,
        instructions,
        image: lookup(raw, IMAGE_ALIASES).and_then(|v| ScalarShape::from_value(v).first()),
        source_url: source_url.to_string(),
        author: raw
            .get("author")
            .and_then(|v| ScalarShape::from_value(v).person_name()),
        date_published: lookup(raw, DATE_ALIASES).and_then(|v| ScalarShape::from_value(v).first()),
        prep_time: duration_field(raw, PREP_TIME_ALIASES),
        cook_time: duration_field(raw, COOK_TIME_ALIASES),
        total_time: duration_field(raw, TOTAL_TIME_ALIASES),
        recipe_yield: lookup(raw, YIELD_ALIASES).and_then(|v| ScalarShape::from_value(v).first()),
        recipe_category: lookup(raw, CATEGORY_ALIASES)
            .and_then(|v| ScalarShape::from_value(v).joined()),
        recipe_cuisine: lookup(raw, CUISINE_ALIASES)
            .and_then(|v| ScalarShape::from_value(v).joined()),
        keywords: raw
            .get("keywords")
            .and_then(|v| ScalarShape::from_value(v).joined()),
        nutrition: raw.get("nutrition").map(nutrition).unwrap_or_default(),
        aggregate_rating: raw.get("aggregateRating").filter(|v| v.is_object()).cloned(),
        video: raw.get("video").filter(|v| !v.is_null()).cloned(),
    })
}

/// First alias present with a non-null value.
fn lookup<'a>(raw: &'a LooseRecipe, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|key| raw.get(key).filter(|v| !v.is_null()))
}

fn duration_field(raw: &LooseRecipe, aliases: &[&str]) -> Option<String> {
    lookup(raw, aliases)
        .and_then(|v| ScalarShape::from_value(v).first())
        .map(|d| normalize_duration(&d))
}

fn nutrition(value: &Value) -> BTreeMap<String, String> {
    let Some(map) = value.as_object() else {
        return BTreeMap::new();
    };

    map.iter()
        .filter(|(key, _)| !key.starts_with('@'))
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            if text.is_empty() {
                return None;
            }
            let key = NUTRIENT_ALIASES
                .iter()
                .find(|(alias, _)| *alias == key.as_str())
                .map(|(_, canonical)| canonical.to_string())
                .unwrap_or_else(|| key.clone());
            Some((key, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://example.com/recipe";

    fn loose(value: Value) -> LooseRecipe {
        match value {
            Value::Object(map) => LooseRecipe(map),
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn test_alias_resolution() {
        let raw = loose(json!({
            "title": "X",
            "ingredient_list": ["a"],
            "steps": ["b"]
        }));
        let recipe = normalize(&raw, URL).unwrap();
        assert_eq!(recipe.name, "X");
        assert_eq!(recipe.ingredients, vec!["a"]);
        assert_eq!(recipe.instructions, vec!["b"]);
        assert_eq!(recipe.source_url, URL);
        assert_eq!(recipe.description, "");
    }

    #[test]
    fn test_first_present_alias_wins() {
        let raw = loose(json!({
            "name": "Primary",
            "title": "Secondary",
            "ingredients": ["a"],
            "recipeIngredient": ["ignored"],
            "method": "only step"
        }));
        let recipe = normalize(&raw, URL).unwrap();
        assert_eq!(recipe.name, "Primary");
        assert_eq!(recipe.ingredients, vec!["a"]);
        assert_eq!(recipe.instructions, vec!["only step"]);
    }

    #[test]
    fn test_null_alias_falls_through() {
        let raw = loose(json!({
            "name": null,
            "recipe_title": "Fallback",
            "ingredient": "salt",
            "directions": "season"
        }));
        assert_eq!(normalize(&raw, URL).unwrap().name, "Fallback");
    }

    #[test]
    fn test_missing_instructions_is_none() {
        let raw = loose(json!({
            "name": "No Steps",
            "ingredients": ["flour", "water"]
        }));
        assert!(normalize(&raw, URL).is_none());
    }

    #[test]
    fn test_missing_name_or_ingredients_is_none() {
        let no_name = loose(json!({"ingredients": ["a"], "instructions": ["b"]}));
        assert!(normalize(&no_name, URL).is_none());

        let blank_name = loose(json!({"name": "  ", "ingredients": ["a"], "instructions": ["b"]}));
        assert!(normalize(&blank_name, URL).is_none());

        let empty_ingredients = loose(json!({"name": "A", "ingredients": [], "instructions": ["b"]}));
        assert!(normalize(&empty_ingredients, URL).is_none());
    }

    #[test]
    fn test_instruction_objects_keep_order() {
        let raw = loose(json!({
            "name": "Soup",
            "ingredients": ["water"],
            "instructions": [
                {"@type": "HowToStep", "text": "Boil water"},
                {"@type": "HowToStep", "text": "Add salt"},
                {"@type": "HowToStep", "text": "Serve hot"}
            ]
        }));
        let recipe = normalize(&raw, URL).unwrap();
        assert_eq!(recipe.instructions, vec!["Boil water", "Add salt", "Serve hot"]);
    }

    #[test]
    fn test_scalar_coercions() {
        let raw = loose(json!({
            "name": "Bread",
            "ingredients": "flour\nwater\nsalt",
            "instructions": "Knead.\nBake.",
            "image": ["https://example.com/a.jpg", "https://example.com/b.jpg"],
            "recipeYield": ["1 loaf", "8 slices"],
            "keywords": ["bread", "baking"],
            "recipeCategory": ["Bread", "Side"],
            "author": {"@type": "Person", "name": "Jane Baker"},
            "prepTime": "20 minutes",
            "cookTime": "PT45M",
            "total_time": "1 hour 5 minutes"
        }));
        let recipe = normalize(&raw, URL).unwrap();
        assert_eq!(recipe.ingredients, vec!["flour", "water", "salt"]);
        assert_eq!(recipe.instructions, vec!["Knead.", "Bake."]);
        assert_eq!(recipe.image.as_deref(), Some("https://example.com/a.jpg"));
        assert_eq!(recipe.recipe_yield.as_deref(), Some("1 loaf"));
        assert_eq!(recipe.keywords.as_deref(), Some("bread, baking"));
        assert_eq!(recipe.recipe_category.as_deref(), Some("Bread, Side"));
        assert_eq!(recipe.author.as_deref(), Some("Jane Baker"));
        assert_eq!(recipe.prep_time.as_deref(), Some("PT20M"));
        assert_eq!(recipe.cook_time.as_deref(), Some("PT45M"));
        assert_eq!(recipe.total_time.as_deref(), Some("PT1H5M"));
    }

    #[test]
    fn test_unparseable_time_passes_through() {
        let raw = loose(json!({
            "name": "Pickles",
            "ingredients": ["cucumbers"],
            "instructions": ["wait"],
            "totalTime": "overnight"
        }));
        assert_eq!(
            normalize(&raw, URL).unwrap().total_time.as_deref(),
            Some("overnight")
        );
    }

    #[test]
    fn test_nutrition_aliases() {
        let raw = loose(json!({
            "name": "Salad",
            "ingredients": ["greens"],
            "instructions": ["toss"],
            "nutrition": {
                "@type": "NutritionInformation",
                "calories": "120 kcal",
                "protein": "4 g",
                "fat": "7 g",
                "carbs": "9 g",
                "sodiumContent": "",
                "fiberContent": 3
            }
        }));
        let nutrition = normalize(&raw, URL).unwrap().nutrition;
        assert_eq!(nutrition.get("calories").map(String::as_str), Some("120 kcal"));
        assert_eq!(nutrition.get("proteinContent").map(String::as_str), Some("4 g"));
        assert_eq!(nutrition.get("fatContent").map(String::as_str), Some("7 g"));
        assert_eq!(
            nutrition.get("carbohydrateContent").map(String::as_str),
            Some("9 g")
        );
        assert_eq!(nutrition.get("fiberContent").map(String::as_str), Some("3"));
        assert!(!nutrition.contains_key("sodiumContent"));
        assert!(!nutrition.contains_key("@type"));
    }

    #[test]
    fn test_pass_through_objects() {
        let raw = loose(json!({
            "name": "Cake",
            "ingredients": ["sugar"],
            "instructions": ["bake"],
            "aggregateRating": {"ratingValue": "4.8", "ratingCount": "120"},
            "video": {"@type": "VideoObject", "contentUrl": "https://example.com/v.mp4"}
        }));
        let recipe = normalize(&raw, URL).unwrap();
        assert_eq!(recipe.aggregate_rating.unwrap()["ratingValue"], "4.8");
        assert_eq!(recipe.video.unwrap()["contentUrl"], "https://example.com/v.mp4");
    }
}
