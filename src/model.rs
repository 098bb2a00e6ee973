use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A fetched page, consumed once by the preprocessor and extractors.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub html: String,
}

/// A loosely-shaped recipe object: a JSON-LD candidate or a decoded model payload
/// before field names and shapes have been reconciled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LooseRecipe(pub Map<String, Value>);

impl LooseRecipe {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }
}

impl From<Map<String, Value>> for LooseRecipe {
    fn from(map: Map<String, Value>) -> Self {
        LooseRecipe(map)
    }
}

/// The normalized recipe every extraction strategy converges to.
///
/// Only constructed once `name`, `ingredients` and `instructions` are all non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecipe {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_yield: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_cuisine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nutrition: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_rating: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Value>,
}

/// A canonical recipe as stored by (and served from) the cache gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedRecipeRecord {
    #[serde(flatten)]
    pub recipe: CanonicalRecipe,
    pub scraped_at: DateTime<Utc>,
    #[serde(default)]
    pub from_cache: bool,
}

impl CachedRecipeRecord {
    /// Wrap a freshly extracted recipe.
    pub fn fresh(recipe: CanonicalRecipe) -> Self {
        Self {
            recipe,
            scraped_at: Utc::now(),
            from_cache: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_recipe() -> CanonicalRecipe {
        CanonicalRecipe {
            name: "Pancakes".to_string(),
            description: String::new(),
            ingredients: vec!["flour".to_string()],
            instructions: vec!["mix".to_string()],
            image: None,
            source_url: "https://example.com/pancakes".to_string(),
            author: None,
            date_published: None,
            prep_time: Some("PT10M".to_string()),
            cook_time: None,
            total_time: None,
            recipe_yield: None,
            recipe_category: None,
            recipe_cuisine: None,
            keywords: None,
            nutrition: BTreeMap::new(),
            aggregate_rating: None,
            video: None,
        }
    }

    #[test]
    fn test_canonical_recipe_serializes_camel_case() {
        let value = serde_json::to_value(sample_recipe()).unwrap();
        assert_eq!(value["sourceUrl"], "https://example.com/pancakes");
        assert_eq!(value["prepTime"], "PT10M");
        assert!(value.get("cookTime").is_none());
        assert!(value.get("nutrition").is_none());
    }

    #[test]
    fn test_cached_record_flattens_recipe() {
        let record = CachedRecipeRecord::fresh(sample_recipe());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], "Pancakes");
        assert_eq!(value["fromCache"], json!(false));
        assert!(value.get("scrapedAt").is_some());

        let back: CachedRecipeRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
