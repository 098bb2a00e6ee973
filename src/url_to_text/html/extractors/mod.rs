use crate::model::LooseRecipe;
use scraper::Html;
use serde_json::{Map, Value};

mod json_ld;

pub use json_ld::JsonLdExtractor;

pub struct ParsingContext {
    pub url: String,
    pub document: Html,
}

impl ParsingContext {
    pub fn new(url: impl Into<String>, html: &str) -> Self {
        Self {
            url: url.into(),
            document: Html::parse_document(html),
        }
    }
}

/// Structured-data extraction strategy.
///
/// `None` means the page carries no usable structured recipe, which is a common
/// outcome rather than a failure.
pub trait Extractor {
    fn parse(&self, context: &ParsingContext) -> Option<StructuredRecipeCandidate>;
}

/// Ingredients or instructions as captured from structured data.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOrList {
    /// A single string, kept whole so the normalizer can apply its newline rule
    Text(String),
    List(Vec<String>),
}

impl From<TextOrList> for Value {
    fn from(field: TextOrList) -> Self {
        match field {
            TextOrList::Text(text) => Value::String(text),
            TextOrList::List(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        }
    }
}

/// Raw fields of a Recipe object found in a linked-data block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredRecipeCandidate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<Value>,
    pub recipe_ingredient: Option<TextOrList>,
    pub recipe_instructions: Option<TextOrList>,
    /// Every other property of the Recipe object, untouched
    pub metadata: Map<String, Value>,
}

impl From<StructuredRecipeCandidate> for LooseRecipe {
    fn from(candidate: StructuredRecipeCandidate) -> Self {
        let mut recipe = LooseRecipe(candidate.metadata);
        if let Some(name) = candidate.name {
            recipe.insert("name", Value::String(name));
        }
        if let Some(description) = candidate.description {
            recipe.insert("description", Value::String(description));
        }
        if let Some(image) = candidate.image {
            recipe.insert("image", image);
        }
        if let Some(ingredients) = candidate.recipe_ingredient {
            recipe.insert("recipeIngredient", ingredients.into());
        }
        if let Some(instructions) = candidate.recipe_instructions {
            recipe.insert("recipeInstructions", instructions.into());
        }
        recipe
    }
}
