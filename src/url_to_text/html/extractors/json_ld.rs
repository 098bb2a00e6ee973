use super::{Extractor, ParsingContext, StructuredRecipeCandidate, TextOrList};
use crate::normalize::{ListShape, ScalarShape};
use crate::url_to_text::text::json_repair::strip_trailing_commas;
use html_escape::decode_html_entities;
use log::debug;
use scraper::Selector;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static LD_JSON_SCRIPT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("ld+json selector")
});

/// Reads schema.org Recipe objects from `application/ld+json` blocks.
///
/// The first Recipe in document order wins; malformed blocks are skipped.
pub struct JsonLdExtractor;

impl Extractor for JsonLdExtractor {
    fn parse(&self, context: &ParsingContext) -> Option<StructuredRecipeCandidate> {
        debug!("JsonLdExtractor: Starting parse for URL: {}", context.url);

        let scripts: Vec<_> = context.document.select(&LD_JSON_SCRIPT).collect();
        debug!(
            "JsonLdExtractor: Found {} JSON-LD script tags",
            scripts.len()
        );

        let candidate = scripts.iter().enumerate().find_map(|(index, script)| {
            let json_ld = parse_block(&script.inner_html()).or_else(|| {
                debug!("JsonLdExtractor: Skipping unparseable JSON-LD {}", index);
                None
            })?;

            let recipe = find_recipe(&json_ld)?;
            debug!("JsonLdExtractor: Found Recipe in JSON-LD {}", index);
            recipe.as_object().map(to_candidate)
        });

        if candidate.is_none() {
            debug!("JsonLdExtractor: No Recipe object in any JSON-LD script");
        }
        candidate
    }
}

/// Parse one script body, retrying once with comment markers and trailing commas removed.
fn parse_block(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    serde_json::from_str(raw).ok().or_else(|| {
        let cleaned = raw.replace("<!--", "").replace("-->", "");
        serde_json::from_str(&strip_trailing_commas(&cleaned)).ok()
    })
}

fn find_recipe(json_ld: &Value) -> Option<&Value> {
    let root = match json_ld {
        Value::Array(items) => items.first()?,
        other => other,
    };

    if is_recipe_type(root) {
        return Some(root);
    }

    root.get("@graph")?
        .as_array()?
        .iter()
        .find(|item| is_recipe_type(item))
}

fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("recipe"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case("recipe")),
        _ => false,
    }
}

fn to_candidate(recipe: &Map<String, Value>) -> StructuredRecipeCandidate {
    let mut metadata = recipe.clone();
    let name = metadata.remove("name");
    let description = metadata.remove("description");
    let image = metadata.remove("image");
    let ingredients = metadata.remove("recipeIngredient");
    let instructions = metadata.remove("recipeInstructions");

    StructuredRecipeCandidate {
        name: name
            .and_then(|v| ScalarShape::from_value(&v).first())
            .map(|n| decode_html_symbols(&n)),
        description: description
            .and_then(|v| ScalarShape::from_value(&v).first())
            .map(|d| decode_html_symbols(&d)),
        image,
        recipe_ingredient: ingredients.as_ref().and_then(text_or_list),
        recipe_instructions: instructions.as_ref().and_then(text_or_list),
        metadata,
    }
}

fn text_or_list(value: &Value) -> Option<TextOrList> {
    match ListShape::from_value(value) {
        ListShape::Text(text) => Some(TextOrList::Text(decode_html_symbols(&text))),
        ListShape::Other(_) => None,
        items => Some(TextOrList::List(
            items
                .into_lines()
                .iter()
                .map(|line| decode_html_symbols(line))
                .collect(),
        )),
    }
}

fn decode_html_symbols(text: &str) -> String {
    decode_html_entities(text).into_owned()
}
