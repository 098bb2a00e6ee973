use crate::error::ClipError;
use crate::model::LooseRecipe;
use crate::providers::{build_extraction_prompt, LlmProvider};
use crate::url_to_text::text::json_repair::repair_json;
use log::{debug, error, info};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};

/// Characters of context kept on each side of a parse failure.
const EXCERPT_RADIUS: usize = 50;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("FENCED_BLOCK regex"));

/// What the model said about a page.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    Recipe(Map<String, Value>),
    /// The model answered `null`: it looked and found no recipe.
    NoRecipe,
}

/// Asks a generative model for the recipe in a page and decodes whatever it
/// sends back.
#[derive(Clone)]
pub struct AiExtractor {
    provider: Arc<dyn LlmProvider>,
}

impl AiExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Extract a loosely-shaped recipe from narrowed page markup.
    ///
    /// `Ok(None)` is the model's explicit "no recipe"; a reply that cannot be
    /// decoded at all is [`ClipError::AiResponse`].
    pub async fn extract(&self, html: &str, url: &str) -> Result<Option<LooseRecipe>, ClipError> {
        let prompt = build_extraction_prompt(html, url);
        debug!(
            "Invoking {} with a {} char prompt",
            self.provider.provider_name(),
            prompt.len()
        );

        let response = self.provider.invoke(&prompt).await?;
        let text = response_text(&response);

        match parse_model_output(&text)? {
            ModelOutput::Recipe(map) => Ok(Some(LooseRecipe(map))),
            ModelOutput::NoRecipe => {
                info!("Model reported no recipe for {}", url);
                Ok(None)
            }
        }
    }
}

/// Pull the reply text out of a provider response.
///
/// Prefers the last message's content, then the first message's, then a
/// top-level `response` string, and finally the serialized response itself.
pub fn response_text(response: &Value) -> String {
    if let Value::String(text) = response {
        return text.clone();
    }

    let messages = response
        .get("output")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    messages
        .last()
        .and_then(message_text)
        .or_else(|| messages.first().and_then(message_text))
        .or_else(|| {
            response
                .get("response")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| response.to_string())
}

fn message_text(message: &Value) -> Option<String> {
    let text = match message.get("content")? {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                other => other.get("text").and_then(Value::as_str),
            })
            .collect::<Vec<_>>()
            .join(""),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

/// Decode model output, tolerating prose, code fences and near-valid JSON.
///
/// Strategies, first success wins: the whole text, a fenced block, the
/// outermost `{...}` span, then each of those again after [`repair_json`].
pub fn parse_model_output(text: &str) -> Result<ModelOutput, ClipError> {
    let trimmed = text.trim();

    let direct_error = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => {
            if let Some(output) = classify(value) {
                debug!("Model output parsed directly");
                return Ok(output);
            }
            None
        }
        Err(e) => Some(e),
    };

    let fenced = FENCED_BLOCK
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim());
    let braced = brace_span(trimmed);

    let attempts = [("fenced block", fenced), ("brace span", braced)];
    for (strategy, candidate) in attempts {
        if let Some(output) = candidate.and_then(parse_candidate) {
            debug!("Model output parsed from {}", strategy);
            return Ok(output);
        }
    }

    for candidate in [fenced, braced, Some(trimmed)].into_iter().flatten() {
        if let Some(output) = parse_candidate(&repair_json(candidate)) {
            info!("Model output recovered by JSON repair");
            return Ok(output);
        }
    }

    let (message, excerpt) = match direct_error {
        Some(e) => (e.to_string(), excerpt_around(trimmed, e.line(), e.column())),
        None => (
            "Response is valid JSON but not a recipe object".to_string(),
            excerpt_around(trimmed, 0, 0),
        ),
    };
    error!("Unparseable model output ({}): {}", message, excerpt);
    Err(ClipError::AiResponse { message, excerpt })
}

fn parse_candidate(candidate: &str) -> Option<ModelOutput> {
    serde_json::from_str::<Value>(candidate).ok().and_then(classify)
}

/// `null` means no recipe; an object is a recipe; an array stands for its
/// first element. Anything else is not usable.
fn classify(value: Value) -> Option<ModelOutput> {
    match value {
        Value::Null => Some(ModelOutput::NoRecipe),
        Value::Object(map) => Some(ModelOutput::Recipe(map)),
        Value::Array(items) => match items.into_iter().next() {
            None | Some(Value::Null) => Some(ModelOutput::NoRecipe),
            Some(Value::Object(map)) => Some(ModelOutput::Recipe(map)),
            Some(_) => None,
        },
        _ => None,
    }
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Up to [`EXCERPT_RADIUS`] characters either side of a 1-based line/column.
/// Line 0 means no position is known; the head of the text is returned.
fn excerpt_around(text: &str, line: usize, column: usize) -> String {
    if line == 0 {
        return text.chars().take(EXCERPT_RADIUS * 2).collect();
    }

    let line_start: usize = text
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    let mut position = (line_start + column.saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(position) {
        position -= 1;
    }

    let before: Vec<char> = text[..position].chars().rev().take(EXCERPT_RADIUS).collect();
    let after = text[position..].chars().take(EXCERPT_RADIUS);
    before.into_iter().rev().chain(after).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::FakeProvider;
    use serde_json::json;

    fn recipe(output: ModelOutput) -> Map<String, Value> {
        match output {
            ModelOutput::Recipe(map) => map,
            ModelOutput::NoRecipe => panic!("expected a recipe"),
        }
    }

    #[test]
    fn test_response_text_prefers_last_message() {
        let response = json!({
            "output": [
                {"type": "reasoning", "content": [{"type": "text", "text": "thinking"}]},
                {"role": "assistant", "content": [{"type": "output_text", "text": "{\"name\": \"Pie\"}"}]}
            ]
        });
        assert_eq!(response_text(&response), r#"{"name": "Pie"}"#);
    }

    #[test]
    fn test_response_text_falls_back_to_first_message() {
        let response = json!({
            "output": [
                {"role": "assistant", "content": "first answer"},
                {"type": "reasoning", "summary": []}
            ]
        });
        assert_eq!(response_text(&response), "first answer");
    }

    #[test]
    fn test_response_text_joins_content_parts() {
        let response = json!({
            "output": [{"content": [{"text": "{\"a\":"}, {"text": " 1}"}]}]
        });
        assert_eq!(response_text(&response), r#"{"a": 1}"#);
    }

    #[test]
    fn test_response_text_top_level_response_field() {
        let response = json!({"response": "null", "done": true});
        assert_eq!(response_text(&response), "null");
    }

    #[test]
    fn test_response_text_stringifies_unknown_shapes() {
        let response = json!({"name": "Toast"});
        assert_eq!(response_text(&response), r#"{"name":"Toast"}"#);
    }

    #[test]
    fn test_parse_direct_json() {
        let map = recipe(parse_model_output(r#"  {"name": "Toast", "steps": ["toast"]}  "#).unwrap());
        assert_eq!(map["name"], "Toast");
    }

    #[test]
    fn test_parse_null_is_no_recipe() {
        assert_eq!(parse_model_output("null").unwrap(), ModelOutput::NoRecipe);
        assert_eq!(
            parse_model_output("```json\nnull\n```").unwrap(),
            ModelOutput::NoRecipe
        );
    }

    #[test]
    fn test_parse_fenced_block() {
        let text = "Here is the recipe:\n```json\n{\"name\": \"Salad\", \"ingredients\": [\"lettuce\"]}\n```\nEnjoy!";
        assert_eq!(recipe(parse_model_output(text).unwrap())["name"], "Salad");
    }

    #[test]
    fn test_parse_fenced_block_with_trailing_comma() {
        let text = "```json\n{\"name\": \"Soup\", \"ingredients\": [\"water\"],}\n```";
        let map = recipe(parse_model_output(text).unwrap());
        assert_eq!(map["name"], "Soup");
        assert_eq!(map["ingredients"], json!(["water"]));
    }

    #[test]
    fn test_parse_brace_span_in_prose() {
        let text = r#"Sure! {"title": "X", "ingredient_list": ["a"], "steps": ["b"]} Let me know."#;
        assert_eq!(recipe(parse_model_output(text).unwrap())["title"], "X");
    }

    #[test]
    fn test_parse_smart_quotes_and_unterminated_string() {
        let text = "{\n  \u{201C}name\u{201D}: \u{201C}Chili,\n  \"instructions\": [\"simmer\"]\n}";
        let map = recipe(parse_model_output(text).unwrap());
        assert_eq!(map["name"], "Chili");
        assert_eq!(map["instructions"], json!(["simmer"]));
    }

    #[test]
    fn test_parse_array_takes_first_object() {
        let map = recipe(parse_model_output(r#"[{"name": "One"}, {"name": "Two"}]"#).unwrap());
        assert_eq!(map["name"], "One");
    }

    #[test]
    fn test_parse_failure_carries_excerpt() {
        let text = r#"{"name": "Pie", "ingredients": [oops]}"#;
        match parse_model_output(text) {
            Err(ClipError::AiResponse { message, excerpt }) => {
                assert!(message.contains("line 1"));
                assert!(excerpt.contains("[oops]"));
            }
            other => panic!("expected AiResponse error, got {other:?}"),
        }
    }

    #[test]
    fn test_excerpt_is_windowed() {
        let padding = "x".repeat(200);
        let text = format!("{padding}HERE{padding}");
        let excerpt = excerpt_around(&text, 1, 201);
        assert_eq!(excerpt.chars().count(), EXCERPT_RADIUS * 2);
        assert!(excerpt.contains("HERE"));
    }

    #[test]
    fn test_non_object_json_is_an_error() {
        assert!(matches!(
            parse_model_output("42"),
            Err(ClipError::AiResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_extract_with_provider() {
        let provider = Arc::new(FakeProvider::with_text(
            r#"{"title": "X", "ingredient_list": ["a"], "steps": ["b"]}"#,
        ));
        let extractor = AiExtractor::new(provider.clone());

        let loose = extractor
            .extract("<p>recipe</p>", "https://example.com/x")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loose.get("title"), Some(&json!("X")));
        assert_eq!(provider.calls(), 1);
        assert_eq!(extractor.provider_name(), "fake");
    }

    #[tokio::test]
    async fn test_extract_no_recipe() {
        let extractor = AiExtractor::new(Arc::new(FakeProvider::with_text("null")));
        let result = extractor.extract("<p>news</p>", "https://example.com/news").await;
        assert!(result.unwrap().is_none());
    }
}
