//! Shapes a loosely-typed recipe field can arrive in, and one coercion per shape.
//!
//! Sources disagree on whether a field is a string, a list, an object or a list
//! of objects. Each field is first decoded into one of these untagged unions and
//! then reduced to the canonical form.

use serde::Deserialize;
use serde_json::{Number, Value};

/// A list-valued field (ingredients, instructions).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListShape {
    Text(String),
    Items(Vec<ItemShape>),
    Other(Value),
}

/// One element of a list-valued field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemShape {
    Text(String),
    Number(Number),
    Nested(Vec<ItemShape>),
    Object(TextObject),
    Other(Value),
}

/// Object elements such as schema.org `HowToStep` / `HowToSection`.
#[derive(Debug, Deserialize)]
pub struct TextObject {
    text: Option<String>,
    name: Option<String>,
    description: Option<String>,
    #[serde(rename = "itemListElement")]
    item_list_element: Option<Vec<ItemShape>>,
}

/// A field expected to hold a single value (image, yield, author, keywords...).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ScalarShape {
    Text(String),
    Number(Number),
    List(Vec<ScalarShape>),
    Object(NamedObject),
    Other(Value),
}

/// Objects standing in for a scalar: `ImageObject`, `Person`, ...
#[derive(Debug, Deserialize)]
pub struct NamedObject {
    name: Option<String>,
    url: Option<String>,
    text: Option<String>,
}

impl ListShape {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(ListShape::Other(Value::Null))
    }

    /// Reduce to an ordered list of trimmed, non-empty strings.
    ///
    /// A single string is split on newlines; without newlines it stays one element.
    pub fn into_lines(self) -> Vec<String> {
        let lines = match self {
            ListShape::Text(text) => text.lines().map(str::to_string).collect(),
            ListShape::Items(items) => {
                let mut lines = Vec::new();
                for item in items {
                    item.collect_into(&mut lines);
                }
                lines
            }
            ListShape::Other(_) => Vec::new(),
        };

        lines
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl ItemShape {
    fn collect_into(self, lines: &mut Vec<String>) {
        match self {
            ItemShape::Text(text) => lines.push(text),
            ItemShape::Number(n) => lines.push(n.to_string()),
            ItemShape::Nested(items) => {
                for item in items {
                    item.collect_into(lines);
                }
            }
            ItemShape::Object(obj) => obj.collect_into(lines),
            ItemShape::Other(_) => lines.push(String::new()),
        }
    }
}

impl TextObject {
    fn collect_into(self, lines: &mut Vec<String>) {
        // Sections carry their steps in itemListElement; the section name is a heading
        if self.text.is_none() {
            if let Some(steps) = self.item_list_element {
                for step in steps {
                    step.collect_into(lines);
                }
                return;
            }
        }
        lines.push(self.into_text());
    }

    /// `text`, then `name`, then `description`, else empty.
    fn into_text(self) -> String {
        self.text
            .or(self.name)
            .or(self.description)
            .unwrap_or_default()
    }
}

impl ScalarShape {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(ScalarShape::Other(Value::Null))
    }

    /// The first usable value; arrays contribute their first element.
    pub fn first(self) -> Option<String> {
        let text = match self {
            ScalarShape::Text(text) => text,
            ScalarShape::Number(n) => n.to_string(),
            ScalarShape::List(items) => return items.into_iter().next().and_then(Self::first),
            ScalarShape::Object(obj) => obj.url.or(obj.name).or(obj.text)?,
            ScalarShape::Other(_) => return None,
        };
        non_empty(text)
    }

    /// All values joined with `", "`.
    pub fn joined(self) -> Option<String> {
        match self {
            ScalarShape::List(items) => {
                let parts: Vec<String> = items.into_iter().filter_map(Self::joined).collect();
                non_empty(parts.join(", "))
            }
            ScalarShape::Object(obj) => obj.name.or(obj.text).and_then(non_empty),
            other => other.first(),
        }
    }

    /// Person-like values collapse to their name.
    pub fn person_name(self) -> Option<String> {
        match self {
            ScalarShape::Text(text) => non_empty(text),
            ScalarShape::Object(obj) => obj.name.and_then(non_empty),
            ScalarShape::List(items) => {
                let names: Vec<String> = items.into_iter().filter_map(Self::person_name).collect();
                non_empty(names.join(", "))
            }
            ScalarShape::Number(_) | ScalarShape::Other(_) => None,
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
