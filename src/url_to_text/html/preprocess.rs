//! Narrows a raw page to the markup most likely to hold the recipe, within a
//! fixed character budget. Every step is a plain text transform and never fails.

use crate::config::PreprocessConfig;
use log::debug;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Elements removed together with their content.
const BLOCK_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "canvas", "embed", "object", "applet",
];

/// Page chrome removed together with its content.
const CHROME_TAGS: &[&str] = &["nav", "header", "footer", "aside", "menu"];

/// class/id tokens marking chrome, ads and social widgets.
const NOISE_TOKENS: &[&str] = &[
    "nav",
    "menu",
    "footer",
    "header",
    "sidebar",
    "breadcrumb",
    "pagination",
    "social",
    "share",
    "comment",
    "ad",
    "banner",
    "promo",
    "sponsor",
    "commercial",
];

/// Containers never removed on class/id alone; their classes describe the page, not the element.
const PAGE_TAGS: &[&str] = &["html", "head", "body", "main"];

/// Substrings of tag names or class/id values that mark recipe content.
const RECIPE_KEYWORDS: &[&str] = &[
    "ingredients",
    "instructions",
    "directions",
    "method",
    "preparation",
    "recipe",
    "cooking",
];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const ELLIPSIS: &str = "...";

static BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BLOCK_TAGS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("block regex")
        })
        .collect()
});

static STRAY_BLOCK_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)</?(?:{})\b[^>]*>", BLOCK_TAGS.join("|")))
        .expect("STRAY_BLOCK_TAGS regex")
});

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9-]*)\b([^>]*)>").expect("OPEN_TAG regex"));

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)\b([^>]*)>").expect("ANY_TAG regex")
});

static CLASS_OR_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)(?:class|id)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#)
        .expect("CLASS_OR_ID regex")
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE regex"));

static INTER_TAG_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("INTER_TAG_WHITESPACE regex"));

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("COMMENT regex"));

static EMPTY_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([a-zA-Z][a-zA-Z0-9-]*)\b[^>]*>\s*</([a-zA-Z][a-zA-Z0-9-]*)\s*>")
        .expect("EMPTY_ELEMENT regex")
});

/// Limits applied while narrowing a page.
#[derive(Debug, Clone, Copy)]
pub struct PreprocessOptions {
    pub max_chars: usize,
    pub min_section_chars: usize,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        PreprocessConfig::default().into()
    }
}

impl From<PreprocessConfig> for PreprocessOptions {
    fn from(config: PreprocessConfig) -> Self {
        Self {
            max_chars: config.max_chars,
            min_section_chars: config.min_section_chars,
        }
    }
}

/// Strip noise from `html`, narrow it to recipe sections when there are enough
/// of them, and truncate to the character budget.
pub fn preprocess_html(html: &str, options: &PreprocessOptions) -> String {
    let stripped = strip_blocks(html);
    let stripped = strip_noise(&stripped);
    let stripped = collapse_whitespace(&stripped);
    let stripped = strip_comments_and_empty_elements(&stripped);

    let sections = recipe_sections(&stripped);
    let narrowed = if sections.chars().count() > options.min_section_chars {
        debug!(
            "Narrowed page to recipe sections ({} of {} chars)",
            sections.len(),
            stripped.len()
        );
        sections
    } else {
        stripped
    };

    truncate(narrowed, options.max_chars)
}

/// Remove script, style and embedded-content blocks.
pub fn strip_blocks(html: &str) -> String {
    let without_blocks = BLOCKS
        .iter()
        .fold(html.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());
    STRAY_BLOCK_TAGS
        .replace_all(&without_blocks, "")
        .into_owned()
}

/// Remove page chrome and any element whose class or id carries a noise token.
pub fn strip_noise(html: &str) -> String {
    let spans = element_spans(html);
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;

    while let Some(caps) = OPEN_TAG.captures_at(html, cursor) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let name = name.as_str();
        let attrs = caps.get(2).map_or("", |m| m.as_str());

        if is_noise(name, attrs) {
            out.push_str(&html[cursor..whole.start()]);
            cursor = spans.get(&whole.start()).copied().unwrap_or(whole.end());
        } else {
            out.push_str(&html[cursor..whole.end()]);
            cursor = whole.end();
        }
    }

    out.push_str(&html[cursor..]);
    out
}

/// Collapse whitespace runs and drop whitespace between tags.
pub fn collapse_whitespace(html: &str) -> String {
    let collapsed = WHITESPACE.replace_all(html, " ");
    INTER_TAG_WHITESPACE
        .replace_all(&collapsed, "><")
        .trim()
        .to_string()
}

/// Remove comments, then elements left with no content (repeatedly, so
/// wrappers emptied by the first pass go too).
pub fn strip_comments_and_empty_elements(html: &str) -> String {
    let mut current = COMMENT.replace_all(html, "").into_owned();

    // Each pass peels one level of nesting
    for _ in 0..8 {
        let next = EMPTY_ELEMENT
            .replace_all(&current, |caps: &Captures| {
                if caps[1].eq_ignore_ascii_case(&caps[2]) {
                    String::new()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }

    current
}

/// Concatenate the outermost elements whose tag name or class/id mentions a recipe keyword.
pub fn recipe_sections(html: &str) -> String {
    let spans = element_spans(html);
    let mut sections = String::new();
    let mut cursor = 0;

    while let Some(caps) = OPEN_TAG.captures_at(html, cursor) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let name = name.as_str();
        let attrs = caps.get(2).map_or("", |m| m.as_str());

        if is_recipe_section(name, attrs) {
            let end = if is_self_closing(name, attrs) {
                whole.end()
            } else {
                spans.get(&whole.start()).copied().unwrap_or(html.len())
            };
            sections.push_str(&html[whole.start()..end]);
            cursor = end;
        } else {
            cursor = whole.end();
        }
    }

    sections
}

/// Cut to `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            let mut truncated = text[..byte_index].to_string();
            truncated.push_str(ELLIPSIS);
            truncated
        }
        None => text,
    }
}

fn is_noise(name: &str, attrs: &str) -> bool {
    let name = name.to_ascii_lowercase();
    if CHROME_TAGS.contains(&name.as_str()) {
        return true;
    }
    if PAGE_TAGS.contains(&name.as_str()) {
        return false;
    }
    class_and_id(attrs)
        .iter()
        .flat_map(|value| value.split(|c: char| c.is_whitespace() || c == '-' || c == '_'))
        .any(is_noise_token)
}

fn is_noise_token(token: &str) -> bool {
    let token = token.to_ascii_lowercase();
    NOISE_TOKENS
        .iter()
        .any(|noise| token == *noise || token.strip_suffix('s') == Some(noise))
}

fn is_recipe_section(name: &str, attrs: &str) -> bool {
    let name = name.to_ascii_lowercase();
    if RECIPE_KEYWORDS.iter().any(|k| name.contains(k)) {
        return true;
    }
    class_and_id(attrs).iter().any(|value| {
        let value = value.to_ascii_lowercase();
        RECIPE_KEYWORDS.iter().any(|k| value.contains(k))
    })
}

fn class_and_id(attrs: &str) -> Vec<&str> {
    CLASS_OR_ID
        .captures_iter(attrs)
        .filter_map(|caps| caps.get(1).or(caps.get(2)).or(caps.get(3)))
        .map(|m| m.as_str())
        .collect()
}

fn is_self_closing(name: &str, attrs: &str) -> bool {
    attrs.trim_end().ends_with('/') || VOID_TAGS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Maps the start offset of every closed element to the offset just past its
/// close tag. One pass over the tags; a close tag also closes any elements
/// opened after its match (`<li>` without `</li>`).
fn element_spans(html: &str) -> HashMap<usize, usize> {
    let mut spans = HashMap::new();
    let mut stack: Vec<(String, usize)> = Vec::new();
    let mut open: HashMap<String, usize> = HashMap::new();

    for caps in ANY_TAG.captures_iter(html) {
        let (Some(whole), Some(tag)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let name = tag.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());

        if !closing {
            let attrs = caps.get(3).map_or("", |m| m.as_str());
            if !is_self_closing(&name, attrs) {
                *open.entry(name.clone()).or_default() += 1;
                stack.push((name, whole.start()));
            }
            continue;
        }

        // Stray close tags leave the stack alone
        if open.get(&name).copied().unwrap_or(0) == 0 {
            continue;
        }
        while let Some((open_name, start)) = stack.pop() {
            if let Some(count) = open.get_mut(&open_name) {
                *count -= 1;
            }
            if open_name == name {
                spans.insert(start, whole.end());
                break;
            }
        }
    }

    spans
}
