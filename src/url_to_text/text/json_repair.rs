//! Best-effort, string-level repair of near-valid JSON.
//!
//! Each pass targets one malformation class seen in model output and can be
//! applied on its own. [`repair_json`] runs them in order.

use regex::Regex;
use std::sync::LazyLock;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("TRAILING_COMMA regex"));

/// Apply every repair pass: smart quotes, unterminated strings, trailing commas.
pub fn repair_json(text: &str) -> String {
    let text = normalize_quotes(text);
    let text = close_unterminated_strings(&text);
    strip_trailing_commas(&text)
}

/// Remove commas that directly precede a closing `}` or `]`.
pub fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Replace typographic quotes and apostrophes with their ASCII forms.
pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            other => other,
        })
        .collect()
}

/// Close strings left open at the end of a line.
///
/// A line with an odd number of unescaped `"` gets a closing quote inserted
/// before its trailing comma, or appended at the end of the line.
pub fn close_unterminated_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);

    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let (body, carriage) = match line.strip_suffix('\r') {
            Some(body) => (body, "\r"),
            None => (line, ""),
        };

        if unescaped_quotes(body) % 2 == 1 {
            let trimmed = body.trim_end();
            match trimmed.strip_suffix(',') {
                Some(before_comma) => {
                    out.push_str(before_comma);
                    out.push_str("\",");
                }
                None => {
                    out.push_str(trimmed);
                    out.push('"');
                }
            }
        } else {
            out.push_str(body);
        }
        out.push_str(carriage);
    }

    out
}

fn unescaped_quotes(line: &str) -> usize {
    let mut count = 0;
    let mut escaped = false;
    for c in line.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => count += 1,
            _ => escaped = false,
        }
    }
    count
}
