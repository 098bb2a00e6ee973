use regex::Regex;
use std::sync::LazyLock;

// A number, optionally followed by fraction glyphs, directly before the unit.
// Ranges like "2-3 hours" resolve to the number nearest the unit because the
// leftmost candidate ("2") cannot reach the unit through the hyphen.
static HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)(?:\.\d+)?[\s½⅓⅔¼¾⅛]*(?:hours?|hrs?)\b").expect("HOURS regex")
});

static MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)(?:\.\d+)?[\s½⅓⅔¼¾⅛]*(?:minutes?|mins?)\b").expect("MINUTES regex")
});

/// Convert a free-text duration ("1 hour 30 minutes", "90 mins") into an
/// ISO-8601 `PT#H#M` duration.
///
/// Strings already starting with `PT` are returned as-is, as is anything
/// without a recognisable hour or minute amount.
pub fn normalize_duration(input: &str) -> String {
    if input.is_empty() || input.starts_with("PT") {
        return input.to_string();
    }

    let hours = capture_amount(&HOURS, input);
    let minutes = capture_amount(&MINUTES, input);

    if hours.is_none() && minutes.is_none() {
        return input.to_string();
    }

    let mut iso = String::from("PT");
    if let Some(h) = hours {
        iso.push_str(&format!("{h}H"));
    }
    if let Some(m) = minutes {
        iso.push_str(&format!("{m}M"));
    }
    iso
}

fn capture_amount(pattern: &Regex, input: &str) -> Option<u32> {
    pattern
        .captures(input)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
