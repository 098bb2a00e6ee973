/// The prompt used for extracting a recipe from page markup.
///
/// Loaded from `prompt.txt` at compile time. `{{url}}` and `{{html}}` are
/// substituted by [`build_extraction_prompt`].
pub const EXTRACTION_PROMPT: &str = include_str!("prompt.txt");

/// Render the extraction prompt for one page.
pub fn build_extraction_prompt(html: &str, url: &str) -> String {
    // html goes last so markup that happens to contain "{{url}}" is left alone
    EXTRACTION_PROMPT
        .replace("{{url}}", url)
        .replace("{{html}}", html)
}
