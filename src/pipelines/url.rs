use crate::builder::ClipperBuilder;
use crate::cache::CacheGate;
use crate::error::ClipError;
use crate::model::{CachedRecipeRecord, CanonicalRecipe, LooseRecipe, RawPage};
use crate::normalize::normalize;
use crate::url_to_text::fetchers::RequestFetcher;
use crate::url_to_text::html::extractors::{Extractor, JsonLdExtractor, ParsingContext};
use crate::url_to_text::html::{preprocess_html, PreprocessOptions};
use crate::url_to_text::text::AiExtractor;
use log::{debug, info, warn};
use url::Url;

/// Turns a recipe page URL into a canonical recipe.
///
/// This pipeline:
/// 1. Returns a cached record when the cache gate has one
/// 2. Fetches the page
/// 3. Reads JSON-LD from the raw HTML and normalizes it
/// 4. Otherwise narrows the HTML and asks the model, then normalizes that
/// 5. Stores the result
///
/// Each request runs independently; concurrent requests for the same
/// uncached URL both run in full.
pub struct Clipper {
    fetcher: RequestFetcher,
    ai: Option<AiExtractor>,
    cache: Option<CacheGate>,
    preprocess: PreprocessOptions,
}

impl Clipper {
    pub fn new(
        fetcher: RequestFetcher,
        ai: Option<AiExtractor>,
        cache: Option<CacheGate>,
        preprocess: PreprocessOptions,
    ) -> Self {
        Self {
            fetcher,
            ai,
            cache,
            preprocess,
        }
    }

    pub fn builder() -> ClipperBuilder {
        ClipperBuilder::default()
    }

    /// Whether pages without structured data can still be clipped.
    pub fn has_ai(&self) -> bool {
        self.ai.is_some()
    }

    pub async fn clip(&self, url: &str) -> Result<CachedRecipeRecord, ClipError> {
        let url = validate_url(url)?;

        if let Some(hit) = self.lookup(&url).await {
            return Ok(hit);
        }

        let page = self.fetcher.fetch(&url).await.map_err(|e| {
            warn!("Fetch failed for {}: {}", url, e);
            e
        })?;
        let recipe = self.extract(&page).await?;

        Ok(match &self.cache {
            Some(cache) => cache.record(&url, recipe).await,
            None => CachedRecipeRecord::fresh(recipe),
        })
    }

    async fn lookup(&self, url: &str) -> Option<CachedRecipeRecord> {
        self.cache.as_ref()?.lookup(url).await
    }

    async fn extract(&self, page: &RawPage) -> Result<CanonicalRecipe, ClipError> {
        if let Some(recipe) = structured_recipe(page) {
            info!("Extracted {:?} from JSON-LD at {}", recipe.name, page.url);
            return Ok(recipe);
        }

        let Some(ai) = &self.ai else {
            info!("No structured recipe at {} and AI extraction is disabled", page.url);
            return Err(ClipError::NotFound);
        };

        let narrowed = preprocess_html(&page.html, &self.preprocess);
        info!(
            "Falling back to AI extraction via {} for {} ({} chars)",
            ai.provider_name(),
            page.url,
            narrowed.chars().count()
        );

        let loose = ai
            .extract(&narrowed, &page.url)
            .await?
            .ok_or(ClipError::NotFound)?;

        normalize(&loose, &page.url).ok_or_else(|| {
            info!("Model output for {} is missing required fields", page.url);
            ClipError::NotFound
        })
    }
}

/// The structured-data path. Kept synchronous: the parsed document must not
/// live across an await point.
fn structured_recipe(page: &RawPage) -> Option<CanonicalRecipe> {
    let context = ParsingContext::new(page.url.as_str(), &page.html);
    let candidate = JsonLdExtractor.parse(&context)?;
    let recipe = normalize(&LooseRecipe::from(candidate), &page.url);
    if recipe.is_none() {
        debug!("JSON-LD recipe at {} is incomplete", page.url);
    }
    recipe
}

/// Accept only absolute http(s) URLs.
pub fn validate_url(url: &str) -> Result<String, ClipError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ClipError::Validation("url is required".to_string()));
    }

    let parsed =
        Url::parse(url).map_err(|e| ClipError::Validation(format!("invalid url {url:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(ClipError::Validation(format!(
            "unsupported url scheme: {other}"
        ))),
    }
}
