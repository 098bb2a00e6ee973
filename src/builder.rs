use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::cache::{CacheGate, DiskStore, MemoryStore, RecipeStore};
use crate::config::{CacheBackend, CacheConfig, ClipperConfig};
use crate::providers::{LlmProvider, ProviderFactory};
use crate::url_to_text::fetchers::RequestFetcher;
use crate::url_to_text::html::PreprocessOptions;
use crate::url_to_text::text::AiExtractor;
use crate::{ClipError, Clipper};

/// Builder for assembling a [`Clipper`]
///
/// Anything not set explicitly comes from the [`ClipperConfig`] (or its
/// defaults when no config is given).
#[derive(Default)]
pub struct ClipperBuilder {
    config: Option<ClipperConfig>,
    provider: Option<Arc<dyn LlmProvider>>,
    no_ai: bool,
    store: Option<Arc<dyn RecipeStore>>,
    no_cache: bool,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    preprocess: Option<PreprocessOptions>,
}

impl ClipperBuilder {
    /// Use a loaded configuration as the base for every other setting
    ///
    /// # Example
    /// ```
    /// use recipe_clipper::{Clipper, ClipperConfig};
    ///
    /// let builder = Clipper::builder().config(ClipperConfig::default());
    /// ```
    pub fn config(mut self, config: ClipperConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use this provider for AI extraction instead of the configured one
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Only clip pages that carry structured data
    pub fn without_ai(mut self) -> Self {
        self.no_ai = true;
        self
    }

    /// Back the cache gate with this store instead of the configured backend
    pub fn store(mut self, store: Arc<dyn RecipeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Skip the cache gate entirely
    pub fn without_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// Set a timeout for page fetches
    ///
    /// # Example
    /// ```
    /// use recipe_clipper::Clipper;
    /// use std::time::Duration;
    ///
    /// let builder = Clipper::builder().timeout(Duration::from_secs(10));
    /// ```
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the User-Agent sent to recipe sites
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Override the HTML narrowing limits
    pub fn preprocess(mut self, options: PreprocessOptions) -> Self {
        self.preprocess = Some(options);
        self
    }

    pub fn build(self) -> Result<Clipper, ClipError> {
        let config = self.config.unwrap_or_default();

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(config.fetch.timeout));
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| config.fetch.user_agent.clone());
        let fetcher = RequestFetcher::new(timeout, &user_agent)?;

        let provider = match (self.no_ai, self.provider) {
            (true, _) => None,
            (false, Some(provider)) => Some(provider),
            (false, None) => ProviderFactory::from_config(&config)?,
        };
        if provider.is_none() {
            info!("AI extraction disabled; only structured data will be clipped");
        }

        let store = match (self.no_cache, self.store) {
            (true, _) => None,
            (false, Some(store)) => Some(store),
            (false, None) => store_from_config(&config.cache),
        };

        let preprocess = self
            .preprocess
            .unwrap_or_else(|| config.preprocess.into());

        Ok(Clipper::new(
            fetcher,
            provider.map(AiExtractor::new),
            store.map(CacheGate::new),
            preprocess,
        ))
    }
}

fn store_from_config(cache: &CacheConfig) -> Option<Arc<dyn RecipeStore>> {
    match cache.backend {
        CacheBackend::Memory => Some(Arc::new(MemoryStore::new())),
        CacheBackend::Disk => {
            info!("Caching clipped recipes under {}", cache.dir.display());
            Some(Arc::new(DiskStore::new(cache.dir.clone())))
        }
        CacheBackend::None => None,
    }
}
