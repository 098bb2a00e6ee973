//! Cache gate: short-circuits the pipeline with a previously clipped recipe.
//!
//! Records live in an injected [`RecipeStore`]. Store failures are logged and
//! never reach the caller.

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::model::{CachedRecipeRecord, CanonicalRecipe};
use async_trait::async_trait;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Key/value collaborator holding serialized records.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// SHA-256 hex of the normalized URL.
///
/// Scheme and host are lower-cased, the fragment is dropped, and a trailing
/// slash is trimmed from non-root paths. Unparseable input is hashed as given.
pub fn cache_key(url: &str) -> String {
    let normalized = normalize_url(url).unwrap_or_else(|| url.trim().to_string());
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

fn normalize_url(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url.trim()).ok()?;
    parsed.set_fragment(None);

    let path = parsed.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        parsed.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }

    Some(parsed.to_string())
}

/// Reads and writes clipped recipes through a [`RecipeStore`].
#[derive(Clone)]
pub struct CacheGate {
    store: Arc<dyn RecipeStore>,
}

impl CacheGate {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self { store }
    }

    /// A previously stored record for `url`, marked `from_cache`.
    pub async fn lookup(&self, url: &str) -> Option<CachedRecipeRecord> {
        let key = cache_key(url);
        let stored = match self.store.get(&key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!("Cache miss for {}", url);
                return None;
            }
            Err(e) => {
                warn!("Cache read failed for {}: {}", url, e);
                return None;
            }
        };

        match serde_json::from_str::<CachedRecipeRecord>(&stored) {
            Ok(mut record) => {
                info!("Cache hit for {}", url);
                record.from_cache = true;
                Some(record)
            }
            Err(e) => {
                warn!("Ignoring undecodable cache entry for {}: {}", url, e);
                None
            }
        }
    }

    /// Stamp `recipe` and store it. The fresh record is returned whether or
    /// not the write succeeded.
    pub async fn record(&self, url: &str, recipe: CanonicalRecipe) -> CachedRecipeRecord {
        let record = CachedRecipeRecord::fresh(recipe);
        if let Err(e) = self.write(url, &record).await {
            warn!("Cache write failed for {}: {}", url, e);
        }
        record
    }

    async fn write(&self, url: &str, record: &CachedRecipeRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        self.store.put(&cache_key(url), value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct BrokenStore;

    #[async_trait]
    impl RecipeStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn put(&self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    fn recipe() -> CanonicalRecipe {
        CanonicalRecipe {
            name: "Flatbread".to_string(),
            description: String::new(),
            ingredients: vec!["flour".to_string(), "water".to_string()],
            instructions: vec!["knead".to_string()],
            image: None,
            source_url: "https://example.com/flatbread".to_string(),
            author: None,
            date_published: None,
            prep_time: None,
            cook_time: None,
            total_time: None,
            recipe_yield: None,
            recipe_category: None,
            recipe_cuisine: None,
            keywords: None,
            nutrition: BTreeMap::new(),
            aggregate_rating: None,
            video: None,
        }
    }

    #[test]
    fn test_cache_key_normalizes_url() {
        let key = cache_key("https://Example.com/recipes/bread/");
        assert_eq!(key.len(), 64);
        assert_eq!(key, cache_key("https://example.com/recipes/bread"));
        assert_eq!(key, cache_key("HTTPS://EXAMPLE.COM/recipes/bread#comments"));
        assert_ne!(key, cache_key("https://example.com/recipes/Bread"));
        assert_ne!(key, cache_key("https://example.com/recipes/bread?print=1"));
    }

    #[test]
    fn test_cache_key_root_path() {
        assert_eq!(cache_key("https://example.com/"), cache_key("https://example.com"));
    }

    #[tokio::test]
    async fn test_record_then_lookup() {
        let gate = CacheGate::new(Arc::new(MemoryStore::new()));
        let url = "https://example.com/flatbread";

        assert!(gate.lookup(url).await.is_none());

        let fresh = gate.record(url, recipe()).await;
        assert!(!fresh.from_cache);

        let cached = gate.lookup(url).await.unwrap();
        assert!(cached.from_cache);
        assert_eq!(cached.recipe, fresh.recipe);
        assert_eq!(cached.scraped_at, fresh.scraped_at);
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let gate = CacheGate::new(Arc::new(BrokenStore));
        let url = "https://example.com/flatbread";

        assert!(gate.lookup(url).await.is_none());
        let record = gate.record(url, recipe()).await;
        assert_eq!(record.recipe.name, "Flatbread");
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        let url = "https://example.com/flatbread";
        store.put(&cache_key(url), "not json".to_string()).await.unwrap();

        let gate = CacheGate::new(store);
        assert!(gate.lookup(url).await.is_none());
    }
}
