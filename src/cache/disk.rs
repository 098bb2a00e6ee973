use super::{RecipeStore, StoreError};
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Suffix counter so concurrent writers never share a temp file.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// One JSON file per key, sharded by the first two characters of the key:
/// `<root>/ab/abcdef....json`.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.len() < 2 || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StoreError::Backend(format!("Invalid cache key: {key:?}")));
        }
        Ok(self.root.join(&key[..2]).join(format!("{key}.json")))
    }
}

#[async_trait]
impl RecipeStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        // Write then rename so readers never see a half-written file
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}.{seq}.tmp", std::process::id()));
        tokio::fs::write(&tmp, value).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!("Stored cache entry at {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_and_sharding() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());
        let key = "ab12cd";

        assert_eq!(store.get(key).await.unwrap(), None);

        store.put(key, r#"{"name":"Soup"}"#.to_string()).await.unwrap();
        assert_eq!(
            store.get(key).await.unwrap().as_deref(),
            Some(r#"{"name":"Soup"}"#)
        );
        assert!(dir.path().join("ab").join("ab12cd.json").exists());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("ab"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_for_one_key() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());
        let values: Vec<String> = (0..8)
            .map(|i| format!(r#"{{"name":"Soup {i}","body":"{}"}}"#, "x".repeat(4096)))
            .collect();

        for _ in 0..20 {
            let writers: Vec<_> = values
                .iter()
                .map(|value| {
                    let store = store.clone();
                    let value = value.clone();
                    tokio::spawn(async move { store.put("abcd", value).await })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }

            let stored = store.get("abcd").await.unwrap().unwrap();
            assert!(values.contains(&stored));
        }
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());

        assert!(store.put("../escape", String::new()).await.is_err());
        assert!(store.get("a").await.is_err());
    }
}
